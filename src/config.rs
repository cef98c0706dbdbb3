use anyhow::{anyhow, bail, Context, Result};
use std::{path::PathBuf, str::FromStr};
use tracing::warn;

use crate::summary::length::LengthPolicy;

/// Process settings, resolved from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub model: ModelSettings,
    pub max_input_chars: usize,
    pub length: LengthPolicy,
}

/// Where the summarisation model comes from and how it runs.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Hub repo id, also reported back to clients as the active model.
    pub name: String,
    pub revision: String,
    /// Local snapshot; when set the hub is never contacted.
    pub snapshot_dir: Option<PathBuf>,
    pub device: String,
    pub prefix: String,
    pub max_source_tokens: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = ModelSettings {
            name: get("MODEL_NAME").unwrap_or_else(|| "google-t5/t5-small".into()),
            revision: get("SUMMARISER_MODEL_REVISION").unwrap_or_else(|| "main".into()),
            snapshot_dir: get("SUMMARISER_MODEL_DIR").map(PathBuf::from),
            device: get("SUMMARISER_DEVICE").unwrap_or_else(|| "cpu".into()),
            // Not trimmed: the trailing space is part of the prefix.
            prefix: lookup("SUMMARISER_PREFIX").unwrap_or_else(|| "summarize: ".into()),
            max_source_tokens: parse_or(&get, "SUMMARISER_MAX_SOURCE_TOKENS", 512)?,
        };

        let max_input_chars: usize = parse_or(&get, "MAX_INPUT_CHARS", 10_000)?;
        if max_input_chars == 0 {
            bail!("MAX_INPUT_CHARS must be at least 1");
        }
        if model.max_source_tokens < 2 {
            bail!("SUMMARISER_MAX_SOURCE_TOKENS must be at least 2");
        }

        let min_words: u32 = parse_or(&get, "MIN_MAX_WORDS", 30)?;
        let max_words: u32 = parse_or(&get, "MAX_MAX_WORDS", 200)?;
        let default_words: u32 = parse_or(&get, "DEFAULT_MAX_WORDS", 80)?;
        if min_words == 0 || min_words > max_words {
            bail!("word range is invalid: MIN_MAX_WORDS={min_words}, MAX_MAX_WORDS={max_words}");
        }

        let clamped_default = default_words.clamp(min_words, max_words);
        if clamped_default != default_words {
            warn!(
                "DEFAULT_MAX_WORDS={} outside [{}, {}], using {}",
                default_words, min_words, max_words, clamped_default
            );
        }

        let length = LengthPolicy {
            min_words,
            max_words,
            default_words: clamped_default,
            tokens_per_word: parse_or(&get, "SUMMARISER_TOKENS_PER_WORD", 1.3)?,
            min_length_floor: parse_or(&get, "SUMMARISER_MIN_LENGTH_FLOOR", 10)?,
            min_length_divisor: parse_or(&get, "SUMMARISER_MIN_LENGTH_DIVISOR", 4)?,
        };
        length.validate()?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "PORT", 8000)?,
            model,
            max_input_chars,
            length,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
    }
}
