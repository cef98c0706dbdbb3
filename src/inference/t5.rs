use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use candle::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::ModelSettings;
use crate::inference::{device::select_device, Summariser};

// ---------------------------------------------------------
// Snapshot files
// ---------------------------------------------------------
struct Snapshot {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl Snapshot {
    fn local(dir: &Path) -> Result<Self> {
        let snapshot = Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        };
        for file in [&snapshot.config, &snapshot.tokenizer, &snapshot.weights] {
            if !file.exists() {
                bail!("{} not found in {}", file.display(), dir.display());
            }
        }
        Ok(snapshot)
    }

    fn from_hub(model_id: &str, revision: &str) -> Result<Self> {
        let api = Api::new().context("hf-hub client init failed")?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));
        let fetch = |name: &str| {
            repo.get(name)
                .with_context(|| format!("fetching {name} from {model_id}@{revision}"))
        };
        Ok(Self {
            config: fetch("config.json")?,
            tokenizer: fetch("tokenizer.json")?,
            weights: fetch("model.safetensors")?,
        })
    }
}

// ---------------------------------------------------------
// Model state (guarded by one mutex: the KV cache is per call)
// ---------------------------------------------------------
struct T5State {
    model: T5ForConditionalGeneration,
    config: T5Config,
}

/// Encoder-decoder summariser (T5 family) on candle, greedy decoding.
pub struct T5Summariser {
    state: Arc<Mutex<T5State>>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    eos_token_id: u32,
    model_id: String,
    prefix: String,
    max_source_tokens: usize,
}

impl T5Summariser {
    /// Blocking: reads or downloads weights. Call from `spawn_blocking`.
    pub fn load(settings: &ModelSettings) -> Result<Self> {
        let device = select_device(&settings.device)?;

        let snapshot = match &settings.snapshot_dir {
            Some(dir) => {
                info!("📁 T5 snapshot: {}", dir.display());
                Snapshot::local(dir)?
            }
            None => {
                info!(
                    "⬇️  fetching {}@{} from the hub",
                    settings.name, settings.revision
                );
                Snapshot::from_hub(&settings.name, &settings.revision)?
            }
        };

        let tokenizer = Tokenizer::from_file(&snapshot.tokenizer).map_err(|e| {
            anyhow!(
                "Tokenizer load failed ({}): {e}",
                snapshot.tokenizer.display()
            )
        })?;

        let config: T5Config = serde_json::from_slice(&fs::read(&snapshot.config)?)
            .with_context(|| format!("parsing {}", snapshot.config.display()))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[snapshot.weights.clone()], DType::F32, &device)?
        };
        let model = T5ForConditionalGeneration::load(vb, &config)
            .context("building T5 from safetensors")?;

        info!("🚀 {} loaded on {:?}", settings.name, device);

        Ok(Self {
            eos_token_id: config.eos_token_id as u32,
            state: Arc::new(Mutex::new(T5State { model, config })),
            tokenizer: Arc::new(tokenizer),
            device,
            model_id: settings.name.clone(),
            prefix: settings.prefix.clone(),
            max_source_tokens: settings.max_source_tokens,
        })
    }

    fn encode_source(&self, text: &str) -> Result<Vec<u32>> {
        let prompt = format!("{}{}", self.prefix, text);
        let enc = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| anyhow!("T5 encode error: {e}"))?;
        Ok(cap_source_tokens(
            enc.get_ids().to_vec(),
            self.max_source_tokens,
            self.eos_token_id,
        ))
    }
}

#[async_trait]
impl Summariser for T5Summariser {
    async fn summarise(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        let source = self.encode_source(text)?;

        let state = self.state.clone();
        let device = self.device.clone();
        let generated = tokio::task::spawn_blocking(move || {
            let mut state = state.blocking_lock();
            generate_greedy(&mut state, &device, &source, max_length, min_length)
        })
        .await
        .context("generation task panicked")??;

        let summary = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow!("T5 decode error: {e}"))?;

        Ok(tidy_decoded_text(&summary))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ---------------------------------------------------------
// Generation
// ---------------------------------------------------------

/// Greedy decode. `max_length` and `min_length` count the decoder start
/// token, so at most `max_length - 1` tokens are produced and EOS is masked
/// until the sequence reaches `min_length`.
fn generate_greedy(
    state: &mut T5State,
    device: &Device,
    source: &[u32],
    max_length: usize,
    min_length: usize,
) -> Result<Vec<u32>> {
    state.model.clear_kv_cache();

    let input = Tensor::new(source, device)?.unsqueeze(0)?;
    let encoder_output = state.model.encode(&input)?;

    let start = state
        .config
        .decoder_start_token_id
        .unwrap_or(state.config.pad_token_id) as u32;
    let eos = state.config.eos_token_id as u32;
    let use_cache = state.config.use_cache;

    let mut decoded = vec![start];
    while decoded.len() < max_length {
        let step: &[u32] = if decoded.len() == 1 || !use_cache {
            &decoded
        } else {
            &decoded[decoded.len() - 1..]
        };
        let step = Tensor::new(step, device)?.unsqueeze(0)?;

        let logits = state
            .model
            .decode(&step, &encoder_output)?
            .flatten_all()?
            .to_dtype(DType::F32)?;
        let mut logits = logits.to_vec1::<f32>()?;
        if decoded.len() < min_length {
            suppress_token(&mut logits, eos);
        }

        let next = argmax(&logits).ok_or_else(|| anyhow!("T5: empty logits"))?;
        if next == eos {
            break;
        }
        decoded.push(next);
    }

    state.model.clear_kv_cache();
    Ok(decoded.split_off(1))
}

// ---------------------------------------------------------
// Helpers
// ---------------------------------------------------------

fn cap_source_tokens(mut ids: Vec<u32>, max_tokens: usize, eos: u32) -> Vec<u32> {
    if ids.len() > max_tokens {
        ids.truncate(max_tokens - 1);
        ids.push(eos);
    }
    ids
}

fn suppress_token(logits: &mut [f32], token: u32) {
    if let Some(slot) = logits.get_mut(token as usize) {
        *slot = f32::NEG_INFINITY;
    }
}

fn argmax(values: &[f32]) -> Option<u32> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &val) in values.iter().enumerate() {
        match best {
            Some((_, top)) if val <= top => {}
            _ => best = Some((idx, val)),
        }
    }
    best.map(|(idx, _)| idx as u32)
}

fn tidy_decoded_text(text: &str) -> String {
    text.replace('\u{2581}', " ")
        .replace('\u{200b}', "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_capped_with_trailing_eos() {
        let ids: Vec<u32> = (10..20).collect();
        assert_eq!(cap_source_tokens(ids, 4, 1), vec![10, 11, 12, 1]);
    }

    #[test]
    fn short_source_is_untouched() {
        let ids = vec![5, 6, 1];
        assert_eq!(cap_source_tokens(ids.clone(), 512, 1), ids);
    }

    #[test]
    fn argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.1, 3.0, 3.0, -1.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn suppressed_eos_cannot_win() {
        let mut logits = vec![0.0, 9.0, 1.0];
        suppress_token(&mut logits, 1);
        assert_eq!(argmax(&logits), Some(2));
        // Out-of-range ids are ignored.
        suppress_token(&mut logits, 99);
    }

    #[test]
    fn tidy_strips_sentencepiece_markers() {
        assert_eq!(tidy_decoded_text(" \u{2581}Hello\u{200b} world "), "Hello world");
    }

    #[tokio::test]
    async fn summarise_with_local_snapshot() {
        let dir = PathBuf::from("models/t5-small");
        if !dir.join("model.safetensors").exists() {
            eprintln!("T5 snapshot missing under {}, skipping test", dir.display());
            return;
        }
        let settings = ModelSettings {
            name: "google-t5/t5-small".into(),
            revision: "main".into(),
            snapshot_dir: Some(dir),
            device: "cpu".into(),
            prefix: "summarize: ".into(),
            max_source_tokens: 512,
        };
        let model = tokio::task::spawn_blocking(move || T5Summariser::load(&settings))
            .await
            .unwrap()
            .expect("failed to load T5 snapshot");

        let text = "The tower is 324 metres tall, about the same height as an 81-storey \
                    building, and the tallest structure in Paris. Its base is square, \
                    measuring 125 metres on each side.";
        let out = model.summarise(text, 39, 10).await.expect("generation failed");
        assert!(!out.is_empty());
    }
}
