use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::summary::{SummaryRequest, SummaryResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariseRequest {
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_word_budget")]
    pub max_words: Option<i64>,
}

/// Accepts any integral JSON number for `max_words`, saturating to the
/// `i64` range so the length policy can clamp it. `50.0` reads as 50;
/// `50.5` is rejected.
fn deserialize_word_budget<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    word_budget_from_number(&n)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("max_words must be an integer, got {n}")))
}

fn word_budget_from_number(n: &Number) -> Option<i64> {
    if let Some(v) = n.as_i64() {
        return Some(v);
    }
    if n.as_u64().is_some() {
        return Some(i64::MAX);
    }
    // Integers past u64 arrive as f64; `as` saturates.
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummariseResponse {
    pub summary: String,
    pub model: String,
    pub took_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Error body shared by every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl From<SummariseRequest> for SummaryRequest {
    fn from(req: SummariseRequest) -> Self {
        Self {
            text: req.text,
            max_words: req.max_words,
        }
    }
}

impl From<SummaryResult> for SummariseResponse {
    fn from(res: SummaryResult) -> Self {
        Self {
            summary: res.summary_text,
            model: res.model_identifier,
            took_ms: res.elapsed_milliseconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_words(body: &str) -> serde_json::Result<Option<i64>> {
        serde_json::from_str::<SummariseRequest>(body).map(|req| req.max_words)
    }

    #[test]
    fn missing_or_null_budget_is_none() {
        assert_eq!(max_words(r#"{"text":"t"}"#).unwrap(), None);
        assert_eq!(max_words(r#"{"text":"t","max_words":null}"#).unwrap(), None);
    }

    #[test]
    fn out_of_range_integers_saturate() {
        assert_eq!(max_words(r#"{"text":"t","max_words":-7}"#).unwrap(), Some(-7));
        assert_eq!(
            max_words(r#"{"text":"t","max_words":18446744073709551615}"#).unwrap(),
            Some(i64::MAX)
        );
        assert_eq!(
            max_words(r#"{"text":"t","max_words":100000000000000000000}"#).unwrap(),
            Some(i64::MAX)
        );
        assert_eq!(
            max_words(r#"{"text":"t","max_words":-100000000000000000000}"#).unwrap(),
            Some(i64::MIN)
        );
    }

    #[test]
    fn integral_floats_are_accepted() {
        assert_eq!(max_words(r#"{"text":"t","max_words":50.0}"#).unwrap(), Some(50));
        assert_eq!(max_words(r#"{"text":"t","max_words":1e3}"#).unwrap(), Some(1000));
    }

    #[test]
    fn fractional_or_non_numeric_budget_is_rejected() {
        let err = max_words(r#"{"text":"t","max_words":50.5}"#).unwrap_err();
        assert!(err.to_string().contains("max_words must be an integer"));
        assert!(max_words(r#"{"text":"t","max_words":"50"}"#).is_err());
    }
}
