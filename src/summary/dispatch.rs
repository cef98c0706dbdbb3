use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::SummariseError;
use crate::inference::Summariser;
use crate::summary::{
    length::LengthPolicy,
    normalize::normalize,
    readiness::{Readiness, ReadinessState},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub text: String,
    pub max_words: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResult {
    pub summary_text: String,
    pub model_identifier: String,
    pub elapsed_milliseconds: f64,
}

/// Runs one request end to end: readiness gate, normalisation, length
/// policy, model call, envelope.
pub struct Dispatcher {
    readiness: Readiness,
    model: OnceLock<Arc<dyn Summariser>>,
    max_input_chars: usize,
    policy: LengthPolicy,
}

impl Dispatcher {
    pub fn new(readiness: Readiness, max_input_chars: usize, policy: LengthPolicy) -> Self {
        Self {
            readiness,
            model: OnceLock::new(),
            max_input_chars,
            policy,
        }
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Installs the loaded model and flips readiness to `Loaded`.
    ///
    /// Returns false if a model is already installed or shutdown has begun.
    pub fn install(&self, model: Arc<dyn Summariser>) -> bool {
        let model_id = model.model_id().to_string();
        if self.model.set(model).is_err() {
            return false;
        }
        let loaded = self.readiness.mark_loaded();
        if loaded {
            info!(model = %model_id, "summarisation model ready");
        }
        loaded
    }

    pub async fn handle(&self, request: SummaryRequest) -> Result<SummaryResult, SummariseError> {
        let model = match (self.readiness.state(), self.model.get()) {
            (ReadinessState::Loaded, Some(model)) => model.clone(),
            _ => return Err(SummariseError::ServiceUnavailable),
        };

        let text = normalize(&request.text, self.max_input_chars)?;
        let bounds = self.policy.resolve(request.max_words);

        let span = info_span!("summarise", request_id = %Uuid::new_v4());
        async move {
            let start = Instant::now();
            let summary = model
                .summarise(&text, bounds.max_length, bounds.min_length)
                .await
                .map_err(|e| {
                    error!("model call failed: {e:#}");
                    SummariseError::ModelInvocation(e)
                })?;
            let elapsed_ms = round_tenth(start.elapsed().as_secs_f64() * 1000.0);

            info!(
                input_chars = text.chars().count(),
                max_length = bounds.max_length,
                min_length = bounds.min_length,
                took_ms = elapsed_ms,
                "summary generated"
            );

            Ok(SummaryResult {
                summary_text: summary,
                model_identifier: model.model_id().to_string(),
                elapsed_milliseconds: elapsed_ms,
            })
        }
        .instrument(span)
        .await
    }
}

fn round_tenth(ms: f64) -> f64 {
    (ms * 10.0).round() / 10.0
}
