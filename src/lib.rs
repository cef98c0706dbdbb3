//! Text summarisation service.
//!
//! Clients post raw text and an optional word budget; the request is
//! validated, truncated to a character budget, its word budget clamped and
//! converted to token-length bounds, and the result of the model call is
//! returned with timing metadata.
//!
//! The model sits behind [`inference::Summariser`]; [`inference::T5Summariser`]
//! is the candle-backed implementation loaded at startup.

pub mod api;
pub mod config;
pub mod error;
pub mod inference;
pub mod summary;

/// Installs the `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn setup_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
