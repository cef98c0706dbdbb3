pub mod device;
pub mod t5;

use anyhow::Result;
use async_trait::async_trait;

pub use t5::T5Summariser;

/// The summarisation model, seen from the request path.
///
/// Bounds are in the model's own generation units. Implementations own any
/// locking or batching; callers may invoke this concurrently.
#[async_trait]
pub trait Summariser: Send + Sync {
    async fn summarise(&self, text: &str, max_length: usize, min_length: usize) -> Result<String>;

    /// Identifier reported back to clients.
    fn model_id(&self) -> &str;
}
