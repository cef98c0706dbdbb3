//! Request normalisation and length control between the HTTP surface and
//! the model.

pub mod dispatch;
pub mod length;
pub mod normalize;
pub mod readiness;

pub use dispatch::{Dispatcher, SummaryRequest, SummaryResult};
pub use length::{LengthBounds, LengthPolicy};
pub use normalize::normalize;
pub use readiness::{Readiness, ReadinessState};
