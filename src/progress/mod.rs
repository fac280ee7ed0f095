//! Progress observability primitives.

pub mod bus;
pub mod event;
pub mod tracker;

pub use bus::{ProgressBus, SubscriptionGuard, SubscriptionHandle};
pub use event::{ProgressEvent, GENERATE_TOPIC};
pub use tracker::ProgressTracker;
