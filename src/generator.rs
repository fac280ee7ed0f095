//! Generation operations: the slow per-file work a batch drives.

pub mod chunked;
pub mod model;

pub use chunked::{ChunkedGenerator, DEFAULT_CHUNK_SIZE};
pub use model::{Harmonic, HarmonicModel, InputRow, PassthroughModel};

use crate::error::GenerateError;

/// An opaque, potentially slow, per-file generation operation.
///
/// Fire-and-await: the executor consumes nothing beyond completion or
/// failure. Implementations report incremental progress by publishing
/// `ProgressEvent`s on the shared topic while `invoke` runs. The payload
/// carries no item identity; attribution relies on the executor keeping
/// exactly one item subscribed at a time, so concurrent invocations of the
/// same topic would need the event schema extended with an item id first.
#[allow(async_fn_in_trait)]
pub trait Generator: Send + Sync {
    async fn invoke(&self, name: &str) -> Result<(), GenerateError>;
}
