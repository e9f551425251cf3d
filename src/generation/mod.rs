pub mod batch;
pub mod error;

use async_trait::async_trait;

use crate::imaging::ProcessedImage;
use crate::llm::media::ReferenceImage;
use crate::settings::GenerationSettings;

pub use batch::{generate_batch, BatchResult, GeneratedEmoji};
pub use error::GenerationError;

/// One generator round-trip for a single variation. Implementations must not mutate the
/// shared reference image or settings.
#[async_trait]
pub trait EmojiGenerator: Send + Sync {
    async fn generate_one(
        &self,
        reference: &ReferenceImage,
        action: &str,
        settings: &GenerationSettings,
    ) -> Result<ProcessedImage, GenerationError>;
}
