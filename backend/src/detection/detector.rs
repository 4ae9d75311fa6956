use async_trait::async_trait;
use shared::{DetectionOutcome, MediaKind};

#[allow(dead_code)]
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("empty media payload")]
    EmptyMedia,
    #[error("analysis error: {0}")]
    Analysis(String),
}

/// Capability interface for media classification. The runner and the HTTP
/// layer only see this trait, so a model-backed detector can replace the
/// simulated one without touching either.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Classifies raw media bytes. `sensitivity` tunes the classification
    /// threshold of implementations that support it.
    async fn detect(
        &self,
        media: &[u8],
        kind: MediaKind,
        sensitivity: f32,
    ) -> Result<DetectionOutcome, DetectionError>;
}
