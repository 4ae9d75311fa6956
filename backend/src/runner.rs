use std::sync::Arc;

use actix_web::rt;
use log::{error, info};
use shared::{AnalysisResult, MediaKind};
use uuid::Uuid;

use crate::detection::detector::Detector;
use crate::store::analysis_store::AnalysisStore;

/// Dispatches detection work off the request path. Every submitted job
/// resolves with exactly one store write: a completed result or a failure
/// marker carrying the detector's error message.
#[derive(Clone)]
pub struct AnalysisRunner {
    detector: Arc<dyn Detector>,
    store: AnalysisStore,
}

impl AnalysisRunner {
    pub fn new(detector: Arc<dyn Detector>, store: AnalysisStore) -> Self {
        Self { detector, store }
    }

    /// Allocates a fresh job id and returns it immediately; the outcome
    /// becomes visible through the store once detection finishes.
    pub fn submit(&self, media: Vec<u8>, kind: MediaKind, sensitivity: f32) -> Uuid {
        let id = Uuid::new_v4();
        info!("Starting {} analysis {} ({} bytes)", kind, id, media.len());

        let detector = Arc::clone(&self.detector);
        let store = self.store.clone();
        rt::spawn(async move {
            match detector.detect(&media, kind, sensitivity).await {
                Ok(outcome) => {
                    store
                        .complete(AnalysisResult::from_outcome(id, kind, outcome))
                        .await;
                }
                Err(e) => {
                    error!("Analysis {} failed: {}", id, e);
                    store.fail(id, e.to_string()).await;
                }
            }
        });
        id
    }
}
