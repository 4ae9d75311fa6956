use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use shared::{AnalysisResult, MediaKind};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Analysis not found: {0}")]
    NotFound(Uuid),
    #[error("Analysis failed: {0}")]
    Failed(String),
}

/// A resolved job is either a result or the message of the fault that
/// killed it. In-flight jobs have no entry at all, so a pending id reads
/// the same as an unknown one.
#[derive(Debug, Clone)]
enum AnalysisEntry {
    Completed(AnalysisResult),
    Failed(String),
}

#[derive(Default)]
struct StoreInner {
    entries: HashMap<Uuid, AnalysisEntry>,
    // Insertion order, so list() iterates oldest-first deterministically.
    order: Vec<Uuid>,
}

/// Owns every resolved analysis for the lifetime of the process.
#[derive(Clone, Default)]
pub struct AnalysisStore {
    inner: Arc<RwLock<StoreInner>>,
}

pub struct StoreStats {
    pub total: usize,
    pub media_type_counts: HashMap<String, usize>,
    pub deepfake_count: usize,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn complete(&self, result: AnalysisResult) {
        let mut inner = self.inner.write().await;
        let id = result.id;
        if inner
            .entries
            .insert(id, AnalysisEntry::Completed(result))
            .is_none()
        {
            inner.order.push(id);
        }
        info!("Analysis {} completed", id);
    }

    pub async fn fail(&self, id: Uuid, message: String) {
        let mut inner = self.inner.write().await;
        warn!("Analysis {} failed: {}", id, message);
        if inner
            .entries
            .insert(id, AnalysisEntry::Failed(message))
            .is_none()
        {
            inner.order.push(id);
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<AnalysisResult, StoreError> {
        let inner = self.inner.read().await;
        match inner.entries.get(&id) {
            Some(AnalysisEntry::Completed(result)) => Ok(result.clone()),
            Some(AnalysisEntry::Failed(message)) => Err(StoreError::Failed(message.clone())),
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// Returns up to `limit` successful results in insertion order,
    /// optionally restricted to one media kind. Failed entries never
    /// appear here.
    pub async fn list(
        &self,
        media_type: Option<MediaKind>,
        limit: usize,
    ) -> Vec<AnalysisResult> {
        let inner = self.inner.read().await;
        let mut results = Vec::new();
        for id in &inner.order {
            let Some(AnalysisEntry::Completed(result)) = inner.entries.get(id) else {
                continue;
            };
            if media_type.is_some_and(|kind| result.media_type != kind) {
                continue;
            }
            results.push(result.clone());
            if results.len() >= limit {
                break;
            }
        }
        results
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.entries.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        inner.order.retain(|entry| *entry != id);
        info!("Analysis {} deleted", id);
        Ok(())
    }

    /// Aggregate counts. `total` includes failed entries; the per-kind and
    /// deepfake counts only cover successful results.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        let mut media_type_counts: HashMap<String, usize> = HashMap::new();
        let mut deepfake_count = 0;
        for entry in inner.entries.values() {
            if let AnalysisEntry::Completed(result) = entry {
                *media_type_counts
                    .entry(result.media_type.to_string())
                    .or_default() += 1;
                if result.is_deepfake {
                    deepfake_count += 1;
                }
            }
        }
        StoreStats {
            total: inner.entries.len(),
            media_type_counts,
            deepfake_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_result(kind: MediaKind, is_deepfake: bool) -> AnalysisResult {
        AnalysisResult {
            id: Uuid::new_v4(),
            media_type: kind,
            timestamp: Utc::now(),
            is_deepfake,
            confidence: 0.91,
            details: HashMap::new(),
            areas: Vec::new(),
            processing_time: 0.4,
        }
    }

    #[actix_web::test]
    async fn get_round_trips_completed_results() {
        let store = AnalysisStore::new();
        let result = sample_result(MediaKind::Image, false);
        let id = result.id;
        store.complete(result.clone()).await;

        let first = store.get(id).await.unwrap();
        let second = store.get(id).await.unwrap();
        assert_eq!(first, result);
        assert_eq!(second, result);
    }

    #[actix_web::test]
    async fn missing_id_reports_not_found() {
        let store = AnalysisStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.get(id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[actix_web::test]
    async fn failed_entry_surfaces_the_stored_message() {
        let store = AnalysisStore::new();
        let id = Uuid::new_v4();
        store.fail(id, "decoder blew up".to_string()).await;

        assert!(matches!(
            store.get(id).await,
            Err(StoreError::Failed(message)) if message == "decoder blew up"
        ));
    }

    #[actix_web::test]
    async fn delete_removes_the_entry_and_nothing_else() {
        let store = AnalysisStore::new();
        let keep = sample_result(MediaKind::Audio, false);
        let doomed = sample_result(MediaKind::Image, true);
        let (keep_id, doomed_id) = (keep.id, doomed.id);
        store.complete(keep).await;
        store.complete(doomed).await;

        store.delete(doomed_id).await.unwrap();
        assert!(matches!(
            store.get(doomed_id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.get(keep_id).await.is_ok());

        // Deleting again reports NotFound and leaves the store unchanged.
        assert!(matches!(
            store.delete(doomed_id).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.list(None, 10).await.len(), 1);
    }

    #[actix_web::test]
    async fn list_respects_limit_filter_and_skips_failures() {
        let store = AnalysisStore::new();
        let first = sample_result(MediaKind::Image, false);
        let second = sample_result(MediaKind::Video, true);
        let third = sample_result(MediaKind::Image, false);
        let ids = [first.id, second.id, third.id];
        store.complete(first).await;
        store.complete(second).await;
        store.complete(third).await;
        store.fail(Uuid::new_v4(), "boom".to_string()).await;

        let all = store.list(None, 10).await;
        assert_eq!(
            all.iter().map(|result| result.id).collect::<Vec<_>>(),
            ids,
            "insertion order, failures excluded"
        );

        let videos = store.list(Some(MediaKind::Video), 10).await;
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, ids[1]);

        assert_eq!(store.list(None, 2).await.len(), 2);
    }

    #[actix_web::test]
    async fn completing_the_same_id_twice_keeps_the_last_writer() {
        let store = AnalysisStore::new();
        let mut first = sample_result(MediaKind::Image, false);
        let id = first.id;
        store.complete(first.clone()).await;

        first.confidence = 0.5;
        store.complete(first).await;

        assert_eq!(store.get(id).await.unwrap().confidence, 0.5);
        assert_eq!(store.list(None, 10).await.len(), 1);
    }

    #[actix_web::test]
    async fn stats_count_failures_in_the_total_only() {
        let store = AnalysisStore::new();
        store.complete(sample_result(MediaKind::Image, true)).await;
        store.complete(sample_result(MediaKind::Image, false)).await;
        store.complete(sample_result(MediaKind::Audio, false)).await;
        store.fail(Uuid::new_v4(), "boom".to_string()).await;

        let stats = store.stats().await;
        assert_eq!(stats.total, 4);
        assert_eq!(stats.deepfake_count, 1);
        assert_eq!(stats.media_type_counts.get("image"), Some(&2));
        assert_eq!(stats.media_type_counts.get("audio"), Some(&1));
        assert_eq!(stats.media_type_counts.get("video"), None);
    }
}
