use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Webcam,
}

/// Detail metrics mix unit-interval scores with raw counts (e.g. the number
/// of analyzed video frames), so both shapes share one wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Score(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    FacialInconsistency,
    TextureArtifact,
    MetadataMismatch,
    LipSyncMismatch,
    TemporalInconsistency,
}

/// Bounding box flagged by a detector, in fractional frame coordinates.
/// Coordinates are sampled, not clamped: x + width may exceed 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub kind: AreaKind,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u32>,
}

/// What a detector reports for one piece of media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub is_deepfake: bool,
    pub confidence: f64,
    pub areas: Vec<SuspiciousArea>,
    pub details: HashMap<String, MetricValue>,
    pub processing_time: f64,
}

/// A finished analysis as stored and returned to clients. The timestamp is
/// assigned when the detector returns, not when the job was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub media_type: MediaKind,
    pub timestamp: DateTime<Utc>,
    pub is_deepfake: bool,
    pub confidence: f64,
    pub details: HashMap<String, MetricValue>,
    pub areas: Vec<SuspiciousArea>,
    pub processing_time: f64,
}

impl AnalysisResult {
    pub fn from_outcome(id: Uuid, media_type: MediaKind, outcome: DetectionOutcome) -> Self {
        Self {
            id,
            media_type,
            timestamp: Utc::now(),
            is_deepfake: outcome.is_deepfake,
            confidence: outcome.confidence,
            details: outcome.details,
            areas: outcome.areas,
            processing_time: outcome.processing_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebcamFrameRequest {
    /// Base64 encoded frame, optionally prefixed with a data-URL header.
    pub frame_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebcamFrameResponse {
    pub session_id: Uuid,
    pub is_deepfake: bool,
    pub confidence: f64,
    pub areas: Vec<SuspiciousArea>,
    pub details: HashMap<String, MetricValue>,
    pub processing_time: f64,
    pub frames_analyzed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_analyses: usize,
    pub media_type_counts: HashMap<String, usize>,
    pub deepfake_count: usize,
    pub active_webcam_sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn media_kind_uses_lowercase_wire_form() {
        assert_eq!(serde_json::to_string(&MediaKind::Image).unwrap(), "\"image\"");
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::from_str("audio").unwrap(), MediaKind::Audio);
        assert!(MediaKind::from_str("gif").is_err());
    }

    #[test]
    fn metric_values_serialize_untagged() {
        assert_eq!(serde_json::to_string(&MetricValue::Count(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&MetricValue::Score(0.5)).unwrap(), "0.5");

        let count: MetricValue = serde_json::from_str("87").unwrap();
        assert_eq!(count, MetricValue::Count(87));
        let score: MetricValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(score, MetricValue::Score(0.25));
    }

    #[test]
    fn area_frame_index_is_omitted_when_absent() {
        let area = SuspiciousArea {
            x: 0.2,
            y: 0.3,
            width: 0.1,
            height: 0.1,
            kind: AreaKind::TextureArtifact,
            confidence: 0.8,
            frame: None,
        };
        let json = serde_json::to_value(&area).unwrap();
        assert_eq!(json["type"], "texture_artifact");
        assert!(json.get("frame").is_none());
    }

    #[test]
    fn analysis_result_round_trips() {
        let result = AnalysisResult {
            id: Uuid::new_v4(),
            media_type: MediaKind::Video,
            timestamp: Utc::now(),
            is_deepfake: true,
            confidence: 0.82,
            details: HashMap::from([
                ("frames_analyzed".to_string(), MetricValue::Count(64)),
                ("temporal_analysis".to_string(), MetricValue::Score(0.4)),
            ]),
            areas: vec![SuspiciousArea {
                x: 0.5,
                y: 0.5,
                width: 0.1,
                height: 0.1,
                kind: AreaKind::LipSyncMismatch,
                confidence: 0.9,
                frame: Some(12),
            }],
            processing_time: 3.1,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(json.contains("\"media_type\":\"video\""));
    }
}
