use std::collections::HashMap;
use std::ops::Range;
use std::time::{Duration, Instant};

use actix_web::rt;
use async_trait::async_trait;
use log::debug;
use rand::Rng;
use shared::{AreaKind, DetectionOutcome, MediaKind, MetricValue, SuspiciousArea};

use super::detector::{DetectionError, Detector};

const IMAGE_AREA_KINDS: &[AreaKind] = &[
    AreaKind::FacialInconsistency,
    AreaKind::TextureArtifact,
    AreaKind::MetadataMismatch,
];
const VIDEO_AREA_KINDS: &[AreaKind] = &[
    AreaKind::FacialInconsistency,
    AreaKind::LipSyncMismatch,
    AreaKind::TemporalInconsistency,
];
const WEBCAM_AREA_KINDS: &[AreaKind] = &[AreaKind::FacialInconsistency, AreaKind::TextureArtifact];

/// Randomized stand-in for a real detection model. Latency and verdict
/// probabilities differ per media kind to mimic the relative cost of each
/// pipeline; the reported processing time is wall clock and therefore
/// includes the simulated latency.
pub struct SimulatedDetector;

impl SimulatedDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimulatedDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for SimulatedDetector {
    async fn detect(
        &self,
        media: &[u8],
        kind: MediaKind,
        _sensitivity: f32,
    ) -> Result<DetectionOutcome, DetectionError> {
        if media.is_empty() {
            return Err(DetectionError::EmptyMedia);
        }

        let started = Instant::now();
        // ThreadRng is not Send, so it must not live across the await below.
        let latency = {
            let mut rng = rand::rng();
            let seconds = match kind {
                MediaKind::Image => rng.random_range(0.5..2.0),
                MediaKind::Video => rng.random_range(2.0..5.0),
                MediaKind::Audio => rng.random_range(1.0..3.0),
                MediaKind::Webcam => rng.random_range(0.1..0.5),
            };
            Duration::from_secs_f64(seconds)
        };
        rt::time::sleep(latency).await;

        let mut rng = rand::rng();
        let mut outcome = match kind {
            MediaKind::Image => simulate_image(&mut rng),
            MediaKind::Video => simulate_video(&mut rng),
            MediaKind::Audio => simulate_audio(&mut rng),
            MediaKind::Webcam => simulate_webcam(&mut rng),
        };
        outcome.processing_time = started.elapsed().as_secs_f64();
        debug!(
            "Simulated {} detection finished in {:.3}s",
            kind, outcome.processing_time
        );
        Ok(outcome)
    }
}

fn simulate_image<R: Rng>(rng: &mut R) -> DetectionOutcome {
    let is_deepfake = rng.random_bool(0.3);
    let areas = if is_deepfake {
        let count = rng.random_range(1..=3);
        (0..count)
            .map(|_| sample_area(rng, IMAGE_AREA_KINDS, 0.1..0.9, 0.1..0.9, 0.05..0.25, None))
            .collect()
    } else {
        Vec::new()
    };

    DetectionOutcome {
        is_deepfake,
        confidence: verdict_confidence(rng, is_deepfake),
        areas,
        details: scores(
            rng,
            &[
                "photoshop_detection",
                "gan_detection",
                "metadata_analysis",
                "face_consistency",
                "texture_analysis",
                "edge_artifacts",
            ],
        ),
        processing_time: 0.0,
    }
}

fn simulate_video<R: Rng>(rng: &mut R) -> DetectionOutcome {
    let is_deepfake = rng.random_bool(0.3);
    let frames_analyzed: u32 = rng.random_range(20..=100);
    let suspicious_frames = if is_deepfake {
        rng.random_range(0..=frames_analyzed / 3)
    } else {
        0
    };

    let areas = if is_deepfake {
        let count = rng.random_range(1..=3);
        (0..count)
            .map(|_| {
                let frame = rng.random_range(1..=frames_analyzed);
                sample_area(rng, VIDEO_AREA_KINDS, 0.1..0.9, 0.1..0.9, 0.05..0.25, Some(frame))
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut details = scores(
        rng,
        &[
            "facial_inconsistencies",
            "temporal_analysis",
            "lip_sync_verification",
            "eye_blink_rate",
            "head_pose_estimation",
        ],
    );
    details.insert(
        "frames_analyzed".to_string(),
        MetricValue::Count(frames_analyzed as u64),
    );
    details.insert(
        "suspicious_frames".to_string(),
        MetricValue::Count(suspicious_frames as u64),
    );

    DetectionOutcome {
        is_deepfake,
        confidence: verdict_confidence(rng, is_deepfake),
        areas,
        details,
        processing_time: 0.0,
    }
}

fn simulate_audio<R: Rng>(rng: &mut R) -> DetectionOutcome {
    let is_deepfake = rng.random_bool(0.3);

    // Audio has no visual frame, so no areas regardless of the verdict.
    DetectionOutcome {
        is_deepfake,
        confidence: verdict_confidence(rng, is_deepfake),
        areas: Vec::new(),
        details: scores(
            rng,
            &[
                "voice_cloning_detection",
                "natural_patterns_analysis",
                "neural_voice_filter",
                "frequency_analysis",
                "speech_consistency",
            ],
        ),
        processing_time: 0.0,
    }
}

fn simulate_webcam<R: Rng>(rng: &mut R) -> DetectionOutcome {
    let is_deepfake = rng.random_bool(0.2);
    let areas = if is_deepfake {
        let count = rng.random_range(1..=2);
        // Areas are biased toward the frame center, where the face sits.
        (0..count)
            .map(|_| sample_area(rng, WEBCAM_AREA_KINDS, 0.3..0.7, 0.2..0.6, 0.05..0.2, None))
            .collect()
    } else {
        Vec::new()
    };

    DetectionOutcome {
        is_deepfake,
        confidence: verdict_confidence(rng, is_deepfake),
        areas,
        details: scores(
            rng,
            &[
                "face_consistency",
                "eye_blink_rate",
                "lip_sync",
                "texture_analysis",
                "edge_artifacts",
            ],
        ),
        processing_time: 0.0,
    }
}

fn verdict_confidence<R: Rng>(rng: &mut R, is_deepfake: bool) -> f64 {
    if is_deepfake {
        0.70 + rng.random::<f64>() * 0.25
    } else {
        0.85 + rng.random::<f64>() * 0.14
    }
}

fn sample_area<R: Rng>(
    rng: &mut R,
    kinds: &[AreaKind],
    x: Range<f64>,
    y: Range<f64>,
    size: Range<f64>,
    frame: Option<u32>,
) -> SuspiciousArea {
    SuspiciousArea {
        x: rng.random_range(x),
        y: rng.random_range(y),
        width: rng.random_range(size.clone()),
        height: rng.random_range(size),
        kind: kinds[rng.random_range(0..kinds.len())],
        confidence: 0.70 + rng.random::<f64>() * 0.25,
        frame,
    }
}

fn scores<R: Rng>(rng: &mut R, keys: &[&str]) -> HashMap<String, MetricValue> {
    keys.iter()
        .map(|key| ((*key).to_string(), MetricValue::Score(rng.random())))
        .collect()
}
