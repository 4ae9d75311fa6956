use std::io::Write;
use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use base64::Engine;
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{MediaKind, SystemStats, WebcamFrameRequest, WebcamFrameResponse};
use uuid::Uuid;

use crate::detection::detector::Detector;
use crate::runner::AnalysisRunner;
use crate::store::analysis_store::{AnalysisStore, StoreError};
use crate::store::session_store::SessionStore;

const DEFAULT_SENSITIVITY: f32 = 0.75;
const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/analyze/image").route(web::post().to(analyze_image)))
        .service(web::resource("/api/analyze/video").route(web::post().to(analyze_video)))
        .service(web::resource("/api/analyze/audio").route(web::post().to(analyze_audio)))
        .service(web::resource("/api/analyze/webcam").route(web::post().to(analyze_webcam)))
        .service(web::resource("/api/analysis").route(web::get().to(list_analyses)))
        .service(
            web::resource("/api/analysis/{analysis_id}")
                .route(web::get().to(get_analysis))
                .route(web::delete().to(delete_analysis)),
        )
        .service(web::resource("/api/stats").route(web::get().to(get_stats)));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to the Deepfake Detection API"
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

struct Upload {
    media: Option<Vec<u8>>,
    content_type: Option<String>,
    sensitivity: f32,
}

async fn read_upload(mut payload: Multipart) -> Result<Upload, actix_web::Error> {
    let mut media = None;
    let mut content_type = None;
    let mut sensitivity = DEFAULT_SENSITIVITY;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.write_all(&chunk?)?;
        }

        match name.as_str() {
            "file" => {
                content_type = field.content_type().map(|mime| mime.to_string());
                media = Some(data);
            }
            "sensitivity" => {
                // Malformed values fall back to the default.
                if let Ok(text) = String::from_utf8(data) {
                    sensitivity = text.trim().parse().unwrap_or(DEFAULT_SENSITIVITY);
                }
            }
            _ => {}
        }
    }

    Ok(Upload {
        media,
        content_type,
        sensitivity,
    })
}

fn invalid_kind_message(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "File must be an image",
        MediaKind::Video => "File must be a video",
        MediaKind::Audio => "File must be an audio file",
        MediaKind::Webcam => "File must be a webcam frame",
    }
}

async fn submit_media(
    runner: &AnalysisRunner,
    payload: Multipart,
    kind: MediaKind,
) -> HttpResponse {
    let upload = match read_upload(payload).await {
        Ok(upload) => upload,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: format!("Malformed upload: {}", e),
            });
        }
    };

    let Some(media) = upload.media else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Missing file field".to_string(),
        });
    };

    let expected_prefix = format!("{}/", kind);
    if !upload
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with(&expected_prefix)
    {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: invalid_kind_message(kind).to_string(),
        });
    }

    let analysis_id = runner.submit(media, kind, upload.sensitivity);
    HttpResponse::Ok().json(json!({
        "message": "Analysis started",
        "analysis_id": analysis_id
    }))
}

async fn analyze_image(runner: web::Data<AnalysisRunner>, payload: Multipart) -> HttpResponse {
    submit_media(&runner, payload, MediaKind::Image).await
}

async fn analyze_video(runner: web::Data<AnalysisRunner>, payload: Multipart) -> HttpResponse {
    submit_media(&runner, payload, MediaKind::Video).await
}

async fn analyze_audio(runner: web::Data<AnalysisRunner>, payload: Multipart) -> HttpResponse {
    submit_media(&runner, payload, MediaKind::Audio).await
}

async fn analyze_webcam(
    detector: web::Data<dyn Detector>,
    sessions: web::Data<SessionStore>,
    request: web::Json<WebcamFrameRequest>,
) -> HttpResponse {
    let request = request.into_inner();

    // Browser captures arrive as data URLs; drop the header before decoding.
    let encoded = match request.frame_data.split_once(',') {
        Some((_, payload)) => payload,
        None => request.frame_data.as_str(),
    };
    let frame = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: format!("Invalid frame encoding: {}", e),
            });
        }
    };

    match detector
        .detect(&frame, MediaKind::Webcam, DEFAULT_SENSITIVITY)
        .await
    {
        Ok(outcome) => {
            let (session_id, frames_analyzed) =
                sessions.touch(request.session_id, outcome.clone()).await;
            HttpResponse::Ok().json(WebcamFrameResponse {
                session_id,
                is_deepfake: outcome.is_deepfake,
                confidence: outcome.confidence,
                areas: outcome.areas,
                details: outcome.details,
                processing_time: outcome.processing_time,
                frames_analyzed,
            })
        }
        Err(e) => {
            error!("Webcam frame analysis failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}

async fn get_analysis(store: web::Data<AnalysisStore>, path: web::Path<String>) -> HttpResponse {
    // An unparseable id can never name a stored job, so it reads as absent.
    let Ok(analysis_id) = Uuid::parse_str(&path.into_inner()) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "Analysis not found".to_string(),
        });
    };

    match store.get(analysis_id).await {
        Ok(result) => {
            info!("Retrieved analysis {}", analysis_id);
            HttpResponse::Ok().json(result)
        }
        Err(StoreError::Failed(message)) => {
            HttpResponse::InternalServerError().json(ErrorResponse { error: message })
        }
        Err(StoreError::NotFound(_)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Analysis not found".to_string(),
        }),
    }
}

#[derive(Deserialize)]
struct ListQuery {
    media_type: Option<String>,
    limit: Option<usize>,
}

async fn list_analyses(
    store: web::Data<AnalysisStore>,
    query: web::Query<ListQuery>,
) -> HttpResponse {
    let filter = match query.media_type.as_deref() {
        Some(raw) => match MediaKind::from_str(raw) {
            Ok(kind) => Some(kind),
            Err(_) => {
                return HttpResponse::BadRequest().json(ErrorResponse {
                    error: format!("Unknown media type: {}", raw),
                });
            }
        },
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 100);

    let results = store.list(filter, limit).await;
    HttpResponse::Ok().json(results)
}

async fn delete_analysis(
    store: web::Data<AnalysisStore>,
    path: web::Path<String>,
) -> HttpResponse {
    let Ok(analysis_id) = Uuid::parse_str(&path.into_inner()) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "Analysis not found".to_string(),
        });
    };

    match store.delete(analysis_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Analysis deleted" })),
        Err(_) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Analysis not found".to_string(),
        }),
    }
}

async fn get_stats(
    store: web::Data<AnalysisStore>,
    sessions: web::Data<SessionStore>,
) -> HttpResponse {
    let stats = store.stats().await;
    HttpResponse::Ok().json(SystemStats {
        total_analyses: stats.total,
        media_type_counts: stats.media_type_counts,
        deepfake_count: stats.deepfake_count,
        active_webcam_sessions: sessions.active_count().await,
    })
}
