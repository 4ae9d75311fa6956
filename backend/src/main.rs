use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use backend::detection::detector::Detector;
use backend::detection::simulated::SimulatedDetector;
use backend::routes::configure_routes;
use backend::runner::AnalysisRunner;
use backend::store::analysis_store::AnalysisStore;
use backend::store::session_store::SessionStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    // Constructed once and shared by every worker.
    let detector: Arc<dyn Detector> = Arc::new(SimulatedDetector::new());
    let analyses = AnalysisStore::new();
    let sessions = SessionStore::new();
    let runner = AnalysisRunner::new(Arc::clone(&detector), analyses.clone());

    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting deepfake detection server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(runner.clone()))
            .app_data(web::Data::from(Arc::clone(&detector)))
            .app_data(web::Data::new(analyses.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
