pub mod handlers;

use crate::{config::Config, pipeline::GenerationPipeline, storage::BlobStorageManager};
use actix_web::{web, App, HttpServer};

pub struct AppState {
    pub pipeline: GenerationPipeline,
}

impl AppState {
    pub fn new(pipeline: GenerationPipeline) -> Self {
        Self { pipeline }
    }

    pub fn from_config(config: &Config) -> Self {
        let storage = BlobStorageManager::new(config.blob.clone());
        Self::new(GenerationPipeline::new(config.replicate.clone(), storage))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/generate", web::post().to(handlers::generate))
                .route("/upload", web::post().to(handlers::upload))
                .route("/style", web::post().to(handlers::upload_style)),
        );
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let port = config.port.unwrap_or(8080);
    let state = web::Data::new(AppState::from_config(&config));

    crate::logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}
