use std::env;
use toonify::logger::{self, LogLevel, LoggerConfig};
use toonify::{BlobBackend, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let mut logger_config = match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LoggerConfig::production(),
        _ => LoggerConfig::development(),
    };
    if let Some(level) = env::var("LOG_LEVEL").ok().as_deref().and_then(LogLevel::parse) {
        logger_config = logger_config.with_level(level);
    }
    if let Ok(path) = env::var("LOG_FILE") {
        logger_config = logger_config.with_file_output(&path);
    }
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    // Missing vendor or blob settings only fail the requests that need them.
    if let Err(e) = config.replicate.validate() {
        log::warn!("⚠️  {}", e);
    }
    if config.blob.backend == BlobBackend::Vercel && config.blob.token.is_none() {
        log::warn!("⚠️  BLOB_READ_WRITE_TOKEN not set; uploads and generations will fail");
    }
    if config.replicate.model.is_none() {
        log::warn!("⚠️  REPLICATE_MODEL not set; requests must pass a model override");
    }

    toonify::server::run(config).await?;
    Ok(())
}
