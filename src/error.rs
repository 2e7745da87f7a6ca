use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToonifyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// The prediction never left the `starting` phase within the configured
    /// threshold. This is a local decision to stop waiting, not a vendor state.
    #[error("Prediction {id} stuck in starting phase after {waited_secs}s")]
    StartingTimeout {
        id: String,
        cancel_url: Option<String>,
        waited_secs: u64,
    },

    #[error("Could not fetch model output: {0}")]
    FetchOutputError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ToonifyError {
    pub fn is_starting_timeout(&self) -> bool {
        matches!(self, ToonifyError::StartingTimeout { .. })
    }

    /// Short machine-readable label used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ToonifyError::ConfigError(_) => "config_error",
            ToonifyError::ValidationError(_) => "validation_error",
            ToonifyError::UpstreamError(_) => "upstream_error",
            ToonifyError::PredictionFailed(_) => "prediction_failed",
            ToonifyError::StartingTimeout { .. } => "starting_timeout",
            ToonifyError::FetchOutputError(_) => "fetch_output_error",
            ToonifyError::RequestError(_) => "request_error",
            ToonifyError::SerializationError(_) => "serialization_error",
            ToonifyError::StorageError(_) => "storage_error",
        }
    }
}

impl From<reqwest::Error> for ToonifyError {
    fn from(e: reqwest::Error) -> Self {
        ToonifyError::RequestError(e.to_string())
    }
}

impl From<serde_json::Error> for ToonifyError {
    fn from(e: serde_json::Error) -> Self {
        ToonifyError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for ToonifyError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            ToonifyError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ToonifyError::UpstreamError(_)
            | ToonifyError::PredictionFailed(_)
            | ToonifyError::FetchOutputError(_) => StatusCode::BAD_GATEWAY,
            ToonifyError::StartingTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ToonifyError::ConfigError(_)
            | ToonifyError::RequestError(_)
            | ToonifyError::SerializationError(_)
            | ToonifyError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "detail": self.to_string(),
        }))
    }
}

pub type Result<T> = std::result::Result<T, ToonifyError>;
