use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
}

/// A vendor-side job. Only ever read here; the vendor owns its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: PredictionUrls,
}

impl Prediction {
    /// A single string output, or the first element of a list output.
    pub fn first_output_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::String(url) => Some(url.clone()),
            Value::Array(items) => items.first().and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(msg) => Some(msg.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Where to poll: the vendor-provided `urls.get`, else the id.
    pub fn poll_target(&self) -> Option<&str> {
        self.urls
            .get
            .as_deref()
            .or(Some(self.id.as_str()).filter(|id| !id.is_empty()))
    }
}

/// Terminal-success result of a poll loop.
#[derive(Debug, Clone)]
pub struct CompletedPrediction {
    pub id: String,
    pub output_url: String,
    pub cancel_url: Option<String>,
    pub polls: u32,
}
