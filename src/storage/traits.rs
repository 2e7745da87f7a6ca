use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns its public location.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub url: String,
    #[serde(default)]
    pub pathname: String,
    #[serde(default)]
    pub content_type: Option<String>,
}
