use crate::{
    config::BlobConfig,
    error::{Result, ToonifyError},
    storage::traits::{BlobStore, StoredBlob},
};
use async_trait::async_trait;
use reqwest::{header, Client};

const API_VERSION: &str = "7";

/// Public-read object storage reached over the Vercel Blob HTTP API.
pub struct VercelBlobStore {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl VercelBlobStore {
    /// A missing token is only reported when something is stored.
    pub fn new(config: BlobConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base,
            token: config.token,
        }
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| ToonifyError::ConfigError("Missing BLOB_READ_WRITE_TOKEN".into()))
    }
}

#[async_trait]
impl BlobStore for VercelBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob> {
        let token = self.token()?;
        let url = format!("{}/{}", self.api_base, key.trim_start_matches('/'));
        log::debug!("Uploading {} bytes to {}", bytes.len(), url);

        let response = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header("x-api-version", API_VERSION)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ToonifyError::StorageError(format!("Blob upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ToonifyError::StorageError(format!(
                "Blob upload answered {}: {}",
                status, body
            )));
        }

        let stored: StoredBlob = response
            .json()
            .await
            .map_err(|e| ToonifyError::StorageError(format!("Invalid blob response: {}", e)))?;

        log::info!("Stored blob {}", stored.url);
        Ok(stored)
    }
}
