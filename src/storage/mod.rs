pub mod memory;
pub mod traits;
pub mod vercel;

use crate::{
    config::{BlobBackend, BlobConfig},
    error::Result,
};

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryBlobStore;
pub use traits::{BlobStore, StoredBlob};
pub use vercel::VercelBlobStore;

#[derive(Clone)]
pub struct BlobStorageManager {
    backend: Arc<dyn BlobStore>,
}

impl BlobStorageManager {
    pub fn new(config: BlobConfig) -> Self {
        let backend: Arc<dyn BlobStore> = match config.backend {
            BlobBackend::Vercel => Arc::new(VercelBlobStore::new(config)),
            BlobBackend::Memory => {
                log::warn!("Using in-memory blob store; stored URLs are not publicly reachable");
                Arc::new(MemoryBlobStore::default())
            }
        };

        Self { backend }
    }

    pub fn with_backend(backend: Arc<dyn BlobStore>) -> Self {
        Self { backend }
    }

    pub fn storage(&self) -> &Arc<dyn BlobStore> {
        &self.backend
    }

    pub async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob> {
        self.backend.put(key, bytes, content_type).await
    }

    /// Stores a user upload under `<prefix>/<millis>-<id>-<filename>`.
    pub async fn put_upload(
        &self,
        prefix: &str,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob> {
        let key = timestamped_key(prefix, &sanitize_filename(filename));
        self.backend.put(&key, bytes, content_type).await
    }
}

/// `<prefix>/<millis>-<id>-<suffix>`. The random id keeps keys minted in the
/// same millisecond apart.
pub fn timestamped_key(prefix: &str, suffix: &str) -> String {
    format!(
        "{}/{}-{}-{}",
        prefix.trim_matches('/'),
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        suffix
    )
}

fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(&['/', '\\'][..]).next().unwrap_or(filename);
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
