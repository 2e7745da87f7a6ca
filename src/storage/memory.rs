use crate::{
    error::{Result, ToonifyError},
    storage::traits::{BlobStore, StoredBlob},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MemoryBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Process-local store for local runs and tests. URLs are not fetchable.
pub struct MemoryBlobStore {
    base_url: String,
    blobs: RwLock<HashMap<String, MemoryBlob>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<MemoryBlob> {
        self.blobs.read().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .read()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blob")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob> {
        let key = key.trim_start_matches('/').to_string();
        self.blobs
            .write()
            .map_err(|_| ToonifyError::StorageError("Memory store poisoned".into()))?
            .insert(
                key.clone(),
                MemoryBlob {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );

        Ok(StoredBlob {
            url: format!("{}/{}", self.base_url, key),
            pathname: key,
            content_type: Some(content_type.to_string()),
        })
    }
}
