//! Shared fixtures for vendor-facing tests.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use toonify::{
    BlobStorageManager, GenerationPipeline, MemoryBlobStore, PredictionClient, ReplicateConfig,
};
use wiremock::MockServer;

pub const BLOB_BASE: &str = "http://blob.test";

/// A 1x1 PNG.
pub const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Config pointed at the mock server with fast polling.
pub fn replicate_config(server: &MockServer, model: &str) -> ReplicateConfig {
    ReplicateConfig::new()
        .with_token("r8_test_token")
        .with_api_base(format!("{}/v1", server.uri()))
        .with_model(model)
        .with_poll_interval(Duration::from_millis(10))
        .with_max_starting(Duration::from_millis(60))
}

pub fn client(config: &ReplicateConfig) -> PredictionClient {
    PredictionClient::new(config).expect("token is configured")
}

/// Vendor prediction payload with `get`/`cancel` URLs on the mock server.
pub fn prediction(server: &MockServer, id: &str, status: &str, output: Value) -> Value {
    json!({
        "id": id,
        "status": status,
        "output": output,
        "error": null,
        "urls": {
            "get": format!("{}/v1/predictions/{}", server.uri(), id),
            "cancel": format!("{}/v1/predictions/{}/cancel", server.uri(), id),
        }
    })
}

pub fn memory_pipeline(config: ReplicateConfig) -> (GenerationPipeline, Arc<MemoryBlobStore>) {
    let store = Arc::new(MemoryBlobStore::new(BLOB_BASE));
    let pipeline =
        GenerationPipeline::new(config, BlobStorageManager::with_backend(store.clone()));
    (pipeline, store)
}
