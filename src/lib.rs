pub mod config;
pub mod error;
pub mod log_sink;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod replicate;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{BlobBackend, BlobConfig, Config, ReplicateConfig};
pub use error::{Result, ToonifyError};
pub use log_sink::{BufferedSink, LogSink, StreamSink};
pub use models::*;
pub use pipeline::GenerationPipeline;
pub use replicate::{PollLoop, PredictionClient, RetryOrchestrator};
pub use storage::{BlobStorageManager, BlobStore, MemoryBlobStore, StoredBlob, VercelBlobStore};
