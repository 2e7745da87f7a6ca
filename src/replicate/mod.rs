pub mod poller;
pub mod prediction_client;
pub mod retry;

pub use poller::PollLoop;
pub use prediction_client::PredictionClient;
pub use retry::RetryOrchestrator;
