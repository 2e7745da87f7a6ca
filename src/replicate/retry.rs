use crate::{
    config::ReplicateConfig,
    error::{Result, ToonifyError},
    log_sink::{progress, LogSink},
    models::{CompletedPrediction, ModelReference},
    replicate::{PollLoop, PredictionClient},
};
use serde_json::Value;
use std::time::Duration;

/// Runs submit + poll, retrying only when the vendor is stuck provisioning.
///
/// A starting-phase timeout cancels the stuck prediction before anything
/// else is submitted, so a request never has two live predictions. Retries
/// go straight to version submission. Every other error is final.
pub struct RetryOrchestrator {
    client: PredictionClient,
    poll_interval: Duration,
    max_starting: Duration,
    max_retries: u32,
}

impl RetryOrchestrator {
    pub fn new(client: PredictionClient, config: &ReplicateConfig) -> Self {
        Self {
            client,
            poll_interval: config.poll_interval,
            max_starting: config.max_starting,
            max_retries: config.max_retries,
        }
    }

    pub async fn run(
        &self,
        reference: &ModelReference,
        input: &Value,
        sink: &dyn LogSink,
    ) -> Result<CompletedPrediction> {
        let poller = PollLoop::new(&self.client, self.poll_interval, self.max_starting);
        let mut attempt: u32 = 0;

        loop {
            let force_version = attempt > 0;
            progress(
                sink,
                format!(
                    "Attempt {}/{}: submitting {}{}",
                    attempt + 1,
                    self.max_retries.saturating_add(1),
                    reference,
                    if force_version { " (forced version)" } else { "" }
                ),
            );

            let prediction = self
                .client
                .create_prediction(reference, input, force_version, sink)
                .await?;
            progress(
                sink,
                format!(
                    "Prediction {} created ({})",
                    prediction.id,
                    prediction.status.as_str()
                ),
            );

            let err = match poller.run(&prediction, sink).await {
                Ok(done) => {
                    progress(sink, format!("Prediction {} succeeded", done.id));
                    return Ok(done);
                }
                Err(err) => err,
            };

            if !err.is_starting_timeout() {
                return Err(err);
            }
            if let ToonifyError::StartingTimeout { id, cancel_url, .. } = &err {
                progress(sink, format!("Prediction {} stuck in starting, canceling", id));
                let target = cancel_url.as_deref().unwrap_or(id.as_str());
                self.client.cancel(target, sink).await;
            }

            if attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;
            log::warn!("Retrying after starting timeout (attempt {})", attempt + 1);
        }
    }
}
