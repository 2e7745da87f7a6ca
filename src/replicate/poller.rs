use crate::{
    error::{Result, ToonifyError},
    log_sink::{progress, LogSink},
    models::{CompletedPrediction, Prediction, PredictionStatus},
    replicate::PredictionClient,
};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Polls a prediction until it reaches a terminal status, or until it has sat
/// in `starting` for longer than `max_starting`.
pub struct PollLoop<'a> {
    client: &'a PredictionClient,
    interval: Duration,
    max_starting: Duration,
}

impl<'a> PollLoop<'a> {
    pub fn new(client: &'a PredictionClient, interval: Duration, max_starting: Duration) -> Self {
        Self {
            client,
            interval,
            max_starting,
        }
    }

    pub async fn run(&self, created: &Prediction, sink: &dyn LogSink) -> Result<CompletedPrediction> {
        let target = created
            .poll_target()
            .ok_or_else(|| ToonifyError::UpstreamError("Prediction has no id or poll URL".into()))?
            .to_string();

        let mut id = created.id.clone();
        let mut cancel_url = created.urls.cancel.clone();
        let mut first_poll: Option<Instant> = None;
        let mut seq: u32 = 0;

        loop {
            sleep(self.interval).await;

            let current = self.client.get_prediction(&target).await?;
            let started = *first_poll.get_or_insert_with(Instant::now);
            seq += 1;

            if !current.id.is_empty() {
                id = current.id.clone();
            }
            if current.urls.cancel.is_some() {
                cancel_url = current.urls.cancel.clone();
            }

            progress(sink, format!("[poll #{}] status: {}", seq, current.status.as_str()));

            match current.status {
                PredictionStatus::Succeeded => {
                    let output_url = current.first_output_url().ok_or_else(|| {
                        ToonifyError::FetchOutputError("No output from model".into())
                    })?;
                    return Ok(CompletedPrediction {
                        id,
                        output_url,
                        cancel_url,
                        polls: seq,
                    });
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    let detail = current
                        .error_detail()
                        .unwrap_or_else(|| format!("prediction {}", current.status.as_str()));
                    return Err(ToonifyError::PredictionFailed(detail));
                }
                PredictionStatus::Starting => {
                    let waited = started.elapsed();
                    if waited > self.max_starting {
                        return Err(ToonifyError::StartingTimeout {
                            id,
                            cancel_url,
                            waited_secs: waited.as_secs(),
                        });
                    }
                }
                PredictionStatus::Processing | PredictionStatus::Unknown => {}
            }
        }
    }
}
