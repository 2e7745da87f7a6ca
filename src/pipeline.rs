use crate::{
    config::ReplicateConfig,
    error::{Result, ToonifyError},
    log_sink::{progress, BufferedSink, LogSink},
    models::{GenerationRequest, GenerationResponse, InputContext, ModelReference},
    replicate::{PredictionClient, RetryOrchestrator},
    storage::{timestamped_key, BlobStorageManager},
};
use reqwest::{header, Client};

const DEFAULT_NAME: &str = "Usuario";
const OUTPUT_PREFIX: &str = "outputs";
const OUTPUT_SUFFIX: &str = "avatar.png";

/// Photo in, re-hosted avatar URL out.
///
/// Configuration (including the fixed prompt) is captured at construction;
/// nothing below reads the environment. Each call to [`generate`] builds its
/// own vendor client and orchestrator, so concurrent requests share no
/// mutable state.
///
/// [`generate`]: GenerationPipeline::generate
#[derive(Clone)]
pub struct GenerationPipeline {
    config: ReplicateConfig,
    storage: BlobStorageManager,
    http: Client,
}

impl GenerationPipeline {
    pub fn new(config: ReplicateConfig, storage: BlobStorageManager) -> Self {
        Self {
            config,
            storage,
            http: Client::new(),
        }
    }

    pub fn storage(&self) -> &BlobStorageManager {
        &self.storage
    }

    /// Runs the pipeline and collects progress lines into the response.
    pub async fn generate_buffered(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let sink = BufferedSink::new();
        let output_url = self.generate(request, &sink).await?;
        Ok(GenerationResponse {
            output_url,
            logs: sink.into_lines(),
        })
    }

    pub async fn generate(&self, request: &GenerationRequest, sink: &dyn LogSink) -> Result<String> {
        let _timer = crate::logger::timer("generation");

        // Configuration problems surface before any network call.
        self.config.validate()?;
        let reference = ModelReference::parse(self.config.model_for(request.model.as_deref())?)?;
        let image_url = request.validate()?;

        let prompt = self.resolve_prompt(request);
        let input = self.config.family.build_input(&InputContext {
            request,
            image_url,
            prompt: &prompt,
            image_key: self.config.image_key.as_deref(),
            negative_prompt: self.config.negative_prompt.as_deref(),
        });
        progress(
            sink,
            format!("Using model {} ({} family)", reference, self.config.family),
        );
        log::debug!("Model input: {}", input);

        let client = PredictionClient::new(&self.config)?;
        let orchestrator = RetryOrchestrator::new(client, &self.config);
        let done = orchestrator.run(&reference, &input, sink).await?;

        progress(sink, format!("Re-hosting output {}", done.output_url));
        let url = self.rehost(&done.output_url).await?;
        progress(sink, format!("Stored output at {}", url));
        Ok(url)
    }

    fn resolve_prompt(&self, request: &GenerationRequest) -> String {
        let template = request
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(self.config.fixed_prompt.as_str());
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAME);
        template.replace("{name}", name)
    }

    /// Copies the vendor output into our own storage and returns its public URL.
    pub async fn rehost(&self, output_url: &str) -> Result<String> {
        let response = self.http.get(output_url).send().await.map_err(|e| {
            ToonifyError::FetchOutputError(format!("{} unreachable: {}", output_url, e))
        })?;

        if !response.status().is_success() {
            return Err(ToonifyError::FetchOutputError(format!(
                "{} answered {}",
                output_url,
                response.status().as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToonifyError::FetchOutputError(format!("reading {}: {}", output_url, e)))?
            .to_vec();

        let key = timestamped_key(OUTPUT_PREFIX, OUTPUT_SUFFIX);
        let stored = self.storage.put(&key, bytes, &content_type).await?;
        Ok(stored.url)
    }
}
