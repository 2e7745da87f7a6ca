use crate::{
    config::ReplicateConfig,
    error::{Result, ToonifyError},
    log_sink::{progress, LogSink},
    models::{ModelReference, Prediction},
};
use reqwest::{header, Client, Response, StatusCode};
use serde_json::{json, Value};

/// Thin wrapper over the vendor's prediction endpoints.
#[derive(Clone)]
pub struct PredictionClient {
    client: Client,
    api_base: String,
    token: String,
}

impl PredictionClient {
    pub fn new(config: &ReplicateConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token()?.to_string(),
        })
    }

    fn auth(&self) -> String {
        format!("Token {}", self.token)
    }

    fn prediction_url(&self, id_or_url: &str) -> String {
        if id_or_url.starts_with("http") {
            id_or_url.to_string()
        } else {
            format!("{}/predictions/{}", self.api_base, id_or_url)
        }
    }

    /// Posts to the model-scoped endpoint. The vendor picks the model's default
    /// version. A non-success status is returned to the caller, not raised.
    pub async fn submit_by_model(&self, owner: &str, name: &str, input: &Value) -> Result<Response> {
        let url = format!("{}/models/{}/{}/predictions", self.api_base, owner, name);
        log::debug!("Submitting by model: {}", url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.auth())
            .json(&json!({ "input": input }))
            .send()
            .await
            .map_err(|e| ToonifyError::RequestError(format!("Replicate request failed: {}", e)))?;
        Ok(response)
    }

    pub async fn submit_by_version(&self, version: &str, input: &Value) -> Result<Response> {
        let url = format!("{}/predictions", self.api_base);
        log::debug!("Submitting by version {} to {}", version, url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.auth())
            .json(&json!({ "version": version, "input": input }))
            .send()
            .await
            .map_err(|e| ToonifyError::RequestError(format!("Replicate request failed: {}", e)))?;
        Ok(response)
    }

    /// First entry of the versions listing is the most recent one.
    pub async fn resolve_latest_version(&self, owner: &str, name: &str) -> Result<String> {
        let url = format!("{}/models/{}/{}/versions", self.api_base, owner, name);
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.auth())
            .send()
            .await
            .map_err(|e| ToonifyError::RequestError(format!("Replicate request failed: {}", e)))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToonifyError::UpstreamError(format!(
                "Could not fetch versions for {}/{}: {}",
                owner, name, body
            )));
        }

        let payload: Value = response.json().await.map_err(|e| {
            ToonifyError::UpstreamError(format!(
                "Invalid versions payload for {}/{}: {}",
                owner, name, e
            ))
        })?;

        let list = match &payload {
            Value::Array(items) => Some(items),
            Value::Object(obj) => obj.get("results").and_then(Value::as_array),
            _ => None,
        };
        let latest = list.and_then(|items| items.first()).ok_or_else(|| {
            ToonifyError::UpstreamError(format!("No versions for {}/{}", owner, name))
        })?;

        let id = match latest {
            Value::String(id) => Some(id.as_str()),
            Value::Object(obj) => obj
                .get("id")
                .or_else(|| obj.get("version"))
                .and_then(Value::as_str),
            _ => None,
        };

        id.map(String::from).ok_or_else(|| {
            ToonifyError::UpstreamError(format!("Invalid versions payload for {}/{}", owner, name))
        })
    }

    /// Creates a prediction for `reference`.
    ///
    /// By-model submission falls back to the explicit or latest version exactly
    /// once when the vendor answers 404 or 422. With `force_version` the
    /// by-model attempt is skipped entirely.
    pub async fn create_prediction(
        &self,
        reference: &ModelReference,
        input: &Value,
        force_version: bool,
        sink: &dyn LogSink,
    ) -> Result<Prediction> {
        let response = match reference {
            ModelReference::Version(version) => {
                let response = self.submit_by_version(version, input).await?;
                expect_success(response, "by version").await?
            }
            ModelReference::OwnerName {
                owner,
                name,
                version,
            } if force_version => {
                let version = match version {
                    Some(v) => v.clone(),
                    None => self.resolve_latest_version(owner, name).await?,
                };
                progress(sink, format!("Submitting {}/{} by version {}", owner, name, version));
                let response = self.submit_by_version(&version, input).await?;
                expect_success(response, "by version").await?
            }
            ModelReference::OwnerName {
                owner,
                name,
                version,
            } => {
                let response = self.submit_by_model(owner, name, input).await?;
                let status = response.status();
                if status.is_success() {
                    response
                } else if status == StatusCode::NOT_FOUND
                    || status == StatusCode::UNPROCESSABLE_ENTITY
                {
                    progress(
                        sink,
                        format!(
                            "Model endpoint answered {}, falling back to version submission",
                            status.as_u16()
                        ),
                    );
                    let version = match version {
                        Some(v) => v.clone(),
                        None => self.resolve_latest_version(owner, name).await?,
                    };
                    let response = self.submit_by_version(&version, input).await?;
                    expect_success(response, "fallback by version").await?
                } else {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ToonifyError::UpstreamError(format!(
                        "Replicate error (by model, {}): {}",
                        status.as_u16(),
                        body
                    )));
                }
            }
        };

        response
            .json::<Prediction>()
            .await
            .map_err(|e| ToonifyError::UpstreamError(format!("Invalid prediction payload: {}", e)))
    }

    pub async fn get_prediction(&self, id_or_url: &str) -> Result<Prediction> {
        let response = self
            .client
            .get(self.prediction_url(id_or_url))
            .header(header::AUTHORIZATION, self.auth())
            .send()
            .await
            .map_err(|e| ToonifyError::RequestError(format!("Replicate poll failed: {}", e)))?;

        let response = expect_success(response, "poll").await?;
        response
            .json::<Prediction>()
            .await
            .map_err(|e| ToonifyError::UpstreamError(format!("Invalid prediction payload: {}", e)))
    }

    /// Best-effort cancellation. Failures are logged and swallowed.
    pub async fn cancel(&self, id_or_url: &str, sink: &dyn LogSink) {
        let url = if id_or_url.starts_with("http") {
            id_or_url.to_string()
        } else {
            format!("{}/predictions/{}/cancel", self.api_base, id_or_url)
        };

        let result = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.auth())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                progress(sink, format!("Canceled prediction via {}", url));
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                log::warn!("Cancel via {} answered {}: {}", url, status, body);
                sink.emit(format!("Cancel request answered {} (ignored)", status.as_u16()));
            }
            Err(e) => {
                log::warn!("Cancel via {} failed: {}", url, e);
                sink.emit(format!("Cancel request failed (ignored): {}", e));
            }
        }
    }
}

async fn expect_success(response: Response, stage: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ToonifyError::UpstreamError(format!(
        "Replicate error ({}, {}): {}",
        stage, status, body
    )))
}
