use crate::error::{Result, ToonifyError};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub style_image_url: Option<String>,
}

fn check_url(field: &str, raw: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(raw)
        .map_err(|e| ToonifyError::ValidationError(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ToonifyError::ValidationError(format!(
            "{} must be http(s), got '{}'",
            field, other
        ))),
    }
}

impl GenerationRequest {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            ..Default::default()
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Checks the request and returns the source image URL.
    pub fn validate(&self) -> Result<&str> {
        let image_url = self
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ToonifyError::ValidationError("Missing imageUrl".into()))?;
        check_url("imageUrl", image_url)?;

        if let Some(style) = self.style_image_url.as_deref() {
            check_url("styleImageUrl", style)?;
        }

        if let Some(strength) = self.strength {
            if !(0.0..=1.0).contains(&strength) {
                return Err(ToonifyError::ValidationError(format!(
                    "strength must be within [0, 1], got {}",
                    strength
                )));
            }
        }

        for (field, value) in [("width", self.width), ("height", self.height)] {
            if let Some(px) = value {
                if !(256..=2048).contains(&px) {
                    return Err(ToonifyError::ValidationError(format!(
                        "{} must be within [256, 2048], got {}",
                        field, px
                    )));
                }
            }
        }

        Ok(image_url)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub output_url: String,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
