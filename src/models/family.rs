use crate::{
    error::ToonifyError,
    models::GenerationRequest,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Model families differ only in how a generic request becomes vendor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Cartoonify,
    KontextGeneric,
    GenericImg2Img,
}

/// Everything an input builder needs beyond the raw request.
#[derive(Debug, Clone)]
pub struct InputContext<'a> {
    pub request: &'a GenerationRequest,
    pub image_url: &'a str,
    pub prompt: &'a str,
    pub image_key: Option<&'a str>,
    pub negative_prompt: Option<&'a str>,
}

impl ModelFamily {
    pub fn default_image_key(&self) -> &'static str {
        match self {
            ModelFamily::KontextGeneric => "input_image",
            ModelFamily::Cartoonify | ModelFamily::GenericImg2Img => "image",
        }
    }

    pub fn build_input(&self, ctx: &InputContext<'_>) -> Value {
        let request = ctx.request;
        let mut input = Map::new();
        input.insert("prompt".to_string(), json!(ctx.prompt));

        match self {
            ModelFamily::Cartoonify => {
                if let Some(style) = request.style_image_url.as_deref() {
                    input.insert("style_image".to_string(), json!(style));
                }
                insert_opt(&mut input, "strength", request.strength);
                insert_opt(&mut input, "width", request.width);
                insert_opt(&mut input, "height", request.height);
                insert_opt(&mut input, "seed", request.seed);
                insert_opt(&mut input, "negative_prompt", ctx.negative_prompt);
                input.insert("num_inference_steps".to_string(), json!(28));
                input.insert("guidance_scale".to_string(), json!(5));
            }
            ModelFamily::KontextGeneric => {
                input.insert("aspect_ratio".to_string(), json!("match_input_image"));
                input.insert("output_format".to_string(), json!("png"));
                insert_opt(&mut input, "seed", request.seed);
            }
            ModelFamily::GenericImg2Img => {
                insert_opt(&mut input, "strength", request.strength);
                insert_opt(&mut input, "width", request.width);
                insert_opt(&mut input, "height", request.height);
                insert_opt(&mut input, "seed", request.seed);
            }
        }

        let image_key = ctx.image_key.unwrap_or_else(|| self.default_image_key());
        input.insert(image_key.to_string(), json!(ctx.image_url));

        Value::Object(input)
    }
}

fn insert_opt<T: Serialize>(input: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        input.insert(key.to_string(), json!(value));
    }
}

impl FromStr for ModelFamily {
    type Err = ToonifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cartoonify" | "cartoon" => Ok(ModelFamily::Cartoonify),
            "kontext" | "kontextgeneric" | "kontext-generic" => Ok(ModelFamily::KontextGeneric),
            "img2img" | "genericimg2img" | "generic" => Ok(ModelFamily::GenericImg2Img),
            other => Err(ToonifyError::ConfigError(format!(
                "Unknown model family '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Cartoonify => "cartoonify",
            ModelFamily::KontextGeneric => "kontext",
            ModelFamily::GenericImg2Img => "img2img",
        };
        f.write_str(name)
    }
}
