use crate::{
    error::{BedrockError, Result},
    models::{GenerationMode, GenerationParams, GenerationRequest, ModelFamily, StylePreset},
};
use serde_json::{json, Value};

pub const CONTENT_TYPE: &str = "application/json";
pub const ACCEPT: &str = "application/json";

/// A family-specific request body plus the values that went into it.
#[derive(Debug, Clone)]
pub struct RequestPayload {
    pub body: Value,
    pub seed: u32,
    pub final_prompt: String,
}

impl RequestPayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.body).map_err(|e| BedrockError::SerializationError(e.to_string()))
    }
}

pub fn build_payload(request: &GenerationRequest) -> Result<RequestPayload> {
    request.validate()?;

    let seed = request.params.seed.resolve(request.family)?;
    let final_prompt = request.final_prompt();

    let init_image = match (request.mode, &request.conditioning_image) {
        (GenerationMode::ImageToImage, Some(image)) => Some(image.to_base64_jpeg()?),
        (GenerationMode::ImageToImage, None) => {
            return Err(BedrockError::InvalidInput(
                "image-to-image generation needs a conditioning image".into(),
            ))
        }
        (GenerationMode::TextToImage, _) => None,
    };

    let body = match request.family {
        ModelFamily::Stability => stability_body(
            &final_prompt,
            request.style,
            &request.params,
            seed,
            init_image.as_deref(),
        ),
        ModelFamily::Titan => titan_body(&final_prompt, &request.params, seed, init_image),
    };

    Ok(RequestPayload {
        body,
        seed,
        final_prompt,
    })
}

fn stability_body(
    prompt: &str,
    style: Option<StylePreset>,
    params: &GenerationParams,
    seed: u32,
    init_image: Option<&str>,
) -> Value {
    let mut body = match init_image {
        None => json!({
            "text_prompts": [{ "text": prompt }],
            "cfg_scale": params.guidance_scale,
            "steps": params.steps,
            "seed": seed,
            "width": params.width,
            "height": params.height
        }),
        Some(image) => json!({
            "text_prompts": [{ "text": prompt }],
            "init_image": image,
            "init_image_mode": "IMAGE_STRENGTH",
            "image_strength": params.image_strength,
            "cfg_scale": params.guidance_scale,
            "steps": params.steps,
            "seed": seed
        }),
    };

    if let (Some(style), Some(obj)) = (style, body.as_object_mut()) {
        obj.insert("style_preset".to_string(), json!(style.as_str()));
    }

    body
}

fn titan_body(prompt: &str, params: &GenerationParams, seed: u32, image: Option<String>) -> Value {
    let config = json!({
        "numberOfImages": 1,
        "quality": params.quality.as_str(),
        "width": params.width,
        "height": params.height,
        "cfgScale": params.guidance_scale,
        "seed": seed
    });

    match image {
        None => json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": { "text": prompt },
            "imageGenerationConfig": config
        }),
        Some(image) => json!({
            "taskType": "IMAGE_VARIATION",
            "imageVariationParams": {
                "text": prompt,
                "images": [image]
            },
            "imageGenerationConfig": config
        }),
    }
}

/// Copy of a body with embedded base64 images replaced by their length, for logs.
pub fn redact(body: &Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("init_image", Value::String(s)) => elided(s),
                        ("images", Value::Array(items)) => Value::Array(
                            items
                                .iter()
                                .map(|item| match item {
                                    Value::String(s) => elided(s),
                                    other => redact(other),
                                })
                                .collect(),
                        ),
                        _ => redact(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn elided(s: &str) -> Value {
    json!(format!("<{} base64 chars>", s.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::normalize;
    use crate::models::{ImageModel, SeedMode};
    use image::DynamicImage;

    fn conditioning() -> crate::imaging::NormalizedImage {
        normalize(&DynamicImage::new_rgb8(700, 500)).unwrap()
    }

    #[test]
    fn sd3_identifier_selects_stability_text_shape() {
        let request = GenerationRequest::new("stability.sd3-medium-v1", "a lighthouse").unwrap();
        let payload = build_payload(&request).unwrap();
        let body = &payload.body;
        assert_eq!(body["text_prompts"][0]["text"], "a lighthouse");
        assert_eq!(body["width"], 1024);
        assert_eq!(body["height"], 1024);
        assert_eq!(body["steps"], 50);
        assert_eq!(body["cfg_scale"], 8.0);
        assert_eq!(body["seed"], payload.seed);
        assert!(body.get("init_image").is_none());
    }

    #[test]
    fn stability_image_shape_swaps_dimensions_for_strength() {
        let request = GenerationRequest::for_model(ImageModel::StabilityXl, "oil painting")
            .with_style(StylePreset::Anime)
            .with_conditioning_image(conditioning());
        let body = build_payload(&request).unwrap().body;
        assert!(body["init_image"].as_str().unwrap().len() > 100);
        assert_eq!(body["image_strength"], 0.5);
        assert_eq!(body["style_preset"], "anime");
        assert!(body.get("width").is_none());
        assert!(body.get("height").is_none());
    }

    #[test]
    fn titan_text_shape() {
        let params = GenerationParams::new().with_seed(SeedMode::Fixed(42));
        let request = GenerationRequest::for_model(ImageModel::TitanV1, "a fox")
            .with_style(StylePreset::Cinematic)
            .with_params(params);
        let payload = build_payload(&request).unwrap();
        assert_eq!(payload.seed, 42);
        assert_eq!(payload.final_prompt, "a fox, cinematic style");
        let body = &payload.body;
        assert_eq!(body["taskType"], "TEXT_IMAGE");
        assert_eq!(body["textToImageParams"]["text"], "a fox, cinematic style");
        let config = &body["imageGenerationConfig"];
        assert_eq!(config["numberOfImages"], 1);
        assert_eq!(config["quality"], "standard");
        assert_eq!(config["width"], 1024);
        assert_eq!(config["height"], 1024);
        assert_eq!(config["cfgScale"], 8.0);
        assert_eq!(config["seed"], 42);
    }

    #[test]
    fn titan_variation_shape() {
        let request = GenerationRequest::for_model(ImageModel::TitanV2, "pixar")
            .with_conditioning_image(conditioning());
        let body = build_payload(&request).unwrap().body;
        assert_eq!(body["taskType"], "IMAGE_VARIATION");
        assert_eq!(body["imageVariationParams"]["text"], "pixar");
        assert_eq!(body["imageVariationParams"]["images"].as_array().unwrap().len(), 1);
        assert!(body["imageGenerationConfig"]["seed"].as_u64().unwrap() <= i32::MAX as u64);
    }

    #[test]
    fn random_seeds_vary_between_requests() {
        let request = GenerationRequest::for_model(ImageModel::StabilityXl, "x");
        let seeds: std::collections::HashSet<u32> = (0..16)
            .map(|_| build_payload(&request).unwrap().seed)
            .collect();
        assert!(seeds.len() > 1);
    }

    #[test]
    fn empty_prompt_never_builds() {
        let request = GenerationRequest::for_model(ImageModel::TitanV1, "");
        assert!(matches!(
            build_payload(&request),
            Err(BedrockError::InvalidInput(_))
        ));
    }

    #[test]
    fn redact_hides_base64_payloads() {
        let request = GenerationRequest::for_model(ImageModel::TitanV1, "me")
            .with_conditioning_image(conditioning());
        let body = build_payload(&request).unwrap().body;
        let redacted = redact(&body).to_string();
        assert!(redacted.contains("base64 chars"));
        assert!(redacted.len() < 1000);
        assert!(redacted.contains("\"text\":\"me\""));
    }
}
