use crate::{
    error::{BedrockError, Result},
    imaging::NormalizedImage,
    models::{ImageModel, ModelFamily, StylePreset},
};
use image::ImageFormat;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_GUIDANCE_SCALE: f32 = 8.0;
pub const DEFAULT_STEPS: u32 = 50;
pub const DEFAULT_OUTPUT_SIZE: u32 = 1024;
pub const DEFAULT_IMAGE_STRENGTH: f32 = 0.5;

/// How the seed sent with a request is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SeedMode {
    /// Fresh uniformly drawn seed per request.
    #[default]
    Random,
    /// Pinned seed: reproducible, identical output for identical inputs.
    Fixed(u32),
}

impl SeedMode {
    pub fn resolve(&self, family: ModelFamily) -> Result<u32> {
        match *self {
            SeedMode::Random => Ok(rand::thread_rng().gen_range(0..=family.max_seed())),
            SeedMode::Fixed(seed) if seed <= family.max_seed() => Ok(seed),
            SeedMode::Fixed(seed) => Err(BedrockError::InvalidInput(format!(
                "seed {} is outside the {} range 0..={}",
                seed,
                family,
                family.max_seed()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TitanQuality {
    #[default]
    Standard,
    Premium,
}

impl TitanQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitanQuality::Standard => "standard",
            TitanQuality::Premium => "premium",
        }
    }
}

impl FromStr for TitanQuality {
    type Err = BedrockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(TitanQuality::Standard),
            "premium" => Ok(TitanQuality::Premium),
            other => Err(BedrockError::InvalidInput(format!(
                "unknown Titan quality '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GenerationMode {
    #[default]
    TextToImage,
    ImageToImage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub guidance_scale: f32,
    pub steps: u32,
    pub seed: SeedMode,
    pub width: u32,
    pub height: u32,
    pub image_strength: f32,
    pub quality: TitanQuality,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            steps: DEFAULT_STEPS,
            seed: SeedMode::Random,
            width: DEFAULT_OUTPUT_SIZE,
            height: DEFAULT_OUTPUT_SIZE,
            image_strength: DEFAULT_IMAGE_STRENGTH,
            quality: TitanQuality::Standard,
        }
    }
}

impl GenerationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guidance_scale(mut self, guidance_scale: f32) -> Self {
        self.guidance_scale = guidance_scale;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: SeedMode) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_quality(mut self, quality: TitanQuality) -> Self {
        self.quality = quality;
        self
    }

    fn validate(&self, family: ModelFamily) -> Result<()> {
        let (guidance, steps, sizes) = match family {
            ModelFamily::Stability => (0.0f32..=35.0, Some(10u32..=150), 512u32..=1536),
            ModelFamily::Titan => (1.1f32..=10.0, None, 320u32..=1408),
        };

        if !guidance.contains(&self.guidance_scale) {
            return Err(BedrockError::InvalidInput(format!(
                "guidance scale {} is outside {:?} for {} models",
                self.guidance_scale, guidance, family
            )));
        }
        if let Some(steps) = steps {
            if !steps.contains(&self.steps) {
                return Err(BedrockError::InvalidInput(format!(
                    "step count {} is outside {:?}",
                    self.steps, steps
                )));
            }
        }
        for edge in [self.width, self.height] {
            if edge % 64 != 0 || !sizes.contains(&edge) {
                return Err(BedrockError::InvalidInput(format!(
                    "output size {}x{} must use multiples of 64 within {:?}",
                    self.width, self.height, sizes
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.image_strength) {
            return Err(BedrockError::InvalidInput(format!(
                "image strength {} is outside 0..=1",
                self.image_strength
            )));
        }
        self.seed.resolve(family).map(|_| ())
    }
}

/// One user action: exactly one model invocation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model_id: String,
    pub family: ModelFamily,
    pub prompt: String,
    pub style: Option<StylePreset>,
    pub mode: GenerationMode,
    pub conditioning_image: Option<NormalizedImage>,
    pub params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(model_id: impl Into<String>, prompt: impl Into<String>) -> Result<Self> {
        let model_id = model_id.into();
        let family = ModelFamily::from_model_id(&model_id)?;
        Ok(Self {
            model_id,
            family,
            prompt: prompt.into(),
            style: None,
            mode: GenerationMode::TextToImage,
            conditioning_image: None,
            params: GenerationParams::default(),
        })
    }

    pub fn for_model(model: ImageModel, prompt: impl Into<String>) -> Self {
        Self {
            model_id: model.id().to_string(),
            family: model.family(),
            prompt: prompt.into(),
            style: None,
            mode: GenerationMode::TextToImage,
            conditioning_image: None,
            params: GenerationParams::default(),
        }
    }

    pub fn with_style(mut self, style: StylePreset) -> Self {
        self.style = Some(style);
        self
    }

    /// Switches the request to image-to-image.
    pub fn with_conditioning_image(mut self, image: NormalizedImage) -> Self {
        self.conditioning_image = Some(image);
        self.mode = GenerationMode::ImageToImage;
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Prompt text as sent to the model. Titan has no preset field, so the
    /// style is folded into the text.
    pub fn final_prompt(&self) -> String {
        let prompt = self.prompt.trim();
        match (self.family, self.style) {
            (ModelFamily::Titan, Some(style)) => format!("{}, {} style", prompt, style.label()),
            _ => prompt.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(BedrockError::InvalidInput("prompt must not be empty".into()));
        }
        if self.mode == GenerationMode::ImageToImage && self.conditioning_image.is_none() {
            return Err(BedrockError::InvalidInput(
                "upload a photo to use as the conditioning image".into(),
            ));
        }
        self.params.validate(self.family)
    }
}

/// Image returned by the model, kept both as received and decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub base64: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Re-encode as PNG whatever raster format the model returned.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(&self.bytes)
            .map_err(|e| BedrockError::InvalidImage(format!("generated image: {}", e)))?;
        let mut png = Vec::new();
        decoded
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| BedrockError::InvalidImage(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image: GeneratedImage,
    pub model_id: String,
    pub family: ModelFamily,
    pub final_prompt: String,
    pub seed: u32,
    pub params: GenerationParams,
}

impl GenerationResult {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.image.to_png()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_png()?)?;
        Ok(())
    }

    /// Suggested download name, e.g.
    /// `generated_stability_sd3-medium-v1_42_1712345678901.png` (seed, then epoch millis).
    pub fn file_name(&self) -> String {
        let tail = self.model_id.rsplit('/').next().unwrap_or(&self.model_id);
        let short_id = tail
            .split_once('.')
            .map(|(_, rest)| rest)
            .unwrap_or(tail)
            .replace(':', "_");
        format!(
            "generated_{}_{}_{}_{}.png",
            self.family,
            short_id,
            self.seed,
            chrono::Utc::now().timestamp_millis()
        )
    }
}

#[derive(Serialize, Deserialize)]
pub struct StabilityArtifact {
    pub base64: String,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct StabilityImageResponse {
    #[serde(default)]
    pub result: Option<String>,
    pub artifacts: Vec<StabilityArtifact>,
}

#[derive(Serialize, Deserialize)]
pub struct TitanImageResponse {
    pub images: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    #[test]
    fn empty_or_blank_prompt_is_invalid() {
        let request = GenerationRequest::for_model(ImageModel::TitanV1, "   ");
        assert!(matches!(
            request.validate(),
            Err(BedrockError::InvalidInput(_))
        ));
    }

    #[test]
    fn image_mode_requires_an_image() {
        let request = GenerationRequest::for_model(ImageModel::StabilityXl, "a cat")
            .with_mode(GenerationMode::ImageToImage);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("conditioning image"));
    }

    #[test]
    fn conditioning_image_switches_mode() {
        let image = crate::imaging::normalize(&DynamicImage::new_rgb8(512, 512)).unwrap();
        let request =
            GenerationRequest::for_model(ImageModel::TitanV1, "me").with_conditioning_image(image);
        assert_eq!(request.mode, GenerationMode::ImageToImage);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_model_id_is_rejected_up_front() {
        assert!(matches!(
            GenerationRequest::new("meta.llama3-8b", "hi"),
            Err(BedrockError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn titan_folds_style_into_prompt_stability_does_not() {
        let titan = GenerationRequest::for_model(ImageModel::TitanV2, " portrait ")
            .with_style(StylePreset::PixelArt);
        assert_eq!(titan.final_prompt(), "portrait, pixel art style");

        let sdxl = GenerationRequest::for_model(ImageModel::StabilityXl, "portrait")
            .with_style(StylePreset::PixelArt);
        assert_eq!(sdxl.final_prompt(), "portrait");
    }

    #[test]
    fn random_seeds_stay_in_family_range() {
        for _ in 0..200 {
            assert!(SeedMode::Random.resolve(ModelFamily::Titan).unwrap() <= i32::MAX as u32);
        }
    }

    #[test]
    fn fixed_seed_is_reproducible_and_range_checked() {
        assert_eq!(SeedMode::Fixed(42).resolve(ModelFamily::Titan).unwrap(), 42);
        assert_eq!(
            SeedMode::Fixed(u32::MAX)
                .resolve(ModelFamily::Stability)
                .unwrap(),
            u32::MAX
        );
        assert!(SeedMode::Fixed(u32::MAX).resolve(ModelFamily::Titan).is_err());
    }

    #[test]
    fn parameter_ranges_depend_on_family() {
        let params = GenerationParams::new().with_guidance_scale(20.0);
        let sdxl = GenerationRequest::for_model(ImageModel::StabilityXl, "x").with_params(params.clone());
        assert!(sdxl.validate().is_ok());
        let titan = GenerationRequest::for_model(ImageModel::TitanV1, "x").with_params(params);
        assert!(titan.validate().is_err());

        let odd = GenerationParams::new().with_size(1000, 1024);
        let titan = GenerationRequest::for_model(ImageModel::TitanV1, "x").with_params(odd);
        assert!(titan.validate().is_err());

        let few_steps = GenerationParams::new().with_steps(5);
        let sdxl = GenerationRequest::for_model(ImageModel::StabilityXl, "x").with_params(few_steps);
        assert!(sdxl.validate().is_err());
    }

    #[test]
    fn generated_image_converts_to_png() {
        let mut jpeg = Vec::new();
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let generated = GeneratedImage {
            base64: String::new(),
            bytes: jpeg,
        };
        let png = generated.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    fn titan_result(seed: u32) -> GenerationResult {
        GenerationResult {
            image: GeneratedImage {
                base64: String::new(),
                bytes: Vec::new(),
            },
            model_id: "amazon.titan-image-generator-v2:0".into(),
            family: ModelFamily::Titan,
            final_prompt: "x".into(),
            seed,
            params: GenerationParams::default(),
        }
    }

    #[test]
    fn download_name_uses_short_model_id() {
        assert!(titan_result(1)
            .file_name()
            .starts_with("generated_titan_titan-image-generator-v2_0_1_"));
    }

    #[test]
    fn back_to_back_downloads_get_distinct_names() {
        let first = titan_result(7).file_name();
        let second = titan_result(8).file_name();
        assert_ne!(first, second);

        let millis = first
            .trim_end_matches(".png")
            .rsplit('_')
            .next()
            .unwrap()
            .parse::<i64>()
            .unwrap();
        assert!(millis > 1_000_000_000_000);
    }
}
