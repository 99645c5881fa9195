use crate::error::{BedrockError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hosted image models that share one request/response wire shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Stability,
    Titan,
}

impl ModelFamily {
    /// Detect the family from a free-form model identifier (plain ids,
    /// versioned ids and inference-profile ARNs alike).
    pub fn from_model_id(model_id: &str) -> Result<Self> {
        let id = model_id.trim().to_ascii_lowercase();
        if id.contains("stability") {
            Ok(ModelFamily::Stability)
        } else if id.contains("titan") {
            Ok(ModelFamily::Titan)
        } else {
            Err(BedrockError::UnsupportedModel(format!(
                "'{}' is neither a Stability nor a Titan image model",
                model_id
            )))
        }
    }

    /// Largest seed the family accepts; seeds are drawn from `0..=max_seed()`.
    pub fn max_seed(&self) -> u32 {
        match self {
            ModelFamily::Stability => u32::MAX,
            ModelFamily::Titan => i32::MAX as u32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Stability => "stability",
            ModelFamily::Titan => "titan",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ImageModel {
    TitanV1,
    TitanV2,
    StabilityXl,
    StabilitySd3,
}

impl ImageModel {
    pub const ALL: [ImageModel; 4] = [
        ImageModel::TitanV1,
        ImageModel::TitanV2,
        ImageModel::StabilityXl,
        ImageModel::StabilitySd3,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ImageModel::TitanV1 => "amazon.titan-image-generator-v1",
            ImageModel::TitanV2 => "amazon.titan-image-generator-v2:0",
            ImageModel::StabilityXl => "stability.stable-diffusion-xl-v1",
            ImageModel::StabilitySd3 => "stability.sd3-medium-v1",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageModel::TitanV1 => "Titan Image Generator G1",
            ImageModel::TitanV2 => "Titan Image Generator G1 v2",
            ImageModel::StabilityXl => "Stable Diffusion XL 1.0",
            ImageModel::StabilitySd3 => "Stable Diffusion 3 Medium",
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ImageModel::TitanV1 | ImageModel::TitanV2 => ModelFamily::Titan,
            ImageModel::StabilityXl | ImageModel::StabilitySd3 => ModelFamily::Stability,
        }
    }

    pub fn info(&self) -> ModelInfo {
        let provider = match self.family() {
            ModelFamily::Titan => "Amazon",
            ModelFamily::Stability => "Stability AI",
        };
        ModelInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            provider: provider.to_string(),
            family: self.family(),
        }
    }

    /// (id, name, provider) for every model in the catalogue.
    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        Self::ALL
            .iter()
            .map(|model| {
                let provider = match model.family() {
                    ModelFamily::Titan => "Amazon",
                    ModelFamily::Stability => "Stability AI",
                };
                (model.id(), model.name(), provider)
            })
            .collect()
    }
}

impl Default for ImageModel {
    fn default() -> Self {
        ImageModel::TitanV1
    }
}

impl FromStr for ImageModel {
    type Err = BedrockError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|model| model.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BedrockError::UnsupportedModel(format!("unknown model id '{}'", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub family: ModelFamily,
}

/// Style presets offered by the form's style selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StylePreset {
    Anime,
    Photographic,
    DigitalArt,
    ComicBook,
    FantasyArt,
    Cinematic,
    #[serde(rename = "3d-model")]
    ThreeDModel,
    PixelArt,
    NeonPunk,
    LineArt,
    Origami,
    LowPoly,
    Isometric,
    AnalogFilm,
}

impl StylePreset {
    pub const ALL: [StylePreset; 14] = [
        StylePreset::Anime,
        StylePreset::Photographic,
        StylePreset::DigitalArt,
        StylePreset::ComicBook,
        StylePreset::FantasyArt,
        StylePreset::Cinematic,
        StylePreset::ThreeDModel,
        StylePreset::PixelArt,
        StylePreset::NeonPunk,
        StylePreset::LineArt,
        StylePreset::Origami,
        StylePreset::LowPoly,
        StylePreset::Isometric,
        StylePreset::AnalogFilm,
    ];

    /// Value of the Stability `style_preset` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            StylePreset::Anime => "anime",
            StylePreset::Photographic => "photographic",
            StylePreset::DigitalArt => "digital-art",
            StylePreset::ComicBook => "comic-book",
            StylePreset::FantasyArt => "fantasy-art",
            StylePreset::Cinematic => "cinematic",
            StylePreset::ThreeDModel => "3d-model",
            StylePreset::PixelArt => "pixel-art",
            StylePreset::NeonPunk => "neon-punk",
            StylePreset::LineArt => "line-art",
            StylePreset::Origami => "origami",
            StylePreset::LowPoly => "low-poly",
            StylePreset::Isometric => "isometric",
            StylePreset::AnalogFilm => "analog-film",
        }
    }

    /// Human wording used when the style is folded into prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            StylePreset::Anime => "anime",
            StylePreset::Photographic => "photographic",
            StylePreset::DigitalArt => "digital art",
            StylePreset::ComicBook => "comic book",
            StylePreset::FantasyArt => "fantasy art",
            StylePreset::Cinematic => "cinematic",
            StylePreset::ThreeDModel => "3D model",
            StylePreset::PixelArt => "pixel art",
            StylePreset::NeonPunk => "neon punk",
            StylePreset::LineArt => "line art",
            StylePreset::Origami => "origami",
            StylePreset::LowPoly => "low poly",
            StylePreset::Isometric => "isometric",
            StylePreset::AnalogFilm => "analog film",
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StylePreset {
    type Err = BedrockError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == wanted)
            .ok_or_else(|| BedrockError::InvalidInput(format!("unknown style preset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_detection_is_case_insensitive_substring() {
        assert_eq!(
            ModelFamily::from_model_id("stability.sd3-medium-v1").unwrap(),
            ModelFamily::Stability
        );
        assert_eq!(
            ModelFamily::from_model_id("Amazon.TITAN-image-generator-v2:0").unwrap(),
            ModelFamily::Titan
        );
        assert_eq!(
            ModelFamily::from_model_id(
                "arn:aws:bedrock:us-east-1::foundation-model/stability.stable-diffusion-xl-v1"
            )
            .unwrap(),
            ModelFamily::Stability
        );
    }

    #[test]
    fn unknown_family_is_rejected() {
        let err = ModelFamily::from_model_id("openai.dall-e-3").unwrap_err();
        assert!(matches!(err, BedrockError::UnsupportedModel(_)));
    }

    #[test]
    fn seed_ranges_differ_per_family() {
        assert_eq!(ModelFamily::Stability.max_seed(), 4_294_967_295);
        assert_eq!(ModelFamily::Titan.max_seed(), 2_147_483_647);
    }

    #[test]
    fn catalogue_ids_parse_back() {
        for model in ImageModel::ALL {
            assert_eq!(model.id().parse::<ImageModel>().unwrap(), model);
            assert_eq!(
                ModelFamily::from_model_id(model.id()).unwrap(),
                model.family()
            );
        }
        assert_eq!(ImageModel::supported_models().len(), 4);
    }

    #[test]
    fn style_presets_accept_loose_spelling() {
        assert_eq!("Digital Art".parse::<StylePreset>().unwrap(), StylePreset::DigitalArt);
        assert_eq!("3d_model".parse::<StylePreset>().unwrap(), StylePreset::ThreeDModel);
        assert!("watercolour".parse::<StylePreset>().is_err());
        assert_eq!(
            serde_json::to_string(&StylePreset::ThreeDModel).unwrap(),
            "\"3d-model\""
        );
    }
}
