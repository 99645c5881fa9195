use crate::error::{BedrockError, Result};
use crate::models::{GenerationParams, ImageModel, SeedMode, TitanQuality};
use std::env;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Regions offered by the region selector; all host the Titan and Stability image models.
pub const SUPPORTED_REGIONS: [&str; 5] = [
    "us-east-1",
    "us-west-2",
    "eu-west-1",
    "ap-south-1",
    "ap-northeast-1",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub fn is_supported_region(region: &str) -> bool {
    SUPPORTED_REGIONS.contains(&region)
}

#[derive(Debug, Clone, Default)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let region = env::var("AWS_REGION")
            .or_else(|_| env::var("AWS_DEFAULT_REGION"))
            .ok();
        let access_key = env::var("AWS_ACCESS_KEY_ID").ok();
        let secret_key = env::var("AWS_SECRET_ACCESS_KEY").ok();

        BedrockConfig {
            region,
            access_key,
            secret_key,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn validate(&self) -> Result<()> {
        let region = self.region_or_default();
        if !is_supported_region(region) {
            return Err(BedrockError::ConfigError(format!(
                "region '{}' is not one of {}",
                region,
                SUPPORTED_REGIONS.join(", ")
            )));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(BedrockError::ConfigError(
                "AWS access key and secret key must be set together".into(),
            ));
        }
        Ok(())
    }
}

/// Defaults applied to every request the binary builds.
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    pub model_id: String,
    pub params: GenerationParams,
    pub timeout: Duration,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        GenerationDefaults {
            model_id: ImageModel::default().id().to_string(),
            params: GenerationParams::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GenerationDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `RGEN_*` overrides. Unparseable values are errors rather than
    /// silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut defaults = Self::default();

        if let Ok(model_id) = env::var("RGEN_MODEL_ID") {
            defaults.model_id = model_id;
        }
        if let Some(cfg_scale) = parse_env::<f32>("RGEN_CFG_SCALE")? {
            defaults.params.guidance_scale = cfg_scale;
        }
        if let Some(steps) = parse_env::<u32>("RGEN_STEPS")? {
            defaults.params.steps = steps;
        }
        if let Some(seed) = parse_env::<u32>("RGEN_SEED")? {
            defaults.params.seed = SeedMode::Fixed(seed);
        }
        if let Some(secs) = parse_env::<u64>("RGEN_TIMEOUT_SECS")? {
            defaults.timeout = Duration::from_secs(secs);
        }
        if let Ok(quality) = env::var("RGEN_TITAN_QUALITY") {
            defaults.params.quality = quality.parse::<TitanQuality>()?;
        }

        Ok(defaults)
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Pins the seed; every request becomes reproducible.
    pub fn with_fixed_seed(mut self, seed: u32) -> Self {
        self.params.seed = SeedMode::Fixed(seed);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BedrockError::ConfigError(format!("{} has an invalid value '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub bedrock: BedrockConfig,
    pub generation: GenerationDefaults,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Ok(Config {
            bedrock: BedrockConfig::from_env(),
            generation: GenerationDefaults::from_env()?,
        })
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = config;
        self
    }

    pub fn with_generation(mut self, defaults: GenerationDefaults) -> Self {
        self.generation = defaults;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_region_is_supported() {
        let config = BedrockConfig::new();
        assert_eq!(config.region_or_default(), "us-east-1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_region_is_a_config_error() {
        let config = BedrockConfig::new().with_region("mars-north-1");
        assert!(matches!(
            config.validate(),
            Err(BedrockError::ConfigError(_))
        ));
    }

    #[test]
    fn half_set_credentials_are_rejected() {
        let config = BedrockConfig {
            access_key: Some("AKIA".into()),
            ..BedrockConfig::default()
        };
        assert!(config.validate().is_err());
        let config = BedrockConfig::new().with_credentials("AKIA", "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn generation_defaults_use_random_seed_unless_pinned() {
        let defaults = GenerationDefaults::new();
        assert_eq!(defaults.params.seed, SeedMode::Random);
        assert_eq!(defaults.model_id, "amazon.titan-image-generator-v1");
        assert_eq!(defaults.timeout, Duration::from_secs(120));

        let pinned = defaults.with_fixed_seed(42);
        assert_eq!(pinned.params.seed, SeedMode::Fixed(42));
    }

    #[test]
    fn env_overrides_are_parsed_and_validated() {
        env::set_var("RGEN_TEST_GOOD", " 7 ");
        env::set_var("RGEN_TEST_BAD", "seven");
        assert_eq!(parse_env::<u32>("RGEN_TEST_GOOD").unwrap(), Some(7));
        assert!(parse_env::<u32>("RGEN_TEST_BAD").is_err());
        assert_eq!(parse_env::<u32>("RGEN_TEST_UNSET").unwrap(), None);
    }

    #[test]
    fn config_builders_compose() {
        let config = Config::new()
            .with_bedrock(BedrockConfig::new().with_region("ap-south-1"))
            .with_generation(
                GenerationDefaults::new()
                    .with_model("stability.sd3-medium-v1")
                    .with_timeout(Duration::from_secs(30)),
            );

        assert_eq!(config.bedrock.region_or_default(), "ap-south-1");
        assert!(config.bedrock.validate().is_ok());
        assert_eq!(config.generation.model_id, "stability.sd3-medium-v1");
        assert_eq!(config.generation.timeout, Duration::from_secs(30));
        assert_eq!(config.generation.params.seed, SeedMode::Random);
    }
}
