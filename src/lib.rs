pub mod bedrock;
pub mod config;
pub mod error;
pub mod imaging;
pub mod logger;
pub mod models;
pub mod session;

pub use bedrock::{BedrockClient, ImageClient, ModelInvoker};
pub use config::{BedrockConfig, Config, GenerationDefaults};
pub use error::{BedrockError, ErrorCategory, ResponseDefect, Result};
pub use imaging::{normalize, NormalizedImage, SourceImage};
pub use models::{
    GeneratedImage, GenerationMode, GenerationParams, GenerationRequest, GenerationResult,
    ImageModel, ModelFamily, ModelInfo, SeedMode, StylePreset, TitanQuality,
};
pub use session::{Feedback, PromptHistory, Session};
