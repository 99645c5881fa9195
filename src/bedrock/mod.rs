pub mod decoder;
pub mod image_client;
pub mod invoker;
pub mod payload;

#[cfg(test)]
pub(crate) mod testing;

use crate::{
    config::{is_supported_region, BedrockConfig, DEFAULT_REGION, SUPPORTED_REGIONS},
    error::{BedrockError, Result},
};
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::Client;
use std::sync::Arc;
use std::time::Duration;

pub use decoder::decode_response;
pub use image_client::ImageClient;
pub use invoker::{BedrockInvoker, InvokeRequest, ModelInvoker};
pub use payload::{build_payload, RequestPayload};

#[derive(Clone)]
pub struct BedrockClient {
    image_client: ImageClient,
    region: String,
}

impl BedrockClient {
    pub async fn new(bedrock_config: BedrockConfig) -> Result<Self> {
        bedrock_config.validate()?;

        let region = bedrock_config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(
            aws_sdk_bedrockruntime::config::Region::new(region.clone()),
        );

        if let (Some(access_key), Some(secret_key)) =
            (&bedrock_config.access_key, &bedrock_config.secret_key)
        {
            loader = loader.credentials_provider(aws_sdk_bedrockruntime::config::Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "rgen-studio",
            ));
        }

        let aws_config = loader.load().await;
        let client = Client::new(&aws_config);

        log::debug!("Bedrock runtime client ready for region {}", region);

        Ok(Self {
            image_client: ImageClient::new(Arc::new(BedrockInvoker::new(client))),
            region,
        })
    }

    /// Client over any invoker, e.g. an alternative transport.
    pub fn from_invoker(invoker: Arc<dyn ModelInvoker>, region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        if !is_supported_region(&region) {
            return Err(BedrockError::ConfigError(format!(
                "region '{}' is not one of {}",
                region,
                SUPPORTED_REGIONS.join(", ")
            )));
        }
        Ok(Self {
            image_client: ImageClient::new(invoker),
            region,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.image_client = self.image_client.with_timeout(timeout);
        self
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}
