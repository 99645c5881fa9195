use crate::{
    bedrock::{
        decoder::decode_response,
        invoker::{InvokeRequest, ModelInvoker},
        payload::{build_payload, redact, ACCEPT, CONTENT_TYPE},
    },
    error::{BedrockError, Result},
    logger,
    models::{GenerationRequest, GenerationResult, ImageModel},
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct ImageClient {
    invoker: Arc<dyn ModelInvoker>,
    timeout: Duration,
}

impl ImageClient {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            invoker,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        ImageModel::supported_models()
    }

    /// Build, invoke and decode one request. Nothing is sent if the request
    /// does not validate.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let payload = build_payload(request)?;

        log::info!(
            "Generating image with model: {} ({:?})",
            request.model_id,
            request.mode
        );
        log::debug!(
            "Image generation request payload: {}",
            redact(&payload.body)
        );

        let invoke = InvokeRequest {
            model_id: request.model_id.clone(),
            body: payload.to_bytes()?,
            content_type: CONTENT_TYPE.to_string(),
            accept: ACCEPT.to_string(),
        };

        let response = {
            let _timer = logger::timer(&format!("invoke_model {}", request.model_id));
            tokio::time::timeout(self.timeout, self.invoker.invoke(invoke))
                .await
                .map_err(|_| BedrockError::Timeout(self.timeout.as_secs()))??
        };

        log::debug!("Image response body: {} bytes", response.len());

        let image = decode_response(request.family, &response)?;

        Ok(GenerationResult {
            image,
            model_id: request.model_id.clone(),
            family: request.family,
            final_prompt: payload.final_prompt,
            seed: payload.seed,
            params: request.params.clone(),
        })
    }
}
