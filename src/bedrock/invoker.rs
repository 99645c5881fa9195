use crate::error::{BedrockError, Result};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{error::ProvideErrorMetadata, primitives::Blob, Client};

#[derive(Debug, Clone)]
pub struct InvokeRequest {
    pub model_id: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub accept: String,
}

/// The remote model call. Returns the raw response body.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, request: InvokeRequest) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct BedrockInvoker {
    client: Client,
}

impl BedrockInvoker {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ModelInvoker for BedrockInvoker {
    async fn invoke(&self, request: InvokeRequest) -> Result<Vec<u8>> {
        let response = self
            .client
            .invoke_model()
            .model_id(&request.model_id)
            .content_type(request.content_type)
            .accept(request.accept)
            .body(Blob::new(request.body))
            .send()
            .await
            .map_err(|e| {
                log::error!("AWS SDK Image Generation Error details: {:?}", e);

                if let Some(service_error) = e.as_service_error() {
                    log::error!("Service error code: {:?}", service_error.code());
                    log::error!("Service error message: {:?}", service_error.message());
                    BedrockError::from_service_code(service_error.code(), service_error.message())
                } else {
                    BedrockError::Transport(format!("AWS SDK error: {}", e))
                }
            })?;

        Ok(response.body.into_inner())
    }
}
