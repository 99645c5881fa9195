//! In-memory invoker used by the unit tests.

use super::invoker::{InvokeRequest, ModelInvoker};
use crate::error::{BedrockError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Body(Vec<u8>),
    ServiceError(&'static str, &'static str),
    Hang,
}

pub struct ScriptedInvoker {
    reply: Reply,
    calls: AtomicUsize,
    last: Mutex<Option<InvokeRequest>>,
}

impl ScriptedInvoker {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn titan_image(base64: &str) -> Self {
        Self::new(Reply::Body(
            serde_json::to_vec(&serde_json::json!({ "images": [base64] })).unwrap(),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<InvokeRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, request: InvokeRequest) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);
        match &self.reply {
            Reply::Body(body) => Ok(body.clone()),
            Reply::ServiceError(code, message) => {
                Err(BedrockError::from_service_code(Some(code), Some(message)))
            }
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(BedrockError::Transport("unreachable".into()))
            }
        }
    }
}
