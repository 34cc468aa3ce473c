//! Chat completion transports

pub mod openai;

// Re-export for convenience
pub use openai::OpenAiTransport;

use crate::request::{ChatRequest, ChatResponse};

/// One round trip to a chat completion endpoint.
///
/// Implementations report failures as crate errors so that
/// `retry::classify` can decide what to do with them:
/// unreachable endpoints as `ConnectionFailure`, non-success
/// statuses as `ApiError`.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync
{   async fn complete(
      &self
    , request: &ChatRequest
    ) -> Result<ChatResponse, crate::error::Error>;
}

#[async_trait::async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for std::sync::Arc<T>
{   async fn complete(
      &self
    , request: &ChatRequest
    ) -> Result<ChatResponse, crate::error::Error>
    {   (**self).complete(request).await
    }
}
