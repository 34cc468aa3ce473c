use serde::Deserialize;
use log::{debug, trace, error};

use crate::request::{ChatRequest, ChatResponse};

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody
{   error: ApiErrorDetail
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorDetail
{   message: String
}

/// HTTP transport for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct OpenAiTransport
{   api_base: String
  , api_key: String
  , http_client: reqwest::Client
}

impl OpenAiTransport
{   pub fn new(
      config: &crate::config::ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating OpenAiTransport for {}", config.api_base);
        let api_key = config.api_key.clone()
          .ok_or_else(|| {
            error!("No API key for {}", config.api_base);
            crate::error::Error::MissingApiKey(
              config.api_base.clone()
            )
          })?;

        Ok(OpenAiTransport
        {   api_base: config.api_base.trim_end_matches('/').to_string()
          , api_key
          , http_client: crate::config::http_client(config.timeout_secs)?
        })
    }

    /// Build from OPENAI_API_KEY / OPENAI_BASE_URL
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   OpenAiTransport::new(&crate::config::ClientConfig::from_env())
    }

    fn completions_url(&self) -> String
    {   format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait::async_trait]
impl super::ChatTransport for OpenAiTransport
{   async fn complete(
      &self
    , request: &ChatRequest
    ) -> Result<ChatResponse, crate::error::Error>
    {   trace!("Chat request: {:?}", request);

        let response = self.http_client
          .post(self.completions_url())
          .bearer_auth(&self.api_key)
          .json(request)
          .send()
          .await
          .map_err(crate::error::Error::from_send)?;

        let status = response.status();
        trace!("Chat response status: {}", status);

        if !status.is_success()
        {   let body = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            let message = serde_json::from_str::<ApiErrorBody>(&body)
              .map(|b| b.error.message)
              .unwrap_or(body);
            error!("Chat API error {}: {}", status, message);
            return Err(crate::error::Error::ApiError
            {   status: status.as_u16()
              , message
            });
        }

        response.json::<ChatResponse>().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::ParseError(e.to_string())
        })
    }
}
