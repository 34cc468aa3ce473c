use std::sync::Arc;
use log::{debug, error, warn};

use crate::observer::{LogObserver, Observer};
use crate::providers::{ChatTransport, OpenAiTransport};
use crate::request::{ChatRequest, GenerationParams, Prompt};
use crate::retry::{classify, RetryPolicy};

/// Chat completion client that retries transient failures.
///
/// Requests go out one at a time; `generate` holds the caller
/// through every attempt and every backoff wait.
pub struct CompletionClient<T = OpenAiTransport>
{   model: String
  , transport: T
  , retry: RetryPolicy
  , observer: Arc<dyn Observer>
}

impl CompletionClient<OpenAiTransport>
{   /// Client for an OpenAI-compatible endpoint described by `config`
    pub fn from_config(
      model: impl Into<String>
    , config: &crate::config::ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   let transport = OpenAiTransport::new(config)?;
        Ok(CompletionClient::new(model, transport)
          .with_retry_policy(config.retry.clone()))
    }

    /// Client configured from OPENAI_API_KEY / OPENAI_BASE_URL
    pub fn from_env(
      model: impl Into<String>
    ) -> Result<Self, crate::error::Error>
    {   CompletionClient::from_config(
          model
        , &crate::config::ClientConfig::from_env()
        )
    }
}

impl<T: ChatTransport> CompletionClient<T>
{   pub fn new(model: impl Into<String>, transport: T) -> Self
    {   let model = model.into();
        debug!("Creating CompletionClient for model: {}", model);
        CompletionClient
        {   model
          , transport
          , retry: RetryPolicy::default()
          , observer: Arc::new(LogObserver)
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self
    {   self.retry = retry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self
    {   self.observer = observer;
        self
    }

    pub fn model(&self) -> &str
    {   &self.model
    }

    pub fn retry_policy(&self) -> &RetryPolicy
    {   &self.retry
    }

    pub fn transport(&self) -> &T
    {   &self.transport
    }

    /// Generate one completion for `prompt`.
    ///
    /// Rate limits, connection failures and 502 responses are retried
    /// up to the policy's retry limit; any other error is returned as is.
    pub async fn generate(
      &self
    , prompt: &Prompt
    , params: &GenerationParams
    ) -> Result<String, crate::error::Error>
    {   let settings = params.validate()?;
        let messages = prompt.to_messages()?;

        if params.show_prompt
        {   self.observer.show_prompt(&prompt.full_text());
        }

        let request = ChatRequest::new(
          self.model.clone()
        , messages
        , settings
        );

        for attempt in 0..self.retry.retry_limit
        {   debug!(
              "Completion attempt {} of {} for model: {}",
              attempt + 1, self.retry.retry_limit, self.model
            );

            let err = match self.transport.complete(&request).await
            {   Ok(response) => {
                  let reply = response.first_text()?;
                  if params.show_model_response
                  {   self.observer.show_response(&reply);
                  }
                  return Ok(reply);
                }
              , Err(err) => err
            };

            let class = classify(&err);
            let Some(delay) = self.retry.delay_for(class, attempt)
            else
            {   error!("Completion failed without retry: {}", err);
                return Err(err);
            };

            warn!(
              "{:?} on attempt {} ({}), retrying in {} seconds",
              class, attempt + 1, err, delay.as_secs()
            );
            tokio::time::sleep(delay).await;
        }

        error!(
          "Giving up on model {} after {} attempts",
          self.model, self.retry.retry_limit
        );
        Err(crate::error::Error::GenerationFailed
        {   attempts: self.retry.retry_limit
        })
    }
}
