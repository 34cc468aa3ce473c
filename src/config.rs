//! Configuration for the completion and search endpoints

use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_API_BASE: &str
  = "https://api.openai.com/v1";

pub const DEFAULT_BRAVE_API_BASE: &str
  = "https://api.search.brave.com";

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const BRAVE_API_KEY_VAR: &str = "BRAVE_API_KEY";

/// Completion client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig
{   /// API base URL, without the trailing /chat/completions
    pub api_base: String
  , /// Bearer token for the endpoint
    pub api_key: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
  , /// Retry behavior for transient failures
    pub retry: crate::retry::RetryPolicy
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   api_base: DEFAULT_OPENAI_API_BASE.to_string()
          , api_key: None
          , timeout_secs: None
          , retry: crate::retry::RetryPolicy::default()
        }
    }
}

impl ClientConfig
{   /// Defaults, with key and base URL read from the environment
    pub fn from_env() -> Self
    {   let mut config = ClientConfig::default();
        config.api_key = non_empty_var(OPENAI_API_KEY_VAR);
        if let Some(base) = non_empty_var(OPENAI_BASE_URL_VAR)
        {   config.api_base = base;
        }
        config
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self
    {   self.api_base = api_base.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self
    {   self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self
    {   self.timeout_secs = Some(secs);
        self
    }

    pub fn with_retry(mut self, retry: crate::retry::RetryPolicy) -> Self
    {   self.retry = retry;
        self
    }
}

/// Search client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig
{   /// API base URL, without the /res/v1/web/search path
    pub base_url: String
  , /// Subscription token
    pub api_key: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
}

impl Default for SearchConfig
{   fn default() -> Self
    {   SearchConfig
        {   base_url: DEFAULT_BRAVE_API_BASE.to_string()
          , api_key: None
          , timeout_secs: None
        }
    }
}

impl SearchConfig
{   /// Defaults, with the subscription token read from the environment
    pub fn from_env() -> Self
    {   SearchConfig
        {   api_key: non_empty_var(BRAVE_API_KEY_VAR)
          , ..SearchConfig::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self
    {   self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self
    {   self.api_key = Some(api_key.into());
        self
    }
}

fn non_empty_var(name: &str) -> Option<String>
{   std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Shared reqwest client builder honoring an optional timeout
pub(crate) fn http_client(
  timeout_secs: Option<u64>
) -> Result<reqwest::Client, crate::error::Error>
{   let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs
    {   builder = builder.timeout(std::time::Duration::from_secs(secs));
    }
    builder.build().map_err(|e| {
      crate::error::Error::InvalidConfiguration(e.to_string())
    })
}
