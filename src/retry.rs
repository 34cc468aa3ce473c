//! Retry policy and error classification for completion requests

use std::time::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

/// Number of attempts a completion client makes by default
pub const DEFAULT_RETRY_LIMIT: usize = 5;

/// Seconds to wait after the endpoint reports a rate limit
pub const RATE_LIMIT_WAIT_SECS: u64 = 20;

/// Seconds to wait after failing to reach the endpoint
pub const CONNECTION_WAIT_SECS: u64 = 2;

const TOO_MANY_REQUESTS: u16 = 429;
const BAD_GATEWAY: u16 = 502;

/// How a failed attempt should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass
{   /// Endpoint asked us to slow down
    RateLimited
  , /// Endpoint could not be reached
    ConnectionFailure
  , /// Upstream answered 502
    BadGateway
  , /// Anything else; carries the status when there was one
    Other(Option<u16>)
}

impl FailureClass
{   /// Whether the retry loop should wait and try again
    pub fn is_transient(&self) -> bool
    {   !matches!(self, FailureClass::Other(_))
    }
}

/// Classify an error independently of the transport that produced it
pub fn classify(err: &crate::error::Error) -> FailureClass
{   match err
    {   crate::error::Error::ConnectionFailure(_) => {
          FailureClass::ConnectionFailure
        }
      , crate::error::Error::ApiError { status, .. } => {
          match *status
          {   TOO_MANY_REQUESTS => FailureClass::RateLimited
            , BAD_GATEWAY => FailureClass::BadGateway
            , other => FailureClass::Other(Some(other))
          }
        }
      , _ => FailureClass::Other(None)
    }
}

/// Retry policy for completion requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy
{   /// Total attempts, including the first one
    pub retry_limit: usize
  , /// Fixed wait after a rate-limit response
    pub rate_limit_wait_secs: u64
  , /// Fixed wait after a connection failure
    pub connection_wait_secs: u64
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      retry_limit: usize
    , rate_limit_wait_secs: u64
    , connection_wait_secs: u64
    ) -> Self
    {   RetryPolicy
        {   retry_limit
          , rate_limit_wait_secs
          , connection_wait_secs
        }
    }

    /// Same waits, different attempt ceiling
    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self
    {   self.retry_limit = retry_limit;
        self
    }

    /// Exponential wait used for bad gateway responses:
    /// 2^(attempt + 2) seconds
    pub fn bad_gateway_backoff(
      &self
    , attempt: usize
    ) -> Duration
    {   debug!("Calculating backoff for attempt {}", attempt);
        let exponent = (attempt as u32).saturating_add(2).min(63);
        Duration::from_secs(1u64 << exponent)
    }

    /// Wait before the next attempt, or None if the failure is fatal
    pub fn delay_for(
      &self
    , class: FailureClass
    , attempt: usize
    ) -> Option<Duration>
    {   match class
        {   FailureClass::RateLimited => Some(
              Duration::from_secs(self.rate_limit_wait_secs)
            )
          , FailureClass::ConnectionFailure => Some(
              Duration::from_secs(self.connection_wait_secs)
            )
          , FailureClass::BadGateway => Some(
              self.bad_gateway_backoff(attempt)
            )
          , FailureClass::Other(_) => None
        }
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(
          DEFAULT_RETRY_LIMIT
        , RATE_LIMIT_WAIT_SECS
        , CONNECTION_WAIT_SECS
        )
    }
}
