use std::fmt;
use log::error;

/// Custom error type for genwrap operations
/// Implements Clone so a failed attempt can be kept
/// around as the last error of a retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum Error
{   /// A required generation parameter is missing or invalid
    InvalidParameters(String)
  , /// API key is missing for an endpoint
    MissingApiKey(String)
  , /// HTTP request error
    HttpError(String)
  , /// Could not reach the endpoint (connect failure or timeout)
    ConnectionFailure(String)
  , /// API returned a non-success status
    ApiError
    {   status: u16
      , message: String
    }
  , /// Failed to parse API response
    ParseError(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// First choice carried no message content
    EmptyReply
  , /// Every attempt failed with a transient error
    GenerationFailed
    {   attempts: usize
    }
  , /// Response had a shape we do not know how to read
    UnexpectedResponse(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16>
    {   match self
        {   Error::ApiError { status, .. } => Some(*status)
          , _ => None
        }
    }

    /// Map a failure to send a request. Unreachable endpoints
    /// and timeouts become `ConnectionFailure`.
    pub(crate) fn from_send(e: reqwest::Error) -> Self
    {   if e.is_connect() || e.is_timeout()
        {   error!("Connection error: {}", e);
            Error::ConnectionFailure(e.to_string())
        } else
        {   error!("HTTP error: {}", e);
            Error::HttpError(e.to_string())
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidParameters(msg) => {
              write!(f, "Invalid generation parameters: {}", msg)
            }
          , Error::MissingApiKey(endpoint) => {
              write!(f, "Missing API key for: {}", endpoint)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ConnectionFailure(msg) => {
              write!(f, "Connection failure: {}", msg)
            }
          , Error::ApiError { status, message } => {
              write!(f, "API error ({}): {}", status, message)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::EmptyReply => {
              write!(f, "API response choice had no content")
            }
          , Error::GenerationFailed { attempts } => {
              write!(f,
                "Failed to get a completion after {} attempts",
                attempts
              )
            }
          , Error::UnexpectedResponse(kind) => {
              write!(f, "Unexpected response type: {}", kind)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
