//! genwrap: thin async clients for a chat completion endpoint and
//! the Brave web search API.
//!
//! The completion client retries rate limits, connection failures and
//! 502 responses with a fixed backoff schedule and surfaces every
//! other failure unchanged:
//!
//! ```no_run
//! use genwrap::{CompletionClient, GenerationParams, Prompt, StopSequence};
//!
//! # async fn run() -> Result<(), genwrap::Error> {
//! let client = CompletionClient::from_env("gpt-4o-mini")?;
//! let prompt = Prompt::new(["You are helpful.", "Hello ", "world"]);
//! let params = GenerationParams::new()
//!   .max_new_tokens(256)
//!   .n(1)
//!   .temperature(0.7)
//!   .top_p(1.0)
//!   .penalty_alpha(0.0)
//!   .stop(StopSequence::none());
//! let reply = client.generate(&prompt, &params).await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod retry;
pub mod observer;
pub mod client;
pub mod search;

pub use client::CompletionClient;
pub use config::{ClientConfig, SearchConfig};
pub use error::Error;
pub use observer::{LogObserver, NullObserver, Observer};
pub use providers::{ChatTransport, OpenAiTransport};
pub use request::{
  ChatMessage, ChatRequest, ChatResponse, GenerationParams
, Prompt, RequestSettings, Role, StopSequence
};
pub use retry::{classify, FailureClass, RetryPolicy, DEFAULT_RETRY_LIMIT};
pub use search::{BraveSearch, SearchParams, SearchResults, Summary};

/// Install env_logger as the `log` backend, filtered by RUST_LOG.
/// Safe to call more than once.
pub fn init_logging()
{   let _ = env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
