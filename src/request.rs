//! Prompt, generation parameter and wire types for chat completions

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use log::trace;

// ===== Prompt =====

/// Ordered prompt fragments. The first fragment is the system
/// instruction, the rest are joined (no separator) into the
/// user message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prompt
{   fragments: Vec<String>
}

impl Prompt
{   pub fn new<I, S>(fragments: I) -> Self
    where
      I: IntoIterator<Item = S>
    , S: Into<String>
    {   Prompt
        {   fragments: fragments.into_iter().map(Into::into).collect()
        }
    }

    pub fn fragments(&self) -> &[String]
    {   &self.fragments
    }

    pub fn is_empty(&self) -> bool
    {   self.fragments.is_empty()
    }

    /// The system instruction (fragment 0)
    pub fn system(&self) -> Option<&str>
    {   self.fragments.first().map(String::as_str)
    }

    /// Every fragment after the first, concatenated
    pub fn user(&self) -> String
    {   self.fragments.iter().skip(1).map(String::as_str).collect()
    }

    /// Every fragment concatenated, system instruction included
    pub fn full_text(&self) -> String
    {   self.fragments.concat()
    }

    /// Build the system + user message pair sent to the endpoint
    pub fn to_messages(&self)
      -> Result<Vec<ChatMessage>, crate::error::Error>
    {   let system = self.system().ok_or_else(|| {
          crate::error::Error::InvalidParameters(
            "prompt needs at least a system instruction".to_string()
          )
        })?;

        let messages = vec![
          ChatMessage::new(Role::System, system)
        , ChatMessage::new(Role::User, self.user())
        ];
        trace!("Prompt messages: {:?}", messages);
        Ok(messages)
    }
}

impl<S: Into<String>> FromIterator<S> for Prompt
{   fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self
    {   Prompt::new(iter)
    }
}

// ===== Messages =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
}

impl ChatMessage
{   pub fn new(role: Role, content: impl Into<String>) -> Self
    {   ChatMessage
        {   role
          , content: content.into()
        }
    }
}

// ===== Generation parameters =====

/// Stop condition: one sequence or several.
/// An empty list means no stop sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequence
{   One(String)
  , Many(Vec<String>)
}

impl StopSequence
{   pub fn none() -> Self
    {   StopSequence::Many(vec![])
    }

    pub fn is_empty(&self) -> bool
    {   matches!(self, StopSequence::Many(v) if v.is_empty())
    }
}

/// Generation parameters as supplied by a caller or a config file.
///
/// All sampling fields are required; they are optional here so that a
/// partially filled record can be rejected with a clear error before
/// any request is made. The display flags never change what is sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationParams
{   /// Maximum number of tokens to generate
    pub max_new_tokens: Option<u32>
  , /// Number of candidate completions
    pub n: Option<u32>
  , pub temperature: Option<f32>
  , /// Nucleus sampling threshold
    pub top_p: Option<f32>
  , /// Sent as the presence penalty
    pub penalty_alpha: Option<f32>
  , pub stop: Option<StopSequence>
  , /// Echo the outgoing prompt to the observer
    #[serde(default)]
    pub show_prompt: bool
  , /// Echo the model reply to the observer
    #[serde(default)]
    pub show_model_response: bool
  , /// Escape hatch: extra fields copied verbatim into the
    /// request body. Named fields above always win.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough: BTreeMap<String, serde_json::Value>
}

impl GenerationParams
{   pub fn new() -> Self
    {   GenerationParams::default()
    }

    pub fn max_new_tokens(mut self, v: u32) -> Self
    {   self.max_new_tokens = Some(v);
        self
    }

    pub fn n(mut self, v: u32) -> Self
    {   self.n = Some(v);
        self
    }

    pub fn temperature(mut self, v: f32) -> Self
    {   self.temperature = Some(v);
        self
    }

    pub fn top_p(mut self, v: f32) -> Self
    {   self.top_p = Some(v);
        self
    }

    pub fn penalty_alpha(mut self, v: f32) -> Self
    {   self.penalty_alpha = Some(v);
        self
    }

    pub fn stop(mut self, v: StopSequence) -> Self
    {   self.stop = Some(v);
        self
    }

    pub fn show_prompt(mut self, v: bool) -> Self
    {   self.show_prompt = v;
        self
    }

    pub fn show_model_response(mut self, v: bool) -> Self
    {   self.show_model_response = v;
        self
    }

    pub fn passthrough(
      mut self
    , key: impl Into<String>
    , value: serde_json::Value
    ) -> Self
    {   self.passthrough.insert(key.into(), value);
        self
    }

    /// Check every required field is present
    pub fn validate(&self)
      -> Result<RequestSettings, crate::error::Error>
    {   fn required<T: Clone>(
          field: &Option<T>
        , name: &str
        ) -> Result<T, crate::error::Error>
        {   field.clone().ok_or_else(|| {
              crate::error::Error::InvalidParameters(
                format!("missing required parameter `{}`", name)
              )
            })
        }

        Ok(RequestSettings
        {   max_tokens: required(&self.max_new_tokens, "max_new_tokens")?
          , n: required(&self.n, "n")?
          , temperature: required(&self.temperature, "temperature")?
          , top_p: required(&self.top_p, "top_p")?
          , presence_penalty: required(&self.penalty_alpha, "penalty_alpha")?
          , stop: required(&self.stop, "stop")?
          , passthrough: self.passthrough.clone()
        })
    }
}

/// Generation parameters with every required field present
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings
{   pub max_tokens: u32
  , pub n: u32
  , pub temperature: f32
  , pub top_p: f32
  , pub presence_penalty: f32
  , pub stop: StopSequence
  , pub passthrough: BTreeMap<String, serde_json::Value>
}

// ===== Wire types =====

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub max_tokens: u32
  , pub n: u32
  , pub temperature: f32
  , pub top_p: f32
  , pub presence_penalty: f32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequence>
  , #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_json::Value>
}

impl ChatRequest
{   pub fn new(
      model: impl Into<String>
    , messages: Vec<ChatMessage>
    , settings: RequestSettings
    ) -> Self
    {   let RequestSettings
        {   max_tokens
          , n
          , temperature
          , top_p
          , presence_penalty
          , stop
          , mut passthrough
        } = settings;

        // flattened keys must not shadow the named fields
        for key in [
          "model", "messages", "max_tokens", "n", "temperature"
        , "top_p", "presence_penalty", "stop"
        ]
        {   passthrough.remove(key);
        }

        ChatRequest
        {   model: model.into()
          , messages
          , max_tokens
          , n
          , temperature
          , top_p
          , presence_penalty
          , stop: if stop.is_empty() { None } else { Some(stop) }
          , passthrough
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

impl ChatResponse
{   /// Text of the first candidate. A candidate without
    /// content is an error, not an empty completion.
    pub fn first_text(&self)
      -> Result<String, crate::error::Error>
    {   let choice = self.choices.first()
          .ok_or(crate::error::Error::NoChoicesInResponse)?;
        choice.message.content.clone()
          .ok_or(crate::error::Error::EmptyReply)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice
{   pub message: ReplyMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplyMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}
