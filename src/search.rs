//! Brave web search client
//!
//! Wraps the `/res/v1/web/search` endpoint and reshapes its JSON into
//! flat result records. Unlike the completion client there is no retry
//! here: every failure is returned to the caller.

use serde::{Deserialize, Serialize};
use log::{debug, trace, error};

const WEB_SEARCH_PATH: &str = "/res/v1/web/search";
const NO_DATA: &str = "No data";

// ===== Parameters =====

/// Optional query parameters for a search
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams
{   /// Number of results to return
    pub count: Option<u32>
  , /// Zero-based page offset
    pub offset: Option<u32>
  , /// Two-letter country code
    pub country: Option<String>
  , pub search_lang: Option<String>
  , /// off, moderate or strict
    pub safesearch: Option<String>
  , pub freshness: Option<String>
  , /// Escape hatch: raw key/value pairs appended to the query string
    pub extra: Vec<(String, String)>
}

impl SearchParams
{   pub fn new() -> Self
    {   SearchParams::default()
    }

    pub fn count(mut self, count: u32) -> Self
    {   self.count = Some(count);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self
    {   self.offset = Some(offset);
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self
    {   self.country = Some(country.into());
        self
    }

    pub fn extra(
      mut self
    , key: impl Into<String>
    , value: impl Into<String>
    ) -> Self
    {   self.extra.push((key.into(), value.into()));
        self
    }

    fn to_query(&self, query: &str) -> Vec<(String, String)>
    {   let mut pairs = vec![("q".to_string(), query.to_string())];
        let mut push = |k: &str, v: Option<String>| {
          if let Some(v) = v
          {   pairs.push((k.to_string(), v));
          }
        };
        push("count", self.count.map(|v| v.to_string()));
        push("offset", self.offset.map(|v| v.to_string()));
        push("country", self.country.clone());
        push("search_lang", self.search_lang.clone());
        push("safesearch", self.safesearch.clone());
        push("freshness", self.freshness.clone());
        pairs.extend(self.extra.iter().cloned());
        pairs
    }
}

// ===== Normalized results =====

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "web_result")]
pub struct WebResult
{   pub title: String
  , pub url: String
  , pub description: String
  , pub extra_snippets: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "video_result")]
pub struct VideoResult
{   pub title: String
  , pub url: String
  , pub description: String
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResults
{   pub web_results: Vec<WebResult>
  , pub video_results: Vec<VideoResult>
}

/// A result entry from a summarize call that fell back to search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "web_result")]
pub struct SummaryResult
{   pub title: String
  , pub description: String
  , pub url: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_snippets: Option<Vec<String>>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "video_result")]
pub struct SummaryVideo
{   pub title: String
  , pub description: String
  , pub url: String
  , pub thumbnail: String
}

/// What a summarize call produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Summary
{   /// The summarizer answered
    Summarizer
    {   status: Option<String>
      , title: Option<String>
      , /// One entry per summary message, None where it had no content
        summary: Vec<Option<String>>
      , followups: Vec<String>
      , entities: serde_json::Value
      , #[serde(skip_serializing_if = "Option::is_none")]
        enrichments: Option<serde_json::Value>
    }
  , /// Plain search results came back instead
    Search
    {   query: String
      , results: Vec<SummaryResult>
      , videos: Vec<SummaryVideo>
    }
}

// ===== Raw response =====

#[derive(Debug, Clone, Default, Deserialize)]
struct RawResponse
{   #[serde(default, rename = "type")]
    kind: Option<String>
  , #[serde(default)]
    web: Option<RawSection>
  , #[serde(default)]
    videos: Option<RawSection>
  , #[serde(default)]
    query: Option<RawQuery>
  , #[serde(default)]
    status: Option<String>
  , #[serde(default)]
    title: Option<String>
  , #[serde(default)]
    summary: Option<Vec<RawSummaryMessage>>
  , #[serde(default)]
    followups: Option<Vec<String>>
  , #[serde(default)]
    entities_infos: Option<serde_json::Value>
  , #[serde(default)]
    enrichments: Option<serde_json::Value>
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSection
{   #[serde(default)]
    results: Option<Vec<RawResult>>
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawResult
{   #[serde(default)]
    title: Option<String>
  , #[serde(default)]
    url: Option<String>
  , #[serde(default)]
    description: Option<String>
  , #[serde(default)]
    extra_snippets: Option<Vec<String>>
  , #[serde(default)]
    thumbnail: Option<RawThumbnail>
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawThumbnail
{   #[serde(default)]
    src: Option<String>
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawQuery
{   #[serde(default)]
    original: Option<String>
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSummaryMessage
{   #[serde(default)]
    content: Option<String>
}

fn section_results(section: Option<RawSection>) -> Vec<RawResult>
{   section.and_then(|s| s.results).unwrap_or_default()
}

fn or_no_data(v: Option<String>) -> String
{   v.unwrap_or_else(|| NO_DATA.to_string())
}

impl RawResponse
{   fn into_search_results(self) -> SearchResults
    {   let web_results = section_results(self.web)
          .into_iter()
          .map(|r| WebResult
          {   title: or_no_data(r.title)
            , url: or_no_data(r.url)
            , description: or_no_data(r.description)
            , extra_snippets: r.extra_snippets
                .unwrap_or_else(|| vec![NO_DATA.to_string()])
          })
          .collect();

        let video_results = section_results(self.videos)
          .into_iter()
          .map(|r| VideoResult
          {   title: or_no_data(r.title)
            , url: or_no_data(r.url)
            , description: or_no_data(r.description)
          })
          .collect();

        SearchResults
        {   web_results
          , video_results
        }
    }

    fn into_summary(self) -> Result<Summary, crate::error::Error>
    {   match self.kind.as_deref()
        {   Some("summarizer") => Ok(Summary::Summarizer
            {   status: self.status
              , title: self.title
              , summary: self.summary
                  .unwrap_or_default()
                  .into_iter()
                  .map(|m| m.content)
                  .collect()
              , followups: self.followups.unwrap_or_default()
              , entities: self.entities_infos
                  .unwrap_or_else(|| serde_json::json!({}))
              , enrichments: self.enrichments
            })
          , Some("search") => Ok(Summary::Search
            {   query: self.query
                  .and_then(|q| q.original)
                  .unwrap_or_default()
              , results: section_results(self.web)
                  .into_iter()
                  .map(|r| SummaryResult
                  {   title: r.title.unwrap_or_default()
                    , description: r.description.unwrap_or_default()
                    , url: r.url.unwrap_or_default()
                    , extra_snippets: r.extra_snippets
                  })
                  .collect()
              , videos: section_results(self.videos)
                  .into_iter()
                  .map(|r| SummaryVideo
                  {   title: r.title.unwrap_or_default()
                    , description: r.description.unwrap_or_default()
                    , url: r.url.unwrap_or_default()
                    , thumbnail: r.thumbnail
                        .and_then(|t| t.src)
                        .unwrap_or_default()
                  })
                  .collect()
            })
          , other => {
              error!("Unexpected summarize response type: {:?}", other);
              Err(crate::error::Error::UnexpectedResponse(
                other.unwrap_or("none").to_string()
              ))
            }
        }
    }
}

// ===== Client =====

/// Brave web search client
#[derive(Debug, Clone)]
pub struct BraveSearch
{   base_url: String
  , api_key: String
  , http_client: reqwest::Client
}

impl BraveSearch
{   pub fn new(
      config: &crate::config::SearchConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating BraveSearch for {}", config.base_url);
        let api_key = config.api_key.clone()
          .ok_or_else(|| {
            error!("No Brave subscription token");
            crate::error::Error::MissingApiKey("Brave".to_string())
          })?;

        Ok(BraveSearch
        {   base_url: config.base_url.trim_end_matches('/').to_string()
          , api_key
          , http_client: crate::config::http_client(config.timeout_secs)?
        })
    }

    /// Build from BRAVE_API_KEY
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   BraveSearch::new(&crate::config::SearchConfig::from_env())
    }

    /// Run a web search and normalize its web and video results
    pub async fn search(
      &self
    , query: &str
    , params: &SearchParams
    ) -> Result<SearchResults, crate::error::Error>
    {   debug!("Searching for: {}", query);
        let raw = self.fetch(params.to_query(query)).await?;
        let results = raw.into_search_results();
        debug!(
          "Search returned {} web and {} video results",
          results.web_results.len(), results.video_results.len()
        );
        Ok(results)
    }

    /// Ask for an AI summary of `query`
    pub async fn summarize(
      &self
    , query: &str
    , params: &SearchParams
    ) -> Result<Summary, crate::error::Error>
    {   debug!("Summarizing: {}", query);
        let mut pairs = params.to_query(query);
        pairs.insert(1, ("summary".to_string(), "1".to_string()));
        self.fetch(pairs).await?.into_summary()
    }

    async fn fetch(
      &self
    , pairs: Vec<(String, String)>
    ) -> Result<RawResponse, crate::error::Error>
    {   trace!("Search query: {:?}", pairs);

        let response = self.http_client
          .get(format!("{}{}", self.base_url, WEB_SEARCH_PATH))
          .header("X-Subscription-Token", &self.api_key)
          .header("Accept", "application/json")
          .query(&pairs)
          .send()
          .await
          .map_err(crate::error::Error::from_send)?;

        let status = response.status();
        trace!("Search response status: {}", status);

        if !status.is_success()
        {   let message = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Search API error {}: {}", status, message);
            return Err(crate::error::Error::ApiError
            {   status: status.as_u16()
              , message
            });
        }

        response.json::<RawResponse>().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::ParseError(e.to_string())
        })
    }
}
