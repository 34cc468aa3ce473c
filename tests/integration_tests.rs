use genwrap::{
  BraveSearch, ChatTransport, ClientConfig, CompletionClient, Error
, GenerationParams, OpenAiTransport, Prompt, RetryPolicy, SearchConfig
, SearchParams, StopSequence, Summary
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init()
{   let _ = env_logger::builder().is_test(true).try_init();
}

fn client_config(server: &MockServer) -> ClientConfig
{   ClientConfig::default()
      .with_api_base(format!("{}/v1", server.uri()))
      .with_api_key("test-key")
}

fn search_config(server: &MockServer) -> SearchConfig
{   SearchConfig::default()
      .with_base_url(server.uri())
      .with_api_key("brave-key")
}

fn params() -> GenerationParams
{   GenerationParams::new()
      .max_new_tokens(32)
      .n(1)
      .temperature(0.2)
      .top_p(1.0)
      .penalty_alpha(0.0)
      .stop(StopSequence::Many(vec!["END".to_string()]))
}

fn prompt() -> Prompt
{   Prompt::new(["You are helpful.", "Hello ", "world"])
}

fn completion_body(text: &str) -> serde_json::Value
{   json!({
      "id": "chatcmpl-1",
      "object": "chat.completion",
      "choices": [
        {
          "index": 0,
          "message": { "role": "assistant", "content": text },
          "finish_reason": "stop"
        }
      ]
    })
}

// ===== Completion transport =====

#[tokio::test]
async fn test_transport_requires_api_key()
{   let config = ClientConfig::default();
    let err = assert_err!(OpenAiTransport::new(&config));
    assert!(matches!(err, Error::MissingApiKey(_)));
}

#[tokio::test]
async fn test_generate_posts_expected_request()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .and(header("authorization", "Bearer test-key"))
      .and(body_partial_json(json!({
        "model": "gpt-test",
        "messages": [
          { "role": "system", "content": "You are helpful." },
          { "role": "user", "content": "Hello world" }
        ],
        "max_tokens": 32,
        "n": 1,
        "top_p": 1.0,
        "presence_penalty": 0.0,
        "stop": ["END"]
      })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(completion_body("Hi!"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = assert_ok!(
      CompletionClient::from_config("gpt-test", &client_config(&server))
    );
    let text = assert_ok!(client.generate(&prompt(), &params()).await);
    assert_eq!(text, "Hi!");
}

#[tokio::test]
async fn test_passthrough_fields_are_forwarded()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .and(body_partial_json(json!({ "user": "tester-42" })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(completion_body("ok"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = assert_ok!(
      CompletionClient::from_config("gpt-test", &client_config(&server))
    );
    let with_extra = params().passthrough("user", json!("tester-42"));
    assert_ok!(client.generate(&prompt(), &with_extra).await);
}

#[tokio::test]
async fn test_api_error_message_is_extracted()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(json!({
          "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        }))
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = assert_ok!(
      CompletionClient::from_config("gpt-test", &client_config(&server))
    );
    let err = assert_err!(client.generate(&prompt(), &params()).await);
    assert_eq!(err, Error::ApiError
    {   status: 401
      , message: "Incorrect API key provided".to_string()
    });
}

#[tokio::test]
async fn test_rate_limit_then_success_over_http()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
      .up_to_n_times(1)
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(completion_body("recovered"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let config = client_config(&server)
      .with_retry(RetryPolicy::new(3, 0, 0));
    let client = assert_ok!(CompletionClient::from_config("gpt-test", &config));
    let text = assert_ok!(client.generate(&prompt(), &params()).await);
    assert_eq!(text, "recovered");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_failure()
{   init();
    let config = ClientConfig::default()
      .with_api_base("http://127.0.0.1:1/v1")
      .with_api_key("test-key");
    let transport = assert_ok!(OpenAiTransport::new(&config));

    let request = genwrap::ChatRequest::new(
      "gpt-test"
    , assert_ok!(prompt().to_messages())
    , assert_ok!(params().validate())
    );
    let err = assert_err!(transport.complete(&request).await);
    assert!(matches!(err, Error::ConnectionFailure(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_endpoint_exhausts_retries()
{   init();
    let config = ClientConfig::default()
      .with_api_base("http://127.0.0.1:1/v1")
      .with_api_key("test-key")
      .with_retry(RetryPolicy::new(2, 0, 0));
    let client = assert_ok!(CompletionClient::from_config("gpt-test", &config));

    let err = assert_err!(client.generate(&prompt(), &params()).await);
    assert_eq!(err, Error::GenerationFailed { attempts: 2 });
}

#[tokio::test]
async fn test_malformed_success_body_is_parse_error()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .expect(1)
      .mount(&server)
      .await;

    let client = assert_ok!(
      CompletionClient::from_config("gpt-test", &client_config(&server))
    );
    let err = assert_err!(client.generate(&prompt(), &params()).await);
    assert!(matches!(err, Error::ParseError(_)));
}

// ===== Search =====

#[tokio::test]
async fn test_search_requires_api_key()
{   let err = assert_err!(BraveSearch::new(&SearchConfig::default()));
    assert_eq!(err, Error::MissingApiKey("Brave".to_string()));
}

#[tokio::test]
async fn test_search_normalizes_results()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .and(query_param("q", "rust async"))
      .and(query_param("count", "5"))
      .and(header("x-subscription-token", "brave-key"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "search",
        "web": {
          "results": [
            {
              "title": "Tokio",
              "url": "https://tokio.rs",
              "description": "An async runtime",
              "extra_snippets": ["fast", "reliable"]
            },
            { "url": "https://example.com" }
          ]
        },
        "videos": {
          "results": [
            { "title": "Intro", "url": "https://video.example/1" }
          ]
        }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let results = assert_ok!(
      brave.search("rust async", &SearchParams::new().count(5)).await
    );

    assert_eq!(results.web_results.len(), 2);
    assert_eq!(results.web_results[0].title, "Tokio");
    assert_eq!(results.web_results[0].extra_snippets, vec!["fast", "reliable"]);
    assert_eq!(results.web_results[1].title, "No data");
    assert_eq!(results.web_results[1].description, "No data");
    assert_eq!(results.web_results[1].extra_snippets, vec!["No data"]);

    assert_eq!(results.video_results.len(), 1);
    assert_eq!(results.video_results[0].title, "Intro");
    assert_eq!(results.video_results[0].description, "No data");
}

#[tokio::test]
async fn test_search_without_sections_is_empty()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "type": "search" }))
      )
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let results = assert_ok!(brave.search("nothing", &SearchParams::new()).await);
    assert!(results.web_results.is_empty());
    assert!(results.video_results.is_empty());
}

#[tokio::test]
async fn test_search_extra_params_are_sent()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .and(query_param("country", "de"))
      .and(query_param("units", "metric"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "type": "search" }))
      )
      .expect(1)
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let params = SearchParams::new().country("de").extra("units", "metric");
    assert_ok!(brave.search("weather", &params).await);
}

#[tokio::test]
async fn test_search_http_error_is_not_retried()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
      .expect(1)
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let err = assert_err!(brave.search("x", &SearchParams::new()).await);
    assert_eq!(err, Error::ApiError
    {   status: 429
      , message: "quota".to_string()
    });
}

#[tokio::test]
async fn test_summarize_with_summarizer_response()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .and(query_param("q", "What is Rust?"))
      .and(query_param("summary", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "summarizer",
        "status": "complete",
        "title": "Rust",
        "summary": [
          { "type": "token", "content": "Rust is a systems language." },
          { "type": "token", "content": " It is memory safe." }
        ],
        "followups": ["Who made Rust?"],
        "entities_infos": { "Rust": { "kind": "language" } }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let summary = assert_ok!(
      brave.summarize("What is Rust?", &SearchParams::new()).await
    );

    match summary
    {   Summary::Summarizer
        {   status, title, summary, followups, entities, enrichments
        } => {
          assert_eq!(status.as_deref(), Some("complete"));
          assert_eq!(title.as_deref(), Some("Rust"));
          assert_eq!(summary, vec![
            Some("Rust is a systems language.".to_string())
          , Some(" It is memory safe.".to_string())
          ]);
          assert_eq!(followups, vec!["Who made Rust?"]);
          assert_eq!(entities["Rust"]["kind"], "language");
          assert!(enrichments.is_none());
        }
      , other => panic!("unexpected summary: {:?}", other)
    }
}

#[tokio::test]
async fn test_summarize_tolerates_null_lists_and_keeps_empty_messages()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .and(query_param("summary", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "summarizer",
        "status": "complete",
        "summary": [
          { "type": "token", "content": "First." },
          { "type": "inline_reference" },
          { "type": "token", "content": "Last." }
        ],
        "followups": null
      })))
      .expect(1)
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let summary = assert_ok!(brave.summarize("q", &SearchParams::new()).await);

    match summary
    {   Summary::Summarizer { summary, followups, entities, .. } => {
          assert_eq!(summary, vec![
            Some("First.".to_string())
          , None
          , Some("Last.".to_string())
          ]);
          assert!(followups.is_empty());
          assert_eq!(entities, json!({}));
        }
      , other => panic!("unexpected summary: {:?}", other)
    }
}

#[tokio::test]
async fn test_summarize_with_null_summary_list()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "summarizer",
        "summary": null,
        "followups": null
      })))
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let summary = assert_ok!(brave.summarize("q", &SearchParams::new()).await);
    match summary
    {   Summary::Summarizer { summary, followups, .. } => {
          assert!(summary.is_empty());
          assert!(followups.is_empty());
        }
      , other => panic!("unexpected summary: {:?}", other)
    }
}

#[tokio::test]
async fn test_search_requests_gzip_encoding()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .and(header("accept", "application/json"))
      .and(header("accept-encoding", "gzip"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "type": "search" }))
      )
      .expect(1)
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    assert_ok!(brave.search("compressed", &SearchParams::new()).await);
}

#[tokio::test]
async fn test_search_results_serialize_with_type_tags()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "search",
        "web": { "results": [ { "title": "Tokio", "url": "https://tokio.rs" } ] },
        "videos": { "results": [ { "title": "Intro" } ] }
      })))
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let results = assert_ok!(brave.search("tokio", &SearchParams::new()).await);
    let value = serde_json::to_value(&results).unwrap();

    assert_eq!(value["web_results"][0], json!({
      "type": "web_result",
      "title": "Tokio",
      "url": "https://tokio.rs",
      "description": "No data",
      "extra_snippets": ["No data"]
    }));
    assert_eq!(value["video_results"][0], json!({
      "type": "video_result",
      "title": "Intro",
      "url": "No data",
      "description": "No data"
    }));

    let summary = assert_ok!(brave.summarize("tokio", &SearchParams::new()).await);
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["type"], json!("search"));
    assert_eq!(value["results"][0]["type"], json!("web_result"));
    assert_eq!(value["videos"][0]["type"], json!("video_result"));
    assert_eq!(value["videos"][0]["thumbnail"], json!(""));
}

#[tokio::test]
async fn test_summarize_falls_back_to_search_shape()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .and(query_param("summary", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "search",
        "query": { "original": "tokio" },
        "web": {
          "results": [
            { "title": "Tokio", "url": "https://tokio.rs" },
            {
              "title": "Docs",
              "url": "https://docs.rs/tokio",
              "description": "API docs",
              "extra_snippets": ["runtime"]
            }
          ]
        },
        "videos": {
          "results": [
            {
              "title": "Talk",
              "url": "https://video.example/2",
              "thumbnail": { "src": "https://img.example/2.png" }
            }
          ]
        }
      })))
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let summary = assert_ok!(brave.summarize("tokio", &SearchParams::new()).await);

    match summary
    {   Summary::Search { query, results, videos } => {
          assert_eq!(query, "tokio");
          assert_eq!(results.len(), 2);
          assert_eq!(results[0].description, "");
          assert!(results[0].extra_snippets.is_none());
          assert_eq!(results[1].extra_snippets, Some(vec!["runtime".to_string()]));
          assert_eq!(videos.len(), 1);
          assert_eq!(videos[0].thumbnail, "https://img.example/2.png");
          assert_eq!(videos[0].description, "");
        }
      , other => panic!("unexpected summary: {:?}", other)
    }
}

#[tokio::test]
async fn test_summarize_rejects_unknown_type()
{   init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/res/v1/web/search"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "type": "news" }))
      )
      .mount(&server)
      .await;

    let brave = assert_ok!(BraveSearch::new(&search_config(&server)));
    let err = assert_err!(brave.summarize("x", &SearchParams::new()).await);
    assert_eq!(err, Error::UnexpectedResponse("news".to_string()));
}

// ===== Live endpoints =====

#[tokio::test]
#[ignore]
async fn test_live_generate()
{   init();
    let client = match CompletionClient::from_env("gpt-4o-mini")
    {   Ok(c) => c
      , Err(e) => {
          println!("Skipping: {}", e);
          return;
        }
    };

    match client.generate(&Prompt::new(["Be brief.", "Say hello"]), &params()).await
    {   Ok(text) => {
          println!("Response: {}", text);
          assert!(!text.is_empty());
        }
      , Err(e) => println!("API Error: {}", e)
    }
}

#[tokio::test]
#[ignore]
async fn test_live_search()
{   init();
    let brave = match BraveSearch::from_env()
    {   Ok(b) => b
      , Err(e) => {
          println!("Skipping: {}", e);
          return;
        }
    };

    match brave.search("rust programming language", &SearchParams::new().count(3)).await
    {   Ok(results) => {
          println!("Retrieved {} web results", results.web_results.len());
        }
      , Err(e) => println!("Search error: {}", e)
    }
}
