//! Ollama backend tests against a local stub server.
//!
//! The stub speaks just enough HTTP/1.1 to answer one request per
//! connection, so these tests run without a model installed.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use redline::llm::{
    GenerationClient, GenerationError, GenerationRequest, OllamaBackend, OllamaEndpoint, RetryPolicy,
};
use redline::{
    FlaggedIssue, IntelligenceTier, RedlineConfig, SuggestionMethod, SuggestionOrchestrator,
};

const LABELED: &str = "CORRECTED: The team wrote the report.\n\
                       REASONING: Active voice.\n\
                       EXPLANATION: Lead with the actor.";

/// A request as the stub saw it.
#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    body: Value,
}

/// Canned reply: status, body, and a delay before answering.
#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct StubServer {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub server");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    break;
                };
                let reply = reply.clone();
                let seen = Arc::clone(&seen);
                thread::spawn(move || handle(stream, &reply, &seen));
            }
        });

        Self { url, requests }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle(stream: TcpStream, reply: &Reply, seen: &Mutex<Vec<Recorded>>) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }
    seen.lock().unwrap().push(Recorded {
        path,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    thread::sleep(reply.delay);

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn client_for(url: &str, endpoint: OllamaEndpoint) -> GenerationClient {
    let backend = OllamaBackend::with_host(Some(url), endpoint).expect("Failed to create backend");
    GenerationClient::new(Arc::new(backend)).expect("Failed to create client")
}

fn request(tier: IntelligenceTier, timeout: Duration) -> GenerationRequest {
    GenerationRequest::new("## Sentence\n\"The report was written by the team.\"", tier, timeout)
}

// =============================================================================
// Endpoints
// =============================================================================

#[test]
fn test_generate_endpoint() {
    let server = StubServer::start(Reply::ok(json!({ "response": LABELED, "done": true })));
    let client = client_for(&server.url, OllamaEndpoint::Generate);

    let text = client
        .invoke(&request(IntelligenceTier::Standard, Duration::from_secs(5)))
        .unwrap();

    assert_eq!(text, LABELED);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/generate");
    assert_eq!(requests[0].body["model"], "llama3.2");
    assert_eq!(requests[0].body["stream"], false);
    assert!(requests[0].body["system"].as_str().unwrap().contains("copy editor"));
    assert!(requests[0].body["prompt"].as_str().unwrap().contains("## Sentence"));
}

#[test]
fn test_chat_endpoint() {
    let server = StubServer::start(Reply::ok(json!({
        "message": { "role": "assistant", "content": LABELED },
        "done": true
    })));
    let client = client_for(&server.url, OllamaEndpoint::Chat);

    let text = client
        .invoke(&request(IntelligenceTier::Fast, Duration::from_secs(5)))
        .unwrap();

    assert_eq!(text, LABELED);
    let requests = server.requests();
    assert_eq!(requests[0].path, "/api/chat");
    assert_eq!(requests[0].body["messages"][0]["role"], "system");
    assert_eq!(requests[0].body["messages"][1]["role"], "user");
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_missing_model() {
    let server = StubServer::start(Reply::status(404, r#"{"error":"model \"llama3.2\" not found"}"#));
    let client = client_for(&server.url, OllamaEndpoint::Generate);

    let err = client
        .invoke(&request(IntelligenceTier::Standard, Duration::from_secs(5)))
        .unwrap_err();

    assert_eq!(err, GenerationError::ModelNotFound("llama3.2".to_string()));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_server_error_is_retried() {
    let server = StubServer::start(Reply::status(500, "overloaded"));
    let client = client_for(&server.url, OllamaEndpoint::Generate).with_retry(RetryPolicy {
        max_retries: 1,
        initial_delay_ms: 10,
        max_delay_ms: 20,
    });

    let err = client
        .invoke(&request(IntelligenceTier::Standard, Duration::from_secs(5)))
        .unwrap_err();

    assert_eq!(
        err,
        GenerationError::Status {
            status: 500,
            body: "overloaded".to_string()
        }
    );
    assert_eq!(server.requests().len(), 2);
}

#[test]
fn test_blank_response_is_empty() {
    let server = StubServer::start(Reply::ok(json!({ "response": "   ", "done": true })));
    let client = client_for(&server.url, OllamaEndpoint::Generate);

    let err = client
        .invoke(&request(IntelligenceTier::Fast, Duration::from_secs(5)))
        .unwrap_err();

    assert_eq!(err, GenerationError::EmptyResponse);
}

#[test]
fn test_malformed_body() {
    let server = StubServer::start(Reply::status(200, "not json"));
    let client = client_for(&server.url, OllamaEndpoint::Generate);

    let err = client
        .invoke(&request(IntelligenceTier::Fast, Duration::from_secs(5)))
        .unwrap_err();

    assert!(matches!(err, GenerationError::Decode(_)));
}

#[test]
fn test_slow_server_times_out() {
    let server = StubServer::start(
        Reply::ok(json!({ "response": LABELED })).delayed(Duration::from_secs(3)),
    );
    let client = client_for(&server.url, OllamaEndpoint::Generate);

    let err = client
        .invoke(&request(IntelligenceTier::Fast, Duration::from_millis(100)))
        .unwrap_err();

    assert_eq!(err, GenerationError::Timeout { after_ms: 100 });
}

#[test]
fn test_closed_port_is_unreachable() {
    let url = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let client = client_for(&url, OllamaEndpoint::Generate).with_retry(RetryPolicy::none());

    let err = client
        .invoke(&request(IntelligenceTier::Fast, Duration::from_secs(5)))
        .unwrap_err();

    assert!(matches!(err, GenerationError::Connect(_)));
    assert_eq!(err.reason(), "unreachable");
}

// =============================================================================
// End to End
// =============================================================================

#[test]
fn test_orchestrator_from_config() {
    let server = StubServer::start(Reply::ok(json!({ "response": LABELED })));
    let mut config = RedlineConfig::default();
    config.ollama.host = Some(server.url.clone());

    let orchestrator = SuggestionOrchestrator::from_config(&config).unwrap();
    let suggestion = orchestrator.suggest(&FlaggedIssue::new(
        "The report was written by the team.",
        "passive voice",
    ));

    assert_eq!(suggestion.method, SuggestionMethod::Generated);
    assert_eq!(suggestion.corrected_text, "The team wrote the report.");
    assert_eq!(suggestion.reasoning, "Active voice.");
    assert_eq!(server.requests().len(), 1);
}
