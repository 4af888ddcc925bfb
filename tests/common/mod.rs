// tests/common/mod.rs
//! Shared helpers: scripted inference backends and a one-shot Ollama stub.
#![allow(dead_code)]

use netconfig_gen::{CompletionRequest, InferenceBackend, InferenceError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub use netconfig_gen::inference::testing::ScriptedBackend;

pub fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/ollama")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing fixture {}: {}", path.display(), e))
}

/// The `response` field of a recorded `/api/generate` answer.
pub fn fixture_response(name: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(&fixture(name)).unwrap();
    value["response"].as_str().unwrap().to_string()
}

/// Answers from the prompt itself and records how many calls overlapped.
///
/// Classification replies carry the requirement as the only step; synthesis
/// replies name a device after that step.
#[derive(Default)]
pub struct EchoBackend {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl EchoBackend {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn last_line_after(prompt: &str, label: &str) -> String {
    prompt
        .lines()
        .filter_map(|l| l.strip_prefix(label))
        .last()
        .unwrap_or_default()
        .to_string()
}

#[async_trait::async_trait]
impl InferenceBackend for EchoBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.prompt.contains("Classify the requirement") {
            let requirement = last_line_after(&request.prompt, "User requirement: ");
            Ok(serde_json::json!({"type": "CP", "steps": [requirement]}).to_string())
        } else {
            Ok(format!(
                "~~~{}~~~\nshow running-config",
                last_line_after(&request.prompt, "1. ")
            ))
        }
    }
}

/// What the stub does with one accepted connection.
pub enum StubReply {
    Json { status: u16, body: String },
    /// Reads the request, then never answers.
    Silent,
}

impl StubReply {
    pub fn ok(body: String) -> Self {
        Self::Json { status: 200, body }
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// A local HTTP/1.1 server answering one connection per scripted reply.
pub struct StubOllama {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl StubOllama {
    pub async fn serve(replies: Vec<StubReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let log = captured.clone();

        tokio::spawn(async move {
            for reply in replies {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Ok(request) = read_request(&mut stream).await else {
                    return;
                };
                log.lock().unwrap().push(request);

                match reply {
                    StubReply::Json { status, body } => {
                        let response = format!(
                            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                    StubReply::Silent => {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                }
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = buf.len().min(header_end + content_length);
    Ok(CapturedRequest {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buf[header_end..body_end]).to_string(),
    })
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
