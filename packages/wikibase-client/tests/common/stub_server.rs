//! Scripted HTTP endpoint standing in for a Wikibase `api.php`.
//!
//! Answers connections one at a time with queued responses, in order, and
//! records the method, query string and form body of every request.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wikibase_client::WikibaseOptions;

#[derive(Debug, Clone)]
pub struct StubResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl StubResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// The three answers `WikibaseClient::login` expects.
pub fn login_responses(csrf_token: &str) -> Vec<StubResponse> {
    vec![
        StubResponse::json(serde_json::json!({
            "batchcomplete": "",
            "query": {"tokens": {"logintoken": "login-token+\\"}}
        })),
        StubResponse::json(serde_json::json!({
            "login": {"result": "Success", "lguserid": 42, "lgusername": "Bot"}
        })),
        StubResponse::json(serde_json::json!({
            "batchcomplete": "",
            "query": {"tokens": {"csrftoken": csrf_token}}
        })),
    ]
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
}

impl RecordedRequest {
    /// Value of `name` from the form body, falling back to the query string.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.form
            .get(name)
            .or_else(|| self.query.get(name))
            .map(String::as_str)
    }

    /// A form field holding JSON, parsed.
    pub fn json_param(&self, name: &str) -> Value {
        let raw = self
            .param(name)
            .unwrap_or_else(|| panic!("request has no {} parameter", name));
        serde_json::from_str(raw).unwrap_or_else(|e| panic!("{} is not JSON: {}", name, e))
    }
}

pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            let mut queue: VecDeque<StubResponse> = responses.into();
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                handle(stream, &mut queue, &recorded).await;
            }
        });

        Self { addr, requests }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/w/api.php", self.addr)
    }

    /// Client options pointed at this server, without write throttling.
    pub fn options(&self) -> WikibaseOptions {
        WikibaseOptions {
            api_url: self.api_url(),
            edit_interval: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve a single request. `None` if the connection broke mid-exchange.
async fn handle(
    mut stream: TcpStream,
    queue: &mut VecDeque<StubResponse>,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> Option<()> {
    let request = read_request(&mut stream).await?;
    recorded.lock().unwrap().push(request);

    let response = queue
        .pop_front()
        .unwrap_or_else(|| StubResponse::status(500, "no response queued"));
    let mut head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await.ok()?;
    stream.write_all(response.body.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()?;
    Some(())
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let body = &buf[header_end..buf.len().min(header_end + content_length)];

    Some(RecordedRequest {
        method,
        path: path.to_string(),
        query: decode(query.as_bytes()),
        form: decode(body),
    })
}

fn decode(input: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(input).into_owned().collect()
}
