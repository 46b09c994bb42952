//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use render_edge::config::{ServerConfig, UpstreamConfig};
use render_edge::lifecycle::{self, Shutdown};
use render_edge::FragmentApp;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const INDEX_HTML: &str =
    "<!doctype html><html><head><title>app</title></head><body><div id=\"root\"></div></body></html>";
pub const APP_JS: &str = "console.log(\"bundle\");";

/// What the mock upstream sends back.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            headers: Vec::new(),
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(mut self, status: &'static str) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A raw TCP HTTP/1.1 upstream on an ephemeral port.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request heads received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock upstream answering every request with `reply(head)`.
pub async fn start_mock_upstream<F>(reply: F) -> MockUpstream
where
    F: Fn(&str) -> MockReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let reply = Arc::new(reply);

    let seen = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let seen = seen.clone();
            let reply = reply.clone();
            tokio::spawn(async move {
                let _ = serve_one(socket, seen, reply).await;
            });
        }
    });

    MockUpstream { addr, requests }
}

async fn serve_one<F>(
    mut socket: TcpStream,
    seen: Arc<Mutex<Vec<String>>>,
    reply: Arc<F>,
) -> std::io::Result<()>
where
    F: Fn(&str) -> MockReply + Send + Sync + 'static,
{
    let head = read_head(&mut socket).await?;
    seen.lock().unwrap().push(head.clone());

    let reply = reply(&head);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(&reply.body);

    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

/// Read the request head and discard a `Content-Length` body.
async fn read_head(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut remaining = content_length.saturating_sub(buf.len() - head_end);
    while remaining > 0 {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        remaining = remaining.saturating_sub(n);
    }

    Ok(head)
}

/// Upstream that sends a response head and part of the body, then goes silent.
pub async fn start_stalling_upstream(stall: Duration) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                if let Ok(head) = read_head(&mut socket).await {
                    seen.lock().unwrap().push(head);
                }
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                    .await;
                tokio::time::sleep(stall).await;
            });
        }
    });

    MockUpstream { addr, requests }
}

/// Port that refuses connections.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Document root with `index.html`, `app.js` and `assets/logo.txt`.
pub fn bundle() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(root.path().join("app.js"), APP_JS).unwrap();
    std::fs::create_dir(root.path().join("assets")).unwrap();
    std::fs::write(root.path().join("assets/logo.txt"), "logo").unwrap();
    root
}

/// Base configuration for a test edge listening on an ephemeral port.
pub fn edge_config(root: &TempDir) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.site.document_root = root.path().to_string_lossy().into_owned();
    config
}

pub fn with_upstream(mut config: ServerConfig, base_url: String) -> ServerConfig {
    config.upstream = UpstreamConfig::WithUpstream {
        base_url,
        path_prefix: "/api".into(),
    };
    config
}

/// A running edge server; stops when dropped.
pub struct TestEdge {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    _root: TempDir,
}

impl TestEdge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestEdge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_edge(config: ServerConfig, root: TempDir, app: FragmentApp) -> TestEdge {
    let edge = lifecycle::bind(&config, app).await.unwrap();
    let addr = edge.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = edge.serve(signal).await;
    });

    TestEdge {
        addr,
        shutdown,
        _root: root,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
