//! Probe endpoints for the operator pod
//!
//! `/healthz` answers as long as the process runs. `/readyz` answers only
//! after the Kubernetes client is up and the controller has been started.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK";
const NOT_READY: &str = "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 9\r\n\r\nNOT READY";
const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nNOT FOUND";

/// Readiness shared between `main` and the probe server
#[derive(Debug, Default)]
pub struct HealthState {
    ready: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        info!("Operator marked ready");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Response for one request, chosen from its request line
fn respond(request: &str, state: &HealthState) -> &'static str {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    match path {
        "/healthz" | "/" => OK,
        "/readyz" if state.is_ready() => OK,
        "/readyz" => NOT_READY,
        _ => NOT_FOUND,
    }
}

/// Serve the probe endpoints until the listener fails
pub async fn run_health_server(addr: SocketAddr, state: Arc<HealthState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Health server listening");

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            let mut buf = [0; 1024];
            let Ok(n) = socket.read(&mut buf).await else {
                return;
            };
            let request = String::from_utf8_lossy(&buf[..n]);
            let response = respond(&request, &state);
            debug!(peer = %peer, status = &response[9..12], "Probe request");
            let _ = socket.write_all(response.as_bytes()).await;
        });
    }
}
