//! Test server wrapper that starts Vocalis on a random port

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use vocalis_config::Config;
use vocalis_server::Server;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment. Requests reach the
    /// server from 127.0.0.1, so they all share one throttle slot unless
    /// the config trusts `X-Forwarded-For`.
    pub async fn start(config: &Config) -> anyhow::Result<Self> {
        let server = Server::new(config)?;
        let shutdown = CancellationToken::new();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            server.serve_on(listener, shutdown_clone).await.ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET path` as the client at `ip` (needs a trusted hop)
    pub async fn get_as(&self, ip: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("x-forwarded-for", ip)
            .send()
            .await
            .expect("request reaches the server")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
