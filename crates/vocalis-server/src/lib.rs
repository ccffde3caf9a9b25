mod client_id;
mod cors;
mod health;
mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use vocalis_config::Config;
use vocalis_ratelimit::RequestLimiter;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    limiter: Arc<RequestLimiter>,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the limiter, the TTS gateway or the search
    /// service cannot be initialized
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();

        let limiter = Arc::new(vocalis_ratelimit::create_request_limiter(&config.server.rate_limit)?);

        let tts_state = tts::build_server(config, Arc::clone(&limiter))?;

        // Build base router with feature routes
        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // TTS routes
        app = app.merge(tts::endpoint_router().with_state(tts_state));

        // Search routes
        if let Some(ref search_config) = config.search {
            let search_state = vocalis_search::build_server(search_config, Arc::clone(&limiter))?;
            app = app.merge(vocalis_search::endpoint_router().with_state(search_state));
        }

        // Apply middleware layers (innermost first)

        // Client identification
        let client_ip = config.server.client_ip.clone();
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let config = client_ip.clone();
            async move { client_id::client_id_middleware(config, req, next).await }
        }));

        // Global rate limit
        if config.server.rate_limit.global.is_some() {
            let global = Arc::clone(&limiter);
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let limiter = Arc::clone(&global);
                async move { rate_limit::rate_limit_middleware(limiter, req, next).await }
            }));
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
            limiter,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Requests served through it carry no peer address unless the caller
    /// adds `ConnectInfo`.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind the configured address and serve until `shutdown` fires
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.listen_address).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires
    ///
    /// Also runs the throttle pruning task, which stops with the server.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails
    pub async fn serve_on(self, listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let pruner_shutdown = shutdown.child_token();
        let pruner = self.limiter.spawn_pruner(pruner_shutdown.clone());

        let result = axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await;

        pruner_shutdown.cancel();
        if let Err(e) = pruner.await {
            tracing::warn!("throttle pruner ended abnormally: {e}");
        }

        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn config(toml: &str, dir: &std::path::Path) -> Config {
        let mut config = Config::from_toml(toml).unwrap();
        config.tts.artifacts.directory = dir.join("audio");
        config
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let dir = tempfile::tempdir().unwrap();
        let router = Server::new(&config("", dir.path())).unwrap().into_router();

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn health_path_is_configurable_and_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();

        let router = Server::new(&config("[server.health]\npath = \"/livez\"", dir.path()))
            .unwrap()
            .into_router();
        let response = router
            .oneshot(Request::get("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let router = Server::new(&config("[server.health]\nenabled = false", dir.path()))
            .unwrap()
            .into_router();
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn global_budget_rejects_excess_requests() {
        let dir = tempfile::tempdir().unwrap();
        let toml = "[server.rate_limit]\nglobal = { requests = 1, window = \"1m\" }";
        let router = Server::new(&config(toml, dir.path())).unwrap().into_router();

        let first = router
            .clone()
            .oneshot(Request::get("/voices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router
            .oneshot(Request::get("/voices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(http::header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let dir = tempfile::tempdir().unwrap();
        let router = Server::new(&config("[server.cors]\norigins = \"*\"", dir.path()))
            .unwrap()
            .into_router();

        let response = router
            .oneshot(
                Request::options("/tts")
                    .header(http::header::ORIGIN, "https://app.example")
                    .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn cors_allows_any_origin_without_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let router = Server::new(&config("", dir.path())).unwrap().into_router();

        let response = router
            .oneshot(
                Request::get("/voices")
                    .header(http::header::ORIGIN, "https://app.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
