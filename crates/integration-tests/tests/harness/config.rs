//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use vocalis_config::{
    Config, CorsConfig, EngineConfig, HealthConfig, HttpEngineConfig, HumanDuration, RequestRateLimit, ServerConfig,
};

/// Builder for constructing test configurations
///
/// Artifacts go to a fresh temporary directory owned by the builder's
/// caller through [`ConfigBuilder::build`].
pub struct ConfigBuilder {
    config: Config,
    artifacts: tempfile::TempDir,
}

impl ConfigBuilder {
    /// Minimal config whose HTTP engine points at `engine_endpoint`
    pub fn new(engine_endpoint: &str) -> Self {
        let artifacts = tempfile::tempdir().expect("temporary artifact directory");

        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                health: HealthConfig::default(),
                ..ServerConfig::default()
            },
            ..Config::default()
        };

        config.tts.artifacts.directory = artifacts.path().to_path_buf();
        config.tts.engine = EngineConfig::Http(HttpEngineConfig {
            endpoint: engine_endpoint.parse().expect("valid URL"),
            api_key: None,
            timeout: HumanDuration::from_secs(5),
        });

        Self { config, artifacts }
    }

    /// Minimum time between accepted requests of one client
    pub fn with_min_interval(mut self, interval: HumanDuration) -> Self {
        self.config.server.rate_limit.min_interval = interval;
        self
    }

    /// Budget shared by all clients
    pub fn with_global_limit(mut self, requests: u32, window: HumanDuration) -> Self {
        self.config.server.rate_limit.global = Some(RequestRateLimit { requests, window });
        self
    }

    /// Artifact age after which a sweep removes it
    pub fn with_max_age(mut self, max_age: HumanDuration) -> Self {
        self.config.tts.artifacts.max_age = max_age;
        self
    }

    /// Minimum time between full rescans of the artifact directory
    pub fn with_rescan_interval(mut self, interval: HumanDuration) -> Self {
        self.config.tts.artifacts.rescan_interval = interval;
        self
    }

    /// Number of trusted proxies in front of the server
    pub fn with_trusted_hops(mut self, hops: usize) -> Self {
        self.config.server.client_ip.trusted_hops = hops;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Enable search against a SearXNG instance at `base_url`
    pub fn with_search(mut self, base_url: &str) -> Self {
        let parsed = Config::from_toml(&format!("[search]\nbase_url = \"{base_url}\"")).expect("valid search section");
        self.config.search = parsed.search;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    ///
    /// The returned directory must outlive the server.
    pub fn build(self) -> (Config, ArtifactDir) {
        (self.config, ArtifactDir(self.artifacts))
    }
}

/// Temporary artifact directory of one test server
pub struct ArtifactDir(tempfile::TempDir);

impl ArtifactDir {
    pub fn path(&self) -> &Path {
        self.0.path()
    }

    /// Audio files currently on disk
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.path())
            .expect("artifact directory is readable")
            .map(|entry| entry.expect("directory entry").path())
            .collect();
        files.sort();
        files
    }
}
