use std::path::Path;

use crate::{Config, EngineConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_tts()?;
        self.validate_rate_limit()?;
        self.validate_search()?;
        Ok(())
    }

    fn validate_tts(&self) -> anyhow::Result<()> {
        let tts = &self.tts;

        if tts.allowed_voices.is_empty() {
            anyhow::bail!("tts.allowed_voices must list at least one voice");
        }

        if !tts.allowed_voices.contains(&tts.default_voice) {
            anyhow::bail!(
                "tts.default_voice '{}' is not in tts.allowed_voices",
                tts.default_voice
            );
        }

        if tts.max_text_length == 0 {
            anyhow::bail!("tts.max_text_length must be greater than 0");
        }

        if tts.artifacts.max_age.is_zero() {
            anyhow::bail!("tts.artifacts.max_age must be greater than 0");
        }

        match &tts.engine {
            EngineConfig::Command(command) => {
                if command.program.trim().is_empty() {
                    anyhow::bail!("tts.engine.program must not be empty");
                }
                if !command.args.iter().any(|arg| arg.contains("{output}")) {
                    anyhow::bail!("tts.engine.args must contain an {{output}} placeholder");
                }
                if command.timeout.is_zero() {
                    anyhow::bail!("tts.engine.timeout must be greater than 0");
                }
            }
            EngineConfig::Http(http) => {
                if http.timeout.is_zero() {
                    anyhow::bail!("tts.engine.timeout must be greater than 0");
                }
            }
        }

        Ok(())
    }

    fn validate_rate_limit(&self) -> anyhow::Result<()> {
        let rate_limit = &self.server.rate_limit;

        if rate_limit.max_clients == 0 {
            anyhow::bail!("server.rate_limit.max_clients must be greater than 0");
        }

        if rate_limit.prune_interval.is_zero() {
            anyhow::bail!("server.rate_limit.prune_interval must be greater than 0");
        }

        if let Some(ref global) = rate_limit.global {
            if global.requests == 0 {
                anyhow::bail!("server.rate_limit.global.requests must be greater than 0");
            }
            if global.window.is_zero() {
                anyhow::bail!("server.rate_limit.global.window must be greater than 0");
            }
        }

        Ok(())
    }

    fn validate_search(&self) -> anyhow::Result<()> {
        let Some(ref search) = self.search else {
            return Ok(());
        };

        if search.max_limit == 0 || search.default_limit == 0 {
            anyhow::bail!("search limits must be greater than 0");
        }

        if search.default_limit > search.max_limit {
            anyhow::bail!("search.default_limit must not exceed search.max_limit");
        }

        Ok(())
    }
}
