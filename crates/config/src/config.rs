//! Configuration loading from environment variables.

use crate::error::{ConfigError, ConfigResult};
use tracing::debug;

/// Environment variable naming the upstream network (e.g. `mainnet`).
pub const NETWORK_VAR: &str = "NETWORK";
/// Environment variable holding the Infura project id.
pub const INFURA_PROJECT_ID_VAR: &str = "INFURA_PROJECT_ID";
/// Environment variable for the local listen host.
pub const HOST_VAR: &str = "HOST";
/// Environment variable for the local listen port.
pub const PORT_VAR: &str = "PORT";
/// Environment variable for the log level.
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    network: String,
    infura_project_id: String,
    host: String,
    port: u16,
    log_level: String,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let network = get(NETWORK_VAR).ok_or(ConfigError::MissingVar(NETWORK_VAR))?;
        let infura_project_id =
            get(INFURA_PROJECT_ID_VAR).ok_or(ConfigError::MissingVar(INFURA_PROJECT_ID_VAR))?;

        let host = get(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get(PORT_VAR) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let log_level = match get(LOG_LEVEL_VAR) {
            Some(raw) => {
                let level = raw.to_ascii_lowercase();
                if !VALID_LOG_LEVELS.contains(&level.as_str()) {
                    return Err(ConfigError::InvalidLogLevel(raw));
                }
                level
            }
            None => DEFAULT_LOG_LEVEL.to_string(),
        };

        let config = Self {
            network,
            infura_project_id,
            host,
            port,
            log_level,
        };
        debug!(network = %config.network, addr = %config.listen_addr(), "configuration loaded");
        Ok(config)
    }

    /// Returns the upstream network identifier.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns the derived upstream node URL.
    pub fn upstream_url(&self) -> String {
        format!(
            "https://{}.infura.io/v3/{}",
            self.network, self.infura_project_id
        )
    }

    /// Returns the local `host:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the configured log level (lowercase).
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}
