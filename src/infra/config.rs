use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:4096";
pub const DEFAULT_OPENCODE_BIN: &str = "opencode";

const SERVER_URL_ENV: &str = "OPENCODE_RESUME_SERVER_URL";
const OPENCODE_BIN_ENV: &str = "OPENCODE_RESUME_BIN";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub server_url: Url,
    pub opencode_bin: String,
    pub request_timeout: Duration,
    pub startup_timeout: Duration,
    pub startup_poll_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server url {value:?}: {source}")]
    InvalidServerUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("server url must use http or https: {0}")]
    UnsupportedScheme(String),
}

impl Config {
    /// Defaults overridden by `OPENCODE_RESUME_SERVER_URL` and `OPENCODE_RESUME_BIN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = lookup(SERVER_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let opencode_bin = lookup(OPENCODE_BIN_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPENCODE_BIN.to_string());

        Ok(Self {
            server_url: parse_server_url(&server_url)?,
            opencode_bin,
            request_timeout: Duration::from_secs(10),
            startup_timeout: Duration::from_secs(5),
            startup_poll_interval: Duration::from_millis(200),
        })
    }

    pub fn with_server_url(mut self, server_url: Option<Url>) -> Self {
        if let Some(server_url) = server_url {
            self.server_url = server_url;
        }
        self
    }

    /// Port handed to `opencode serve` when the server has to be started.
    pub fn server_port(&self) -> Option<u16> {
        self.server_url.port_or_known_default()
    }
}

pub fn parse_server_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidServerUrl {
        value: value.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme(value.to_string())),
    }
}
