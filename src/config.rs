//! Configuration for cinnabar
//!
//! Centralized client configuration with sensible defaults.

/// Main configuration for a cinnabar client
///
/// Immutable once the client has been constructed.
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Server hostname or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Optional password; when set, an AUTH exchange runs immediately
    /// after every (re)connect
    pub password: Option<String>,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// Send timeout in milliseconds (0 = no timeout, sends may block
    /// indefinitely)
    pub send_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Reserved Configuration
    // -------------------------------------------------------------------------
    /// Reserved retry attempt count. Recognized but never consulted: the
    /// client performs exactly one connect attempt per call and no retries.
    pub retry_count: u32,

    /// Reserved delay between retries, in milliseconds. Never consulted,
    /// see `retry_count`.
    pub retry_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            send_timeout_ms: 0,
            retry_count: 0,
            retry_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The `host:port` address string for this endpoint
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server hostname
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the authentication password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the send timeout (in milliseconds, 0 = no timeout)
    pub fn send_timeout_ms(mut self, ms: u64) -> Self {
        self.config.send_timeout_ms = ms;
        self
    }

    /// Set the reserved retry count
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    /// Set the reserved retry timeout (in milliseconds)
    pub fn retry_timeout_ms(mut self, ms: u64) -> Self {
        self.config.retry_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
