use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default SCPI port of the controller
pub const DEFAULT_PORT: u16 = 5025;
/// Receive timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);
/// Minimum spacing between dependent transactions
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// F4TCom configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct F4tConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Known controllers
    #[serde(default)]
    pub controllers: Vec<ControllerConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Receive timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// Settling time the device needs between dependent commands
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Surface timed-out partial responses as errors
    #[serde(default)]
    pub strict_framing: bool,
    /// Query `*IDN?` when a session is opened
    #[serde(default = "default_identify_on_connect")]
    pub identify_on_connect: bool,
}

/// A named controller entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller name
    pub name: String,
    /// Controller description
    #[serde(default)]
    pub description: String,
    /// IPv4 address
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Overrides the global timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_settle_delay() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_identify_on_connect() -> bool {
    true
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timeout_ms: default_timeout(),
            settle_delay_ms: default_settle_delay(),
            strict_framing: false,
            identify_on_connect: default_identify_on_connect(),
        }
    }
}

impl F4tConfig {
    /// Look up a controller entry by name
    pub fn find_controller(&self, name: &str) -> Option<&ControllerConfig> {
        self.controllers.iter().find(|c| c.name == name)
    }
}

/// Socket parameters for one controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Bounds the handshake and every receive
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// How a receive that times out before the terminator is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramingMode {
    /// Return whatever arrived as if it were complete
    #[default]
    Lenient,
    /// Fail with `F4tError::Timeout`
    Strict,
}

/// Runtime configuration of a device session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connection: ConnectionConfig,
    pub settle_delay: Duration,
    pub framing: FramingMode,
    pub identify_on_connect: bool,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_connection(ConnectionConfig::new(host))
    }

    pub fn from_connection(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            settle_delay: DEFAULT_SETTLE_DELAY,
            framing: FramingMode::Lenient,
            identify_on_connect: true,
        }
    }

    /// Build from a controller entry, filling gaps from the global section
    pub fn from_controller(controller: &ControllerConfig, global: &GlobalConfig) -> Self {
        let timeout_ms = controller.timeout_ms.unwrap_or(global.timeout_ms);
        let connection = ConnectionConfig::new(controller.host.clone())
            .with_port(controller.port)
            .with_timeout(Duration::from_millis(timeout_ms));
        Self::from_connection(connection).apply_global(global)
    }

    /// Apply the session-level settings of the global section
    pub fn apply_global(mut self, global: &GlobalConfig) -> Self {
        self.settle_delay = Duration::from_millis(global.settle_delay_ms);
        self.framing = if global.strict_framing {
            FramingMode::Strict
        } else {
            FramingMode::Lenient
        };
        self.identify_on_connect = global.identify_on_connect;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_identify_on_connect(mut self, identify: bool) -> Self {
        self.identify_on_connect = identify;
        self
    }
}
