//! Server configuration
//!
//! Command line flags with environment variable fallbacks.

use std::time::Duration;

use clap::Parser;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default per-session outbound queue length
pub const DEFAULT_OUTBOUND_BUFFER: usize = 32;

/// Default bound on a single socket write, in seconds
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the listener to
    #[arg(long, env = "CHAT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to accept chat connections on
    #[arg(long, short, env = "CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Lines queued per client before further lines to it are dropped
    #[arg(long, env = "CHAT_OUTBOUND_BUFFER", default_value_t = DEFAULT_OUTBOUND_BUFFER)]
    pub outbound_buffer: usize,

    /// Seconds a single write to a client may take before it is disconnected
    #[arg(long, env = "CHAT_WRITE_TIMEOUT_SECS", default_value_t = DEFAULT_WRITE_TIMEOUT_SECS)]
    pub write_timeout_secs: u64,
}

impl Config {
    /// `host:port` string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-connection settings derived from this configuration
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            outbound_buffer: self.outbound_buffer.max(1),
            write_timeout: Duration::from_secs(self.write_timeout_secs.max(1)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
        }
    }
}

/// Limits applied to every connection
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Capacity of the outbound queue
    pub outbound_buffer: usize,
    /// Bound on one socket write
    pub write_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Config::default().session_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["line_chat_relay"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_port_flag() {
        let config = Config::try_parse_from(["line_chat_relay", "--port", "9000"]).unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_session_settings() {
        let config = Config {
            outbound_buffer: 0,
            write_timeout_secs: 3,
            ..Config::default()
        };
        let settings = config.session_settings();
        assert_eq!(settings.outbound_buffer, 1);
        assert_eq!(settings.write_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_write_timeout_clamped() {
        let config =
            Config::try_parse_from(["line_chat_relay", "--write-timeout-secs", "0"]).unwrap();
        assert_eq!(config.session_settings().write_timeout, Duration::from_secs(1));
    }
}
