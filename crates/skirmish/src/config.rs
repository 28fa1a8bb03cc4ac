//! Command-line and environment configuration for the server binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use skirmish_session::{DEFAULT_SEND_TIMEOUT, SessionConfig};
use skirmish_transport::DEFAULT_MAX_LINE_LEN;

/// Skirmish lobby server
#[derive(Parser, Clone, Debug)]
#[command(name = "skirmish", version, about = "Skirmish lobby server")]
pub struct Config {
    /// Host name or address to listen on
    #[arg(long, env = "SKIRMISH_HOST", default_value = "localhost")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short, env = "SKIRMISH_PORT", default_value_t = 5555)]
    pub port: u16,

    /// Path to the SQLite database (created if missing)
    #[arg(long, env = "SKIRMISH_DB", default_value = "data.db")]
    pub db: PathBuf,

    /// Longest accepted frame in bytes
    #[arg(long, env = "SKIRMISH_MAX_LINE", default_value_t = DEFAULT_MAX_LINE_LEN)]
    pub max_line: usize,

    /// Close connections idle for this many seconds (0 = never)
    #[arg(long, env = "SKIRMISH_IDLE_TIMEOUT", default_value_t = 0)]
    pub idle_timeout: u64,

    /// Refuse connections beyond this many (0 = unlimited)
    #[arg(long, env = "SKIRMISH_MAX_CONNECTIONS", default_value_t = 0)]
    pub max_connections: usize,

    /// Give up on a broadcast send after this many seconds
    #[arg(long, env = "SKIRMISH_SEND_TIMEOUT", default_value_t = DEFAULT_SEND_TIMEOUT.as_secs())]
    pub send_timeout: u64,

    /// Enable structured JSON logging
    #[arg(long, env = "SKIRMISH_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// `host:port` as passed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_line_len: self.max_line,
            idle_timeout: (self.idle_timeout > 0).then(|| Duration::from_secs(self.idle_timeout)),
            max_connections: (self.max_connections > 0).then_some(self.max_connections),
            send_timeout: Duration::from_secs(self.send_timeout.max(1)),
        }
    }
}
