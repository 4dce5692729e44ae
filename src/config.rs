// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Multi-tenant WebSocket gateway for interactive container shells.
#[derive(Debug, Parser, Clone)]
#[command(name = "shellgate", version, about)]
pub struct Config {
    /// Host address to bind to.
    #[arg(long, env = "SHELLGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port to listen on.
    #[arg(long, env = "SHELLGATE_PORT", default_value = "8080")]
    pub port: u16,

    /// Bearer token required on `/enter` and `/attach` upgrades, if set.
    #[arg(long, env = "SHELLGATE_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Root directory under which replay transcripts and timing files are
    /// written, one subdirectory per session.
    #[arg(long, env = "SHELLGATE_SESSION_DATA_ROOT", default_value = "/cloud/data/sessions")]
    pub session_data_root: PathBuf,

    /// This gateway's own reserved app name; sessions targeting it are
    /// rejected rather than opened, closing a self-attach loophole.
    #[arg(long, env = "SHELLGATE_OWN_APP_NAME", default_value = "entry")]
    pub own_app_name: String,

    /// Liveness ping interval, in seconds.
    #[arg(long, env = "SHELLGATE_PING_INTERVAL_SECS", default_value = "10")]
    pub ping_interval_secs: u64,

    /// Timeout for a feedback round-trip (tab completion / history recall),
    /// in milliseconds.
    #[arg(long, env = "SHELLGATE_FEEDBACK_TIMEOUT_MS", default_value = "100")]
    pub feedback_timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, env = "SHELLGATE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "SHELLGATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn ping_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ping_interval_secs)
    }

    pub fn feedback_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.feedback_timeout_ms)
    }
}

/// Initialize tracing/logging from config.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = if std::env::var("SHELLGATE_LOG_LEVEL").is_err() && config.log_level == "info" {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    } else {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
