//! Server configuration from TOML (`[server]` section)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// HTTP boundary and log output settings.
///
/// # Example
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8080"
/// audit_log = "/var/log/vibecation/audit.jsonl"
/// log_dir = "/var/log/vibecation"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Listen address of the HTTP/WebSocket server
    pub bind: String,
    /// JSONL audit log path; auditing is off when unset
    pub audit_log: Option<PathBuf>,
    /// Directory for daily-rotated diagnostic logs
    pub log_dir: Option<PathBuf>,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            audit_log: None,
            log_dir: None,
        }
    }
}

impl FileServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind.parse()
    }
}
