//! Request/response exchange logging
//!
//! Set the `AGENTLINE_LOG_FILE` environment variable to append every
//! exchange with the remote service to a file, one JSON object per line.
//!
//! Example: `AGENTLINE_LOG_FILE=/tmp/agentline.jsonl agentline`

use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use super::TurnRequest;

/// Environment variable naming the exchange log file
pub const LOG_FILE_ENV: &str = "AGENTLINE_LOG_FILE";

/// One exchange with the remote service
pub struct ExchangeLog<'a> {
    pub endpoint: &'a str,
    pub request: &'a TurnRequest,
    /// HTTP status, if a response arrived
    pub status: Option<u16>,
    /// Decoded response body on success
    pub body: Option<&'a serde_json::Value>,
    /// Error message if the exchange failed
    pub error: Option<&'a str>,
}

impl ExchangeLog<'_> {
    fn to_json(&self) -> serde_json::Value {
        json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "endpoint": self.endpoint,
            "request": self.request,
            "status": self.status,
            "response": self.body,
            "error": self.error,
        })
    }
}

/// Log an exchange to file if `AGENTLINE_LOG_FILE` is set
pub fn log_exchange(entry: ExchangeLog<'_>) {
    if let Ok(path) = std::env::var(LOG_FILE_ENV) {
        log_exchange_to(Path::new(&path), &entry);
    }
}

/// Append an exchange to the given file. Failures are logged, not returned.
pub fn log_exchange_to(path: &Path, entry: &ExchangeLog<'_>) {
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(mut file) => {
            let line = serde_json::to_string(&entry.to_json()).unwrap_or_default();
            if let Err(e) = writeln!(file, "{}", line) {
                warn!("Failed to write to exchange log {}: {}", path.display(), e);
                return;
            }
            debug!("Logged exchange to {}", path.display());
        }
        Err(e) => {
            warn!("Failed to open exchange log {}: {}", path.display(), e);
        }
    }
}
