// ── Core error types ──
//
// User-facing errors from tuyadash-core. Consumers never see reqwest
// errors or JSON parse failures directly. The `From<tuyadash_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device {device} has no switch {code}")]
    SwitchNotFound { device: String, code: String },

    #[error("Unexpected response from backend: {message}")]
    InvalidResponse { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Request cancelled")]
    Cancelled,
}

impl CoreError {
    /// Returns `true` if the operation was abandoned through cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tuyadash_api::Error> for CoreError {
    fn from(err: tuyadash_api::Error) -> Self {
        match err {
            tuyadash_api::Error::Cancelled => CoreError::Cancelled,
            tuyadash_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            tuyadash_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            tuyadash_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
            tuyadash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tuyadash_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("URL cannot be used as a backend base: {url}"),
            },
            tuyadash_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn cancellation_survives_conversion() {
        let err = CoreError::from(tuyadash_api::Error::Cancelled);
        assert!(err.is_cancelled());
    }

    #[test]
    fn http_errors_keep_status_text() {
        let err = CoreError::from(tuyadash_api::Error::Http {
            status: 500,
            body: String::new(),
        });
        assert_eq!(err.to_string(), "API error: HTTP 500");
    }
}
