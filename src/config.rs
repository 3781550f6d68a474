//! Dispatch configuration.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```json
//! {
//!     "session_cookie_name": "APPSESSION",
//!     "resource_dir": "./actors",
//!     "handler_params": { "chat": ["lobby", 50] }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DispatchError, Result};
use crate::handler::DEFAULT_MAILBOX_CAPACITY;
use crate::session::DEFAULT_SESSION_COOKIE;

/// Default marker line for directory scans.
pub const DEFAULT_MARKER: &str = "#[web_actor]";

/// Default unit file extension for directory scans.
pub const DEFAULT_UNIT_EXTENSION: &str = "actor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Cookie carrying the session id.
    pub session_cookie_name: String,
    /// When false, every request gets a fresh, unstored context.
    pub sessions_enabled: bool,
    /// Response encoder override, passed through to the pipeline untouched.
    pub response_encoder: Option<String>,
    /// Scan this directory for handler units instead of using registrations.
    pub resource_dir: Option<PathBuf>,
    /// Extension of unit files in `resource_dir`.
    pub unit_extension: String,
    /// Marker line identifying a handler unit.
    pub marker: String,
    /// Mailbox capacity for spawned handlers.
    pub mailbox_capacity: usize,
    /// Constructor parameters per handler type name. Missing means none.
    pub handler_params: HashMap<String, Vec<Value>>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            sessions_enabled: true,
            response_encoder: None,
            resource_dir: None,
            unit_extension: DEFAULT_UNIT_EXTENSION.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            handler_params: HashMap::new(),
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Constructor parameters for `handler`, empty when not configured.
    pub fn params_for(&self, handler: &str) -> &[Value] {
        self.handler_params
            .get(handler)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<()> {
        if !is_cookie_token(&self.session_cookie_name) {
            return Err(DispatchError::Config(format!(
                "invalid session cookie name {:?}",
                self.session_cookie_name
            )));
        }
        if self.mailbox_capacity == 0 {
            return Err(DispatchError::Config(
                "mailbox_capacity must be at least 1".into(),
            ));
        }
        if self.unit_extension.is_empty() || self.unit_extension.starts_with('.') {
            return Err(DispatchError::Config(format!(
                "unit_extension must be a bare extension, got {:?}",
                self.unit_extension
            )));
        }
        if self.marker.trim().is_empty() {
            return Err(DispatchError::Config("marker must not be blank".into()));
        }
        Ok(())
    }
}

/// RFC 6265 cookie-name token.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.session_cookie_name, "SESSIONID");
        assert!(config.sessions_enabled);
        assert_eq!(config.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DispatchConfig::from_json_str(
            r#"{ "sessions_enabled": false, "handler_params": { "chat": ["lobby", 50] } }"#,
        )
        .unwrap();

        assert!(!config.sessions_enabled);
        assert_eq!(config.session_cookie_name, "SESSIONID");
        assert_eq!(config.params_for("chat"), &[Value::from("lobby"), Value::from(50)]);
        assert!(config.params_for("other").is_empty());
    }

    #[test]
    fn test_rejects_bad_cookie_name() {
        for name in ["", "has space", "semi;colon", "eq=ual"] {
            let config = DispatchConfig {
                session_cookie_name: name.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(DispatchError::Config(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_zero_mailbox() {
        let result = DispatchConfig::from_json_str(r#"{ "mailbox_capacity": 0 }"#);
        assert!(matches!(result, Err(DispatchError::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = DispatchConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(DispatchError::Json(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");
        std::fs::write(&path, r#"{ "response_encoder": "gzip", "resource_dir": "/srv/actors" }"#)
            .unwrap();

        let config = DispatchConfig::from_file(&path).unwrap();
        assert_eq!(config.response_encoder.as_deref(), Some("gzip"));
        assert_eq!(config.resource_dir, Some(PathBuf::from("/srv/actors")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DispatchConfig::from_file("/nonexistent/dispatch.json");
        assert!(matches!(result, Err(DispatchError::Io(_))));
    }
}
