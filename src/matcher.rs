//! URI matching for handler types.
//!
//! Each handler type declares one [`UriMatcher`] for HTTP and one for
//! WebSocket. A matcher is a list of servlet-style patterns:
//!
//! - `/chat/room` - exact path
//! - `/chat/*` - the path `/chat` and everything below it
//! - `/*` or `/` - every path
//! - `*.json` - every path ending in `.json`
//!
//! Query strings and fragments are ignored. An empty URI matches nothing.
//!
//! # Example
//!
//! ```
//! use webactor_dispatch::matcher::UriMatcher;
//!
//! let matcher = UriMatcher::parse(&["/chat/*", "*.json"]).unwrap();
//! assert!(matcher.matches("/chat/lobby?user=7"));
//! assert!(matcher.matches("/api/state.json"));
//! assert!(!matcher.matches("/static/app.js"));
//! ```

use crate::error::{DispatchError, Result};
use crate::handler::HandlerType;

/// A single parsed URI pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriPattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches a path and everything below it. Empty prefix matches all paths.
    Prefix(String),
    /// Matches paths whose last segment ends with `.{ext}`.
    Extension(String),
}

impl UriPattern {
    /// Parse a servlet-style pattern.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason| DispatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        if let Some(ext) = pattern.strip_prefix("*.") {
            if ext.is_empty() || ext.contains(['/', '*']) {
                return Err(invalid("extension pattern must look like *.ext"));
            }
            return Ok(Self::Extension(ext.to_string()));
        }

        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with '/' or '*.'"));
        }

        if pattern == "/" {
            return Ok(Self::Prefix(String::new()));
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            if prefix.contains('*') {
                return Err(invalid("wildcard is only allowed as a trailing /*"));
            }
            return Ok(Self::Prefix(prefix.to_string()));
        }

        if pattern.contains('*') {
            return Err(invalid("wildcard is only allowed as a trailing /*"));
        }

        Ok(Self::Exact(pattern.to_string()))
    }

    /// Check a bare path (no query or fragment) against this pattern.
    pub fn matches_path(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) if p.is_empty() => true,
            Self::Prefix(p) => match path.strip_prefix(p.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
            Self::Extension(ext) => {
                let last = path.rsplit('/').next().unwrap_or(path);
                last.len() > ext.len() + 1
                    && last.ends_with(ext.as_str())
                    && last.as_bytes()[last.len() - ext.len() - 1] == b'.'
            }
        }
    }
}

/// Ordered set of patterns. Matches when any pattern matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriMatcher {
    patterns: Vec<UriPattern>,
}

impl UriMatcher {
    /// A matcher that never matches (protocol not served).
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a list of patterns. Fails on the first malformed one.
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| UriPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether no pattern is declared.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The parsed patterns, in declaration order.
    pub fn patterns(&self) -> &[UriPattern] {
        &self.patterns
    }

    /// Check a request URI (path with optional query/fragment).
    pub fn matches(&self, uri: &str) -> bool {
        let path = request_path(uri);
        if path.is_empty() {
            return false;
        }
        self.patterns.iter().any(|p| p.matches_path(path))
    }
}

/// Strip query and fragment from a request target.
fn request_path(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    &uri[..end]
}

/// Whether `handler_type` serves `uri` over HTTP.
pub fn matches_http(uri: &str, handler_type: &HandlerType) -> bool {
    handler_type.http().matches(uri)
}

/// Whether `handler_type` serves `uri` over WebSocket.
pub fn matches_websocket(uri: &str, handler_type: &HandlerType) -> bool {
    handler_type.websocket().matches(uri)
}
