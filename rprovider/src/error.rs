//! Provider error kinds, helpers, and the quota-signature classifier.
//!
//! ```rust
//! use rprovider::{ProviderError, is_quota_signature};
//!
//! assert!(is_quota_signature("429 Too Many Requests"));
//! assert!(is_quota_signature("Resource QUOTA exhausted"));
//! assert!(!is_quota_signature("connection reset by peer"));
//!
//! let quota = ProviderError::classify("quota exceeded for project");
//! assert!(quota.is_quota());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    QuotaExceeded,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

/// Heuristic marker for upstream rate limiting. Upstreams do not expose a
/// structured quota error, so rotation decisions match on the error text:
/// a literal `429` or a case-insensitive `quota` substring.
pub fn is_quota_signature(text: &str) -> bool {
    text.contains("429") || text.to_ascii_lowercase().contains("quota")
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::QuotaExceeded, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    /// Builds an error from opaque upstream error text, promoting it to
    /// `QuotaExceeded` when the quota signature matches.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_quota_signature(&message) {
            Self::quota_exceeded(message)
        } else {
            Self::transport(message)
        }
    }

    pub fn is_quota(&self) -> bool {
        self.kind == ProviderErrorKind::QuotaExceeded || is_quota_signature(&self.message)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}
