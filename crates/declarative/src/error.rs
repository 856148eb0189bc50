//! Error types for reconciliation.
//!
//! Every remote failure is classified into one [`Error`] variant. Categories
//! tell the host what kind of feedback to give; nothing in this crate retries.

use crate::types::SpaceState;
use std::fmt;

/// Result type alias for remote and planning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request never completed (DNS, TLS, connection reset).
    Transport,
    /// Token missing, invalid, or lacking permission.
    Auth,
    /// The space (or a key on it) does not exist remotely.
    NotFound,
    /// The remote state conflicts with the request (name taken, etc.).
    Conflict,
    /// Any other non-success status.
    Rejected,
    /// Response body did not have the expected shape.
    Decode,
    /// Invalid desired spec, plan or identity.
    Input,
}

impl ErrorCategory {
    /// Whether a later attempt with the same input may succeed.
    ///
    /// Informational only: the executor never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the remote API",
            Self::Auth => "Authentication or permission failure",
            Self::NotFound => "Space not found",
            Self::Conflict => "Conflicts with existing remote state",
            Self::Rejected => "Request rejected by the remote API",
            Self::Decode => "Unexpected response from the remote API",
            Self::Input => "Invalid configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check your network connection and run apply again",
            Self::Auth => "Check that HF_TOKEN is set and has write access to the namespace",
            Self::NotFound => "The space may have been deleted outside of hfspaces; remove it from state",
            Self::Conflict => "Pick another name or import the existing space",
            Self::Rejected => "Check the error details; the tier or value may not be allowed",
            Self::Decode => "The API may have changed; run with -vv for details",
            Self::Input => "Fix the configuration file and try again",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors raised by a remote client or by the planner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The RPC could not be completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered with a non-success status.
    #[error("remote rejected request (HTTP {status}): {message}")]
    RemoteRejected {
        /// HTTP status code.
        status: u16,
        /// Message or body excerpt returned by the remote.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The desired spec or plan is structurally invalid.
    #[error("inconsistent plan: {0}")]
    PlanInconsistency(String),

    /// A space identity is not of the form `owner/name`.
    #[error("invalid space id '{0}': expected owner/name")]
    InvalidId(String),
}

impl Error {
    /// Create a remote rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, for remote rejections.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::RemoteRejected { status, .. } => match status {
                401 | 403 => ErrorCategory::Auth,
                404 => ErrorCategory::NotFound,
                409 => ErrorCategory::Conflict,
                _ => ErrorCategory::Rejected,
            },
            Self::Decode(_) => ErrorCategory::Decode,
            Self::PlanInconsistency(_) | Self::InvalidId(_) => ErrorCategory::Input,
        }
    }

    /// Whether this error is typically transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteRejected { status, .. } => *status == 429 || *status >= 500,
            other => other.category().is_retryable(),
        }
    }
}

/// Kind of a mutation step, used to report which step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Create,
    Rename,
    SetVisibility,
    SetHardware,
    SetStorage,
    SetSleepTime,
    RemoveSecret,
    AddSecret,
    RemoveVariable,
    AddVariable,
    Delete,
    /// Listing remote keys before an update
    Refresh,
    Invalid,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Rename => "rename",
            Self::SetVisibility => "set visibility",
            Self::SetHardware => "set hardware",
            Self::SetStorage => "set storage",
            Self::SetSleepTime => "set sleep time",
            Self::RemoveSecret => "remove secret",
            Self::AddSecret => "add secret",
            Self::RemoveVariable => "remove variable",
            Self::AddVariable => "add variable",
            Self::Delete => "delete",
            Self::Refresh => "refresh keys",
            Self::Invalid => "validate",
        };
        f.write_str(name)
    }
}

/// A failed [`apply`](crate::executor::apply) call.
///
/// Carries the snapshot as it stood when the failing step was attempted:
/// every earlier step is reflected, the failing one and everything after it
/// are not.
#[derive(Debug, thiserror::Error)]
#[error("{step}{} failed: {source}", quoted_key(.key.as_deref()))]
pub struct ApplyError {
    /// Kind of the step that failed.
    pub step: StepKind,
    /// Collection key the failing step addressed, if any.
    pub key: Option<String>,
    /// The underlying classified error.
    #[source]
    pub source: Error,
    partial_create: bool,
    state: Box<SpaceState>,
}

fn quoted_key(key: Option<&str>) -> String {
    key.map(|k| format!(" '{k}'")).unwrap_or_default()
}

impl ApplyError {
    pub(crate) fn new(step: StepKind, key: Option<String>, source: Error, state: SpaceState) -> Self {
        Self {
            step,
            key,
            partial_create: false,
            source,
            state: Box::new(state),
        }
    }

    /// Mark as a failure that happened after the create call succeeded.
    pub(crate) fn into_partial_create(mut self) -> Self {
        self.partial_create = true;
        self
    }

    /// Whether the space exists remotely but its create did not complete.
    ///
    /// The snapshot already holds the assigned identity; the next pass must
    /// go through update, not a second create.
    #[must_use]
    pub fn is_partial_create(&self) -> bool {
        self.partial_create
    }

    /// The partially updated snapshot.
    #[must_use]
    pub fn state(&self) -> &SpaceState {
        &self.state
    }

    /// Consume the error, keeping the partially updated snapshot.
    #[must_use]
    pub fn into_state(self) -> SpaceState {
        *self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Transport.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Decode.is_retryable());
        assert!(!ErrorCategory::Input.is_retryable());
    }

    #[test]
    fn test_rejected_category_by_status() {
        assert_eq!(Error::rejected(401, "").category(), ErrorCategory::Auth);
        assert_eq!(Error::rejected(403, "").category(), ErrorCategory::Auth);
        assert_eq!(Error::rejected(404, "").category(), ErrorCategory::NotFound);
        assert_eq!(Error::rejected(409, "").category(), ErrorCategory::Conflict);
        assert_eq!(Error::rejected(422, "").category(), ErrorCategory::Rejected);
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(Error::rejected(503, "unavailable").is_retryable());
        assert!(Error::rejected(429, "slow down").is_retryable());
        assert!(!Error::rejected(400, "bad tier").is_retryable());
        assert!(Error::Transport("reset".into()).is_retryable());
    }

    #[test]
    fn test_input_errors() {
        assert_eq!(
            Error::PlanInconsistency("empty name".into()).category(),
            ErrorCategory::Input
        );
        assert_eq!(Error::InvalidId("x".into()).category(), ErrorCategory::Input);
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(Error::rejected(409, "taken").status(), Some(409));
        assert_eq!(Error::Decode("eof".into()).status(), None);
    }

    #[test]
    fn test_apply_error_display_includes_key() {
        let err = ApplyError::new(
            StepKind::AddSecret,
            Some("API_KEY".into()),
            Error::rejected(500, "boom"),
            SpaceState::default(),
        );
        let display = err.to_string();
        assert!(display.contains("add secret 'API_KEY' failed"));
        assert!(display.contains("HTTP 500"));
        assert!(!err.is_partial_create());
    }

    #[test]
    fn test_apply_error_display_without_key() {
        let err = ApplyError::new(
            StepKind::SetStorage,
            None,
            Error::Transport("connection reset".into()),
            SpaceState::default(),
        );
        assert_eq!(
            err.to_string(),
            format!("set storage failed: {}", Error::Transport("connection reset".into()))
        );
    }

    #[test]
    fn test_apply_error_source_is_classified_error() {
        use std::error::Error as _;

        let err = ApplyError::new(
            StepKind::Rename,
            None,
            Error::rejected(409, "taken"),
            SpaceState::default(),
        );
        let source = err.source().and_then(|s| s.downcast_ref::<Error>());
        assert_eq!(source, Some(&Error::rejected(409, "taken")));
    }

    #[test]
    fn test_apply_error_partial_create() {
        let err = ApplyError::new(
            StepKind::AddVariable,
            Some("MODE".into()),
            Error::Transport("reset".into()),
            SpaceState::default(),
        )
        .into_partial_create();
        assert!(err.is_partial_create());
        assert_eq!(err.step.to_string(), "add variable");
    }
}
