// Error handling module
// Defines the terminal error kinds and how they map onto process exit codes

use thiserror::Error;

/// Exit status used when a token could not be acquired
pub const AUTH_FAILURE_EXIT_CODE: i32 = 2;

/// Exit status used when an authenticated query failed
pub const QUERY_FAILURE_EXIT_CODE: i32 = 3;

/// Which side of the client a fatal error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Token endpoint (acquisition or renewal)
    Auth,
    /// Target API query
    Query,
}

/// Errors that end the process
///
/// There is no local recovery for any of these: the supervisor in `main`
/// logs them and exits with [`FatalError::exit_code`].
#[derive(Error, Debug)]
pub enum FatalError {
    /// Token endpoint answered outside 200-299
    #[error("Token request failed: received non-2xx response {status}")]
    AuthRejected { status: u16, body: String },

    /// Token request never produced a response
    #[error("Token request failed: {0}")]
    AuthTransport(#[source] reqwest::Error),

    /// Token endpoint answered 2xx but the body lacked a usable token
    #[error("Token response malformed: {0}")]
    AuthMalformed(String),

    /// Target API answered outside 200-299
    #[error("Query failed: received non-2xx response {status}")]
    QueryRejected { status: u16, body: String },

    /// Query never produced a response
    #[error("Query failed: {0}")]
    QueryTransport(#[source] reqwest::Error),
}

impl FatalError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FatalError::AuthRejected { .. }
            | FatalError::AuthTransport(_)
            | FatalError::AuthMalformed(_) => FailureKind::Auth,
            FatalError::QueryRejected { .. } | FatalError::QueryTransport(_) => FailureKind::Query,
        }
    }

    /// HTTP status, when the remote side answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FatalError::AuthRejected { status, .. } | FatalError::QueryRejected { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Error response body, when one was returned and it was not empty
    pub fn body(&self) -> Option<&str> {
        match self {
            FatalError::AuthRejected { body, .. } | FatalError::QueryRejected { body, .. }
                if !body.is_empty() =>
            {
                Some(body.as_str())
            }
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            FailureKind::Auth => AUTH_FAILURE_EXIT_CODE,
            FailureKind::Query => QUERY_FAILURE_EXIT_CODE,
        }
    }
}
