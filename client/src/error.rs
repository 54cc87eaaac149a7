use std::net::SocketAddr;

use thiserror::Error;

use grid_shared::{DocumentError, NoticeKind};

use crate::bootstrap::FetchKind;

/// Conditions that end a login attempt or degrade a finished one. Every
/// variant except `PartialBootstrapFailure` rolls the session back to
/// credential entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// A login endpoint could not be reached or did not answer sensibly
    #[error("Unable to reach the login service at {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The account name or secret was rejected. The stored secret is cleared
    #[error("Login failed: the account name or password is incorrect")]
    CredentialsInvalid,

    /// The user declined a notice the server requires to be accepted
    #[error("Login cancelled: the {} was declined", notice_name(.kind))]
    NoticeDeclined { kind: NoticeKind },

    /// A login endpoint answered with a document that could not be used
    #[error("Malformed reply from {endpoint}: {source}")]
    ProtocolViolation {
        endpoint: String,
        source: DocumentError,
    },

    /// The server refused the login for a reason other than credentials
    #[error("Login failed: {message}")]
    Rejected { message: String },

    /// Every endpoint candidate failed every attempt
    #[error("Unable to connect after {attempts} attempts across {candidates} login endpoints. Last error: {last}")]
    EndpointsExhausted {
        attempts: usize,
        candidates: usize,
        last: String,
    },

    /// The login server kept redirecting past the hop limit
    #[error("Login failed: redirected {hops} times without reaching a decision")]
    TooManyContinuations { hops: u32 },

    /// The region never acknowledged the circuit
    #[error("The region at {address} did not respond after {attempts} attempts")]
    CircuitTimeout { address: SocketAddr, attempts: u32 },

    /// Some bootstrap records never arrived. The session is still usable
    #[error("{count} {} records failed to load", .kind.name())]
    PartialBootstrapFailure { kind: FetchKind, count: usize },
}

impl LoginError {
    /// Whether the session has to go back to credential entry
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LoginError::PartialBootstrapFailure { .. })
    }
}

fn notice_name(kind: &NoticeKind) -> &'static str {
    match kind {
        NoticeKind::TermsOfService => "terms of service",
        NoticeKind::CriticalMessage => "critical message",
    }
}
