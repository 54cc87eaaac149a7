use std::fmt;

/// Where a session is on its way from credential entry to presence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionState {
    Init,
    ShowCredentials,
    Authenticating,
    AuthRetry,
    NoticeWait,
    CircuitNegotiate,
    CircuitWait,
    CapabilityWait,
    BootstrapSend,
    BootstrapWait,
    Precache,
    Ready,
}

impl SessionState {
    pub const ALL: [SessionState; 12] = [
        SessionState::Init,
        SessionState::ShowCredentials,
        SessionState::Authenticating,
        SessionState::AuthRetry,
        SessionState::NoticeWait,
        SessionState::CircuitNegotiate,
        SessionState::CircuitWait,
        SessionState::CapabilityWait,
        SessionState::BootstrapSend,
        SessionState::BootstrapWait,
        SessionState::Precache,
        SessionState::Ready,
    ];

    /// Whether the machine may move from `self` to `next` in one step.
    /// Rollback to credential entry is always allowed
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        if next == ShowCredentials {
            return *self != ShowCredentials;
        }
        matches!(
            (*self, next),
            (ShowCredentials, Authenticating)
                | (Authenticating, AuthRetry)
                | (Authenticating, NoticeWait)
                | (Authenticating, CircuitNegotiate)
                | (AuthRetry, Authenticating)
                | (NoticeWait, Authenticating)
                | (CircuitNegotiate, CircuitWait)
                | (CircuitWait, CapabilityWait)
                | (CapabilityWait, BootstrapSend)
                | (BootstrapSend, BootstrapWait)
                | (BootstrapWait, Precache)
                | (Precache, Ready)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Init => "INIT",
            SessionState::ShowCredentials => "SHOW_CREDENTIALS",
            SessionState::Authenticating => "AUTHENTICATING",
            SessionState::AuthRetry => "AUTH_RETRY",
            SessionState::NoticeWait => "NOTICE_WAIT",
            SessionState::CircuitNegotiate => "CIRCUIT_NEGOTIATE",
            SessionState::CircuitWait => "CIRCUIT_WAIT",
            SessionState::CapabilityWait => "CAPABILITY_WAIT",
            SessionState::BootstrapSend => "BOOTSTRAP_SEND",
            SessionState::BootstrapWait => "BOOTSTRAP_WAIT",
            SessionState::Precache => "PRECACHE",
            SessionState::Ready => "READY",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
