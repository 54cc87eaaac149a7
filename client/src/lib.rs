//! # Grid Client
//! Tick-driven session establishment for a virtual world grid: authenticates
//! against a ranked list of login endpoints, claims a circuit with the
//! assigned region, waits for its capability grant and tracks the bootstrap
//! fetches until the session is ready.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use grid_shared::{
        AgentId, BootstrapManifest, CircuitCode, CircuitPacket, ItemId, ItemKey, NoticeKind,
        SecureSessionId, SessionId, StartLocation,
    };
}

mod auth;
mod bootstrap;
mod capability;
mod circuit;
mod client_config;
mod error;
mod events;
mod fetch_tracker;
mod io;
mod session;

pub use auth::{
    AttemptVerdict, AuthAttempts, AuthClient, AuthOutcome, CredentialStore, Credentials,
    LoginOptions, MemoryCredentialStore, RetryReason,
};
pub use bootstrap::{BatchResult, BootstrapCoordinator, FetchBatch, FetchKind};
pub use capability::{CapabilityWaiter, GrantStatus, FETCH_CAPABILITY};
pub use circuit::{CircuitHandle, CircuitNegotiator, RetryOutcome};
pub use client_config::{ClientConfig, ConfigError};
pub use error::LoginError;
pub use events::{
    FetchFailedEvent, LoginFailedEvent, NoticeEvent, ReadyEvent, SessionEvent, SessionEvents,
    StateChange, StateChangeEvent,
};
pub use fetch_tracker::FetchTracker;
pub use io::Io;
pub use session::{SessionGrant, SessionState, SessionStateMachine};
