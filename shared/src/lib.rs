//! # Grid Shared
//! Identifiers, wire documents and circuit datagram codecs shared between the
//! grid login client and its test harness.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod backends;
mod circuit;
mod documents;
mod types;

pub use backends::Timer;
pub use circuit::{CircuitPacket, PacketError, PacketHeader, HEADER_SIZE};
pub use documents::{
    BootstrapManifest, CapabilityRequest, CapabilityResponse, DocumentError, FetchRequest,
    FetchResponse, FetchedRecord, LoginRequest, LoginResponse, LoginStatus, NoticeKind,
    StartLocation, JSON_CONTENT_TYPE,
};
pub use types::{
    AgentId, CircuitCode, ItemId, ItemKey, SecureSessionId, SequenceNumber, SessionId,
};
