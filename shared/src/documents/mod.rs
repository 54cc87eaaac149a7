mod capability;
mod error;
mod fetch;
mod login;

pub use capability::{CapabilityRequest, CapabilityResponse};
pub use error::DocumentError;
pub use fetch::{FetchRequest, FetchResponse, FetchedRecord};
pub use login::{
    BootstrapManifest, LoginRequest, LoginResponse, LoginStatus, NoticeKind, StartLocation,
};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serializes a request or reply body. A value that cannot be written as JSON
/// goes out as an empty body, which every peer rejects as malformed
pub(crate) fn to_json<T: serde::Serialize>(document: &'static str, value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(error) => {
            log::warn!("Could not serialize {} document: {}", document, error);
            Vec::new()
        }
    }
}
