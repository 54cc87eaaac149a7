mod attempts;
mod auth_client;
mod credentials;

pub use attempts::{AttemptVerdict, AuthAttempts};
pub use auth_client::{AuthClient, AuthOutcome, LoginOptions, RetryReason};
pub use credentials::{CredentialStore, Credentials, MemoryCredentialStore};
