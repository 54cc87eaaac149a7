use std::{default::Default, time::Duration};

use thiserror::Error;

use grid_shared::StartLocation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Contains Config properties which will be used by the Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Login endpoints, most preferred first
    pub candidates: Vec<String>,
    /// Consecutive transport failures tolerated per endpoint before moving on
    pub auth_attempts_per_candidate: u32,
    /// Server-directed continuations allowed within one login round
    pub max_continuation_hops: u32,
    /// Login method named in the first request of a round
    pub login_method: String,
    /// Wait between circuit open datagrams
    pub circuit_resend_interval: Duration,
    /// Circuit open datagrams sent before the region is declared unreachable
    pub circuit_max_attempts: u32,
    /// Wait for a capability grant reply before asking again
    pub capability_poll_interval: Duration,
    /// Capabilities requested from the seed URL
    pub requested_capabilities: Vec<String>,
    /// Deadline of each bootstrap fetch tracker
    pub fetch_timeout: Duration,
    /// Maximum records per bootstrap fetch request
    pub fetch_batch_size: usize,
    /// Time spent in the precache state before the session is ready
    pub precache_delay: Duration,
    /// Options asked of the login server
    pub requested_options: Vec<String>,
    pub start_location: StartLocation,
    pub client_channel: String,
    pub client_version: String,
    pub platform: String,
    /// Log in with remembered credentials without waiting for the user
    pub auto_login: bool,
}

impl ClientConfig {
    pub fn with_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one login endpoint is required".to_string(),
            ));
        }
        if let Some(empty) = self.candidates.iter().position(|url| url.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "login endpoint #{} is empty",
                empty + 1
            )));
        }
        if self.auth_attempts_per_candidate == 0 {
            return Err(ConfigError::ValidationError(
                "auth_attempts_per_candidate must be at least 1".to_string(),
            ));
        }
        if self.circuit_max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "circuit_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.circuit_resend_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "circuit_resend_interval must be greater than zero".to_string(),
            ));
        }
        if self.capability_poll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "capability_poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "fetch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.fetch_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "fetch_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            auth_attempts_per_candidate: 3,
            max_continuation_hops: 4,
            login_method: "login_to_simulator".to_string(),
            circuit_resend_interval: Duration::from_secs(5),
            circuit_max_attempts: 3,
            capability_poll_interval: Duration::from_secs(10),
            requested_capabilities: [
                "EventQueueGet",
                "FetchInventoryDescendents2",
                "FetchInventory2",
                "GetDisplayNames",
                "UpdateAgentInformation",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            fetch_timeout: Duration::from_secs(60),
            fetch_batch_size: 50,
            precache_delay: Duration::from_secs(6),
            requested_options: [
                "inventory-root",
                "inventory-skeleton",
                "initial-outfit",
                "gestures",
                "buddy-list",
                "ui-config",
                "max-agent-groups",
                "map-server-url",
                "login-flags",
                "global-textures",
            ]
            .iter()
            .map(|option| option.to_string())
            .collect(),
            start_location: StartLocation::default(),
            client_channel: "Grid Client".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            auto_login: false,
        }
    }
}
