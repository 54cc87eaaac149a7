use std::{
    mem,
    time::{Duration, Instant},
};

use log::{info, warn};

use grid_shared::{CapabilityRequest, CapabilityResponse, SessionId, Timer, JSON_CONTENT_TYPE};

use crate::transport::{HttpClient, ResponseReceiver, ResponseResult};

/// Name of the capability that serves bootstrap fetches
pub const FETCH_CAPABILITY: &str = "FetchInventoryDescendents2";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantStatus {
    /// First request is in flight
    Pending,
    /// The grant has arrived
    Granted,
    /// A later request is in flight; the count is display-only
    Retrying(u32),
}

/// Exchanges the seed capability for the capability map.
///
/// One request goes out on the first poll, and another every poll interval
/// until the grant arrives, with no upper bound on attempts. Requests still
/// in flight are kept when a new one goes out; whichever answers first with
/// a usable map wins.
pub struct CapabilityWaiter {
    seed_url: String,
    session_id: SessionId,
    requested: Vec<String>,
    poll_timer: Timer,
    attempt: u32,
    pending: Vec<Box<dyn ResponseReceiver>>,
    grant: Option<CapabilityResponse>,
}

impl CapabilityWaiter {
    pub fn new(
        seed_url: impl Into<String>,
        session_id: SessionId,
        requested: Vec<String>,
        poll_interval: Duration,
        now: &Instant,
    ) -> Self {
        Self {
            seed_url: seed_url.into(),
            session_id,
            requested,
            poll_timer: Timer::new(poll_interval, now),
            attempt: 0,
            pending: Vec::new(),
            grant: None,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Requests sent and not yet answered
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn grant(&self) -> Option<&CapabilityResponse> {
        self.grant.as_ref()
    }

    /// URL bootstrap fetches are posted to. Falls back to the seed capability
    /// when the grant does not name a fetch service
    pub fn fetch_url(&self) -> &str {
        self.grant
            .as_ref()
            .and_then(|grant| grant.get(FETCH_CAPABILITY))
            .unwrap_or(self.seed_url.as_str())
    }

    pub fn poll_grant(&mut self, http: &mut dyn HttpClient, now: &Instant) -> GrantStatus {
        if self.grant.is_some() {
            return GrantStatus::Granted;
        }

        if self.attempt == 0 {
            self.send_request(http, now);
            return self.status();
        }

        let mut outstanding = Vec::with_capacity(self.pending.len());
        for mut receiver in mem::take(&mut self.pending) {
            match receiver.receive() {
                ResponseResult::Waiting => outstanding.push(receiver),
                ResponseResult::Success(body) => match CapabilityResponse::from_bytes(&body) {
                    Ok(grant) if !grant.is_empty() => {
                        info!(
                            "Received {} capabilities after {} request(s)",
                            grant.len(),
                            self.attempt
                        );
                        self.grant = Some(grant);
                    }
                    Ok(_) => warn!("Capability grant was empty"),
                    Err(error) => warn!("Capability grant: {}", error),
                },
                ResponseResult::ErrorResponseCode(code) => {
                    warn!("Capability request got HTTP status {}", code);
                }
                ResponseResult::TransportFailure(reason) => {
                    warn!("Capability request failed: {}", reason);
                }
            }
            if self.grant.is_some() {
                return GrantStatus::Granted;
            }
        }
        self.pending = outstanding;

        if self.poll_timer.ringing(now) {
            self.send_request(http, now);
        }
        self.status()
    }

    fn status(&self) -> GrantStatus {
        if self.attempt <= 1 {
            GrantStatus::Pending
        } else {
            GrantStatus::Retrying(self.attempt)
        }
    }

    fn send_request(&mut self, http: &mut dyn HttpClient, now: &Instant) {
        self.attempt += 1;
        self.poll_timer.reset(now);

        let request = CapabilityRequest {
            session_id: self.session_id,
            capabilities: self.requested.clone(),
        };
        info!(
            "Requesting capabilities from {} (attempt {})",
            self.seed_url, self.attempt
        );
        self.pending
            .push(http.post(&self.seed_url, request.to_bytes(), JSON_CONTENT_TYPE));
    }
}
