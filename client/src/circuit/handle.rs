use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use grid_shared::{AgentId, CircuitCode, SequenceNumber, SessionId, Timer};

use crate::SessionGrant;

/// Addressing, sequencing and ack bookkeeping for the datagram channel to
/// one server instance.
///
/// Every claim sent through the handle counts as one attempt and pushes the
/// ack deadline a full resend interval out. Once the deadline passes with
/// `max_attempts` already spent, the circuit is given up.
#[derive(Clone, Debug)]
pub struct CircuitHandle {
    address: SocketAddr,
    code: CircuitCode,
    agent_id: AgentId,
    session_id: SessionId,
    next_sequence: SequenceNumber,
    ack_deadline: Timer,
    attempts: u32,
    max_attempts: u32,
}

impl CircuitHandle {
    pub fn new(
        address: SocketAddr,
        code: CircuitCode,
        agent_id: AgentId,
        session_id: SessionId,
        resend_interval: Duration,
        max_attempts: u32,
        now: &Instant,
    ) -> Self {
        Self {
            address,
            code,
            agent_id,
            session_id,
            next_sequence: 1,
            ack_deadline: Timer::new(resend_interval, now),
            attempts: 0,
            max_attempts,
        }
    }

    pub fn from_grant(
        grant: &SessionGrant,
        resend_interval: Duration,
        max_attempts: u32,
        now: &Instant,
    ) -> Self {
        Self::new(
            grant.server_address(),
            grant.circuit_code(),
            grant.agent_id(),
            grant.session_id(),
            resend_interval,
            max_attempts,
            now,
        )
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn code(&self) -> CircuitCode {
        self.code
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Claims the next outgoing sequence number
    pub fn next_sequence(&mut self) -> SequenceNumber {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Counts a claim sent at `now` and restarts the ack deadline from it.
    /// Returns the attempt number
    pub fn record_attempt(&mut self, now: &Instant) -> u32 {
        self.attempts += 1;
        self.ack_deadline.reset(now);
        self.attempts
    }

    /// Whether a full resend interval has passed since the last claim
    pub fn ack_overdue(&self, now: &Instant) -> bool {
        self.ack_deadline.ringing(now)
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}
