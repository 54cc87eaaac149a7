use std::time::Instant;

use log::{debug, info, warn};

use grid_shared::{CircuitPacket, PacketHeader};

use crate::{
    circuit::CircuitHandle,
    transport::{PacketReceiver, PacketSender},
};

/// Result of [`CircuitNegotiator::retry_if_due`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryOutcome {
    NotDue,
    Resent { attempt: u32 },
    Exhausted,
}

/// Claims the circuit reserved at login and waits for the server instance
/// to acknowledge it. The claim is resent with the same sequence number
/// whenever the handle's ack deadline passes, until the ack arrives or the
/// handle runs out of attempts.
pub struct CircuitNegotiator {
    handle: CircuitHandle,
    claim_header: PacketHeader,
    acknowledged: bool,
}

impl CircuitNegotiator {
    /// Sends the first claim immediately
    pub fn open_circuit(
        mut handle: CircuitHandle,
        sender: &dyn PacketSender,
        now: &Instant,
    ) -> Self {
        let claim_header = PacketHeader::reliable(handle.next_sequence());
        let mut negotiator = Self {
            handle,
            claim_header,
            acknowledged: false,
        };

        info!(
            "Opening circuit {} to {}",
            negotiator.handle.code(),
            negotiator.handle.address()
        );
        negotiator.send_claim(sender, claim_header, now);
        negotiator
    }

    pub fn handle(&self) -> &CircuitHandle {
        &self.handle
    }

    pub fn attempts(&self) -> u32 {
        self.handle.attempts()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Drains queued datagrams until the ack for this circuit shows up.
    /// Returns whether the circuit is acknowledged
    pub fn poll_incoming(&mut self, receiver: &mut dyn PacketReceiver) -> bool {
        while !self.acknowledged {
            match receiver.receive() {
                Ok(Some((address, payload))) => {
                    if address != self.handle.address() {
                        debug!("Ignoring datagram from unexpected source {}", address);
                        continue;
                    }
                    match CircuitPacket::decode(payload) {
                        Ok((_, CircuitPacket::CircuitAck { session_id }))
                            if session_id == self.handle.session_id() =>
                        {
                            info!(
                                "Circuit {} acknowledged by {} after {} attempt(s)",
                                self.handle.code(),
                                address,
                                self.handle.attempts()
                            );
                            self.acknowledged = true;
                        }
                        Ok((_, packet)) => {
                            debug!("Skipping unrelated datagram from {}: {:?}", address, packet);
                        }
                        Err(error) => {
                            debug!("Discarding datagram from {}: {}", address, error);
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!("Circuit receive error");
                    break;
                }
            }
        }
        self.acknowledged
    }

    /// Resends the claim once the ack deadline has passed
    pub fn retry_if_due(&mut self, sender: &dyn PacketSender, now: &Instant) -> RetryOutcome {
        if self.acknowledged || !self.handle.ack_overdue(now) {
            return RetryOutcome::NotDue;
        }
        if self.handle.attempts_exhausted() {
            warn!(
                "Circuit {} to {} unacknowledged after {} attempts",
                self.handle.code(),
                self.handle.address(),
                self.handle.attempts()
            );
            return RetryOutcome::Exhausted;
        }

        let attempt = self.send_claim(sender, self.claim_header.as_resent(), now);
        RetryOutcome::Resent { attempt }
    }

    /// Tells the server instance the agent is leaving
    pub fn send_logout(&mut self, sender: &dyn PacketSender) -> bool {
        let header = PacketHeader::reliable(self.handle.next_sequence());
        let packet = CircuitPacket::LogoutRequest {
            agent_id: self.handle.agent_id(),
            session_id: self.handle.session_id(),
        };
        info!("Sending logout to {}", self.handle.address());
        if sender
            .send(&self.handle.address(), &packet.encode(&header))
            .is_err()
        {
            warn!("Logout datagram to {} was not sent", self.handle.address());
            return false;
        }
        true
    }

    fn send_claim(
        &mut self,
        sender: &dyn PacketSender,
        header: PacketHeader,
        now: &Instant,
    ) -> u32 {
        let attempt = self.handle.record_attempt(now);
        let packet = CircuitPacket::UseCircuitCode {
            code: self.handle.code(),
            session_id: self.handle.session_id(),
            agent_id: self.handle.agent_id(),
        };
        if sender
            .send(&self.handle.address(), &packet.encode(&header))
            .is_err()
        {
            warn!(
                "Circuit claim #{} to {} was not sent",
                attempt,
                self.handle.address()
            );
        }
        attempt
    }
}
