// Datagrams exchanged with a server instance while a circuit is being opened
// and torn down. Layout, all big-endian:
//
//   flags: u8 | sequence: u32 | message: u8 | body
//
// Only the three messages the login flow needs are understood. Anything else
// that shares the transport decodes as `Other` and is left to its owner.

use crate::{
    types::{AgentId, CircuitCode, SequenceNumber, SessionId},
    PacketError,
};

pub const HEADER_SIZE: usize = 6;

const FLAG_RELIABLE: u8 = 0x40;
const FLAG_RESENT: u8 = 0x20;
const KNOWN_FLAGS: u8 = FLAG_RELIABLE | FLAG_RESENT;

const MSG_USE_CIRCUIT_CODE: u8 = 1;
const MSG_CIRCUIT_ACK: u8 = 2;
const MSG_LOGOUT_REQUEST: u8 = 3;

const UUID_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub sequence: SequenceNumber,
    pub reliable: bool,
    pub resent: bool,
}

impl PacketHeader {
    pub fn reliable(sequence: SequenceNumber) -> Self {
        Self {
            sequence,
            reliable: true,
            resent: false,
        }
    }

    pub fn as_resent(mut self) -> Self {
        self.resent = true;
        self
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.reliable {
            flags |= FLAG_RELIABLE;
        }
        if self.resent {
            flags |= FLAG_RESENT;
        }
        flags
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CircuitPacket {
    // Sent by the client to claim the circuit the login server reserved
    UseCircuitCode {
        code: CircuitCode,
        session_id: SessionId,
        agent_id: AgentId,
    },
    // Sent by the server instance once the circuit code has been accepted
    CircuitAck { session_id: SessionId },
    // Sent by the client to leave the world cleanly
    LogoutRequest {
        agent_id: AgentId,
        session_id: SessionId,
    },
    // Any other traffic on the same transport
    Other { message: u8 },
}

impl CircuitPacket {
    pub fn encode(&self, header: &PacketHeader) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + 2 * UUID_SIZE + 4);
        out.push(header.flags());
        out.extend_from_slice(&header.sequence.to_be_bytes());

        match self {
            CircuitPacket::UseCircuitCode {
                code,
                session_id,
                agent_id,
            } => {
                out.push(MSG_USE_CIRCUIT_CODE);
                out.extend_from_slice(&code.to_be_bytes());
                out.extend_from_slice(session_id.as_bytes());
                out.extend_from_slice(agent_id.as_bytes());
            }
            CircuitPacket::CircuitAck { session_id } => {
                out.push(MSG_CIRCUIT_ACK);
                out.extend_from_slice(session_id.as_bytes());
            }
            CircuitPacket::LogoutRequest {
                agent_id,
                session_id,
            } => {
                out.push(MSG_LOGOUT_REQUEST);
                out.extend_from_slice(agent_id.as_bytes());
                out.extend_from_slice(session_id.as_bytes());
            }
            CircuitPacket::Other { message } => {
                out.push(*message);
            }
        }

        out
    }

    pub fn decode(payload: &[u8]) -> Result<(PacketHeader, Self), PacketError> {
        if payload.len() < HEADER_SIZE {
            return Err(PacketError::Truncated {
                part: "header",
                needed: HEADER_SIZE,
                found: payload.len(),
            });
        }

        let flags = payload[0];
        if flags & !KNOWN_FLAGS != 0 {
            return Err(PacketError::UnknownFlags { flags });
        }
        let header = PacketHeader {
            sequence: u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]),
            reliable: flags & FLAG_RELIABLE != 0,
            resent: flags & FLAG_RESENT != 0,
        };

        let message = payload[5];
        let mut body = BodyReader::new(&payload[HEADER_SIZE..]);

        let packet = match message {
            MSG_USE_CIRCUIT_CODE => CircuitPacket::UseCircuitCode {
                code: body.read_u32()?,
                session_id: SessionId::from_bytes(body.read_uuid()?),
                agent_id: AgentId::from_bytes(body.read_uuid()?),
            },
            MSG_CIRCUIT_ACK => CircuitPacket::CircuitAck {
                session_id: SessionId::from_bytes(body.read_uuid()?),
            },
            MSG_LOGOUT_REQUEST => CircuitPacket::LogoutRequest {
                agent_id: AgentId::from_bytes(body.read_uuid()?),
                session_id: SessionId::from_bytes(body.read_uuid()?),
            },
            other => {
                log::trace!("Circuit datagram carries message {}, passing it on", other);
                CircuitPacket::Other { message: other }
            }
        };

        Ok((header, packet))
    }
}

struct BodyReader<'a> {
    bytes: &'a [u8],
}

impl<'a> BodyReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], PacketError> {
        if self.bytes.len() < count {
            return Err(PacketError::Truncated {
                part: "body",
                needed: count,
                found: self.bytes.len(),
            });
        }
        let (head, rest) = self.bytes.split_at(count);
        self.bytes = rest;
        Ok(head)
    }

    fn read_u32(&mut self) -> Result<u32, PacketError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_uuid(&mut self) -> Result<[u8; 16], PacketError> {
        let mut out = [0u8; UUID_SIZE];
        out.copy_from_slice(self.take(UUID_SIZE)?);
        Ok(out)
    }
}
