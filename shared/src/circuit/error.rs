use thiserror::Error;

/// Errors that can occur while decoding a circuit datagram
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Datagram ended before the header or body was complete
    #[error("Truncated {part} in circuit datagram: needed {needed} bytes, found {found}. The datagram is malformed")]
    Truncated {
        part: &'static str,
        needed: usize,
        found: usize,
    },

    /// Header flags carry bits this client does not understand
    #[error("Unknown flag bits {flags:#04x} in circuit datagram header")]
    UnknownFlags { flags: u8 },
}
