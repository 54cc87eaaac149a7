mod error;
mod packet;

pub use error::PacketError;
pub use packet::{CircuitPacket, PacketHeader, HEADER_SIZE};
