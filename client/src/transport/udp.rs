use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    sync::Arc,
};

use log::warn;

use crate::transport::{
    PacketReceiver as TransportReceiver, PacketSender as TransportSender, RecvError, SendError,
};

// Large enough for any single circuit datagram
const RECV_BUFFER_SIZE: usize = 1500;

/// Binds a non-blocking UDP socket and splits it into the circuit transport
/// halves
pub fn bind(
    local_addr: SocketAddr,
) -> Result<(Box<dyn TransportSender>, Box<dyn TransportReceiver>), std::io::Error> {
    let socket = UdpSocket::bind(local_addr)?;
    socket.set_nonblocking(true)?;
    let socket = Arc::new(socket);

    Ok((
        Box::new(PacketSender {
            socket: socket.clone(),
        }),
        Box::new(PacketReceiver {
            socket,
            buffer: vec![0; RECV_BUFFER_SIZE].into_boxed_slice(),
        }),
    ))
}

// Packet Sender
struct PacketSender {
    socket: Arc<UdpSocket>,
}

impl TransportSender for PacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        match self.socket.send_to(payload, address) {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("UDP send to {} failed: {}", address, e);
                Err(SendError)
            }
        }
    }
}

// Packet Receiver
struct PacketReceiver {
    socket: Arc<UdpSocket>,
    buffer: Box<[u8]>,
}

impl TransportReceiver for PacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, &self.buffer[..length]))),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => {
                warn!("UDP receive failed: {}", e);
                Err(RecvError)
            }
        }
    }
}
