use crate::transport::{HttpClient, PacketReceiver, PacketSender};

/// The collaborators a session talks through. Requests are dispatched
/// without blocking and their results are picked up on later ticks
pub struct Io {
    http: Box<dyn HttpClient>,
    packet_sender: Box<dyn PacketSender>,
    packet_receiver: Box<dyn PacketReceiver>,
}

impl Io {
    pub fn new(
        http: Box<dyn HttpClient>,
        packet_sender: Box<dyn PacketSender>,
        packet_receiver: Box<dyn PacketReceiver>,
    ) -> Self {
        Self {
            http,
            packet_sender,
            packet_receiver,
        }
    }

    pub fn http(&mut self) -> &mut dyn HttpClient {
        self.http.as_mut()
    }

    pub fn sender(&self) -> &dyn PacketSender {
        self.packet_sender.as_ref()
    }

    pub fn receiver(&mut self) -> &mut dyn PacketReceiver {
        self.packet_receiver.as_mut()
    }
}
