cfg_if! {
    if #[cfg(feature = "transport_http")] {
        pub mod http;
    } else {}
}
cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub mod udp;
    } else {}
}

pub use inner::{
    HttpClient, PacketReceiver, PacketSender, RecvError, ResponseReceiver, ResponseResult,
    SendError,
};

mod inner {

    use std::net::SocketAddr;

    /// State of a request that was handed to an [`HttpClient`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ResponseResult {
        /// No reply yet, poll again next tick
        Waiting,
        /// A 2xx reply with its body
        Success(Vec<u8>),
        /// The server replied with a non-2xx status
        ErrorResponseCode(u16),
        /// The request never produced a reply (unreachable, reset, timed out)
        TransportFailure(String),
    }

    impl ResponseResult {
        pub fn is_waiting(&self) -> bool {
            matches!(self, ResponseResult::Waiting)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SendError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecvError;

    /// Reliable request/response collaborator. Requests are dispatched
    /// without blocking; the reply is observed by polling the returned
    /// receiver once per tick.
    pub trait HttpClient {
        /// Posts `body` to `url`
        fn post(&mut self, url: &str, body: Vec<u8>, content_type: &str)
            -> Box<dyn ResponseReceiver>;
    }

    pub trait ResponseReceiver: Send {
        /// Polls for the reply. Once a result other than `Waiting` has been
        /// returned the receiver is spent and should be dropped.
        fn receive(&mut self) -> ResponseResult;
    }

    pub trait PacketSender: Send + Sync {
        /// Sends a datagram to the given address
        fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
    }

    pub trait PacketReceiver: Send + Sync {
        /// Receives the next queued datagram, if any, without blocking
        fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
    }
}
