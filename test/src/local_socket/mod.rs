//! In-memory datagram transport for driving a circuit without network I/O.
//! The client end implements the session's packet traits; the region end
//! lets a test read what the client sent and queue replies.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use grid_client::transport::{PacketReceiver, PacketSender, RecvError, SendError};

type Queue = Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>;

pub struct LocalSocketPair {
    pub client_sender: Box<dyn PacketSender>,
    pub client_receiver: Box<dyn PacketReceiver>,
    pub region: RegionEnd,
}

impl LocalSocketPair {
    pub fn new() -> Self {
        let to_region = Queue::default();
        let to_client = Queue::default();
        let history = Arc::new(Mutex::new(Vec::new()));

        Self {
            client_sender: Box::new(LocalSender {
                queue: to_region.clone(),
                history: history.clone(),
            }),
            client_receiver: Box::new(LocalReceiver {
                queue: to_client.clone(),
                current: Vec::new(),
            }),
            region: RegionEnd {
                from_client: to_region,
                to_client,
                history,
            },
        }
    }
}

impl Default for LocalSocketPair {
    fn default() -> Self {
        Self::new()
    }
}

/// The far side of the pair. Clones share the same queues
#[derive(Clone)]
pub struct RegionEnd {
    from_client: Queue,
    to_client: Queue,
    history: Arc<Mutex<Vec<(SocketAddr, Vec<u8>)>>>,
}

impl RegionEnd {
    /// Datagrams the client sent since the last call, with their destination
    pub fn take_received(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.from_client.lock().unwrap().drain(..).collect()
    }

    /// Every datagram the client has ever sent
    pub fn history(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.history.lock().unwrap().clone()
    }

    /// Queues a datagram for the client, appearing to come from `from`
    pub fn deliver(&self, from: SocketAddr, payload: Vec<u8>) {
        self.to_client.lock().unwrap().push_back((from, payload));
    }
}

struct LocalSender {
    queue: Queue,
    history: Arc<Mutex<Vec<(SocketAddr, Vec<u8>)>>>,
}

impl PacketSender for LocalSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        self.history
            .lock()
            .map_err(|_| SendError)?
            .push((*address, payload.to_vec()));
        self.queue
            .lock()
            .map_err(|_| SendError)?
            .push_back((*address, payload.to_vec()));
        Ok(())
    }
}

struct LocalReceiver {
    queue: Queue,
    current: Vec<u8>,
}

impl PacketReceiver for LocalReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        let next = self.queue.lock().map_err(|_| RecvError)?.pop_front();
        match next {
            Some((address, payload)) => {
                self.current = payload;
                Ok(Some((address, &self.current)))
            }
            None => Ok(None),
        }
    }
}
