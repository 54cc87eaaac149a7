//! In-memory request/response transport for driving a session without
//! network I/O. Each URL is answered by a scripted responder; requests to
//! unknown URLs fail as if the host were unreachable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use grid_client::transport::{HttpClient, ResponseReceiver, ResponseResult};
use log::debug;

pub type Responder = Box<dyn FnMut(&[u8]) -> ResponseResult + Send>;

/// A request as the fake server saw it
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Default)]
struct HttpState {
    routes: HashMap<String, Responder>,
    requests: Vec<RecordedRequest>,
}

/// Shared handle to the fake. Clones see the same routes and request log
#[derive(Clone, Default)]
pub struct LocalHttp {
    state: Arc<Mutex<HttpState>>,
}

impl LocalHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request to `url` with whatever `responder` returns.
    /// Returning `Waiting` leaves the request unanswered forever
    pub fn route<F>(&self, url: &str, responder: F)
    where
        F: FnMut(&[u8]) -> ResponseResult + Send + 'static,
    {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), Box::new(responder));
    }

    /// Answers requests to `url` from `replies` in order, then repeats the last
    pub fn script(&self, url: &str, replies: Vec<ResponseResult>) {
        let mut replies = replies.into_iter().collect::<std::collections::VecDeque<_>>();
        self.route(url, move |_| {
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or(ResponseResult::Waiting)
            }
        });
    }

    pub fn unroute(&self, url: &str) {
        self.state.lock().unwrap().routes.remove(url);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests_to(url).len()
    }

    pub fn client(&self) -> Box<dyn HttpClient> {
        Box::new(self.clone())
    }
}

impl HttpClient for LocalHttp {
    fn post(&mut self, url: &str, body: Vec<u8>, _content_type: &str) -> Box<dyn ResponseReceiver> {
        let mut state = self.state.lock().unwrap();
        let result = match state.routes.get_mut(url) {
            Some(responder) => responder(&body),
            None => {
                debug!("No route for {}, failing the request", url);
                ResponseResult::TransportFailure(format!("{} is unreachable", url))
            }
        };
        debug!("POST {} ({} bytes)", url, body.len());
        state.requests.push(RecordedRequest {
            url: url.to_string(),
            body,
        });
        Box::new(LocalResponse(Some(result)))
    }
}

struct LocalResponse(Option<ResponseResult>);

impl ResponseReceiver for LocalResponse {
    fn receive(&mut self) -> ResponseResult {
        match self.0.take() {
            Some(ResponseResult::Waiting) | None => {
                self.0 = Some(ResponseResult::Waiting);
                ResponseResult::Waiting
            }
            Some(result) => result,
        }
    }
}
