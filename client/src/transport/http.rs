use std::{sync::Arc, time::Duration};

use log::warn;
use tokio::{runtime::Runtime, sync::oneshot};

use crate::transport::{HttpClient, ResponseReceiver, ResponseResult};

// HttpTransport
/// [`HttpClient`] backed by reqwest. Requests run on a private tokio runtime
/// and hand their result back through a oneshot channel that the tick thread
/// polls.
pub struct HttpTransport {
    runtime: Arc<Runtime>,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        Ok(Self {
            runtime: Arc::new(runtime),
            client,
        })
    }
}

impl HttpClient for HttpTransport {
    fn post(
        &mut self,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Box<dyn ResponseReceiver> {
        let (tx, rx) = oneshot::channel::<ResponseResult>();

        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);

        self.runtime.spawn(async move {
            let result = send_and_read(request).await;
            // receiver may already be gone after a reset
            let _ = tx.send(result);
        });

        Box::new(PendingResponse { receiver: rx })
    }
}

async fn send_and_read(request: reqwest::RequestBuilder) -> ResponseResult {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return ResponseResult::TransportFailure(e.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        return ResponseResult::ErrorResponseCode(status.as_u16());
    }

    match response.bytes().await {
        Ok(bytes) => ResponseResult::Success(bytes.to_vec()),
        Err(e) => ResponseResult::TransportFailure(format!("Failed to read body: {}", e)),
    }
}

// PendingResponse
struct PendingResponse {
    receiver: oneshot::Receiver<ResponseResult>,
}

impl ResponseReceiver for PendingResponse {
    fn receive(&mut self) -> ResponseResult {
        match self.receiver.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => ResponseResult::Waiting,
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("HTTP request task ended without a result");
                ResponseResult::TransportFailure("request task dropped".to_string())
            }
        }
    }
}
