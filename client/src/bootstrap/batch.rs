use log::debug;

use grid_shared::{FetchRequest, FetchResponse, FetchedRecord, ItemKey, JSON_CONTENT_TYPE};

use crate::{
    bootstrap::FetchKind,
    transport::{HttpClient, ResponseReceiver, ResponseResult},
};

pub enum BatchResult {
    Records(Vec<FetchedRecord>),
    Failed(String),
}

/// One outstanding fetch request and the receiver its reply arrives on
pub struct FetchBatch {
    kind: FetchKind,
    len: usize,
    receiver: Box<dyn ResponseReceiver>,
}

impl FetchBatch {
    pub fn issue(kind: FetchKind, keys: &[ItemKey], url: &str, http: &mut dyn HttpClient) -> Self {
        let request = FetchRequest {
            items: keys.to_vec(),
        };
        debug!("Fetching {} {} records from {}", keys.len(), kind.name(), url);
        Self {
            kind,
            len: keys.len(),
            receiver: http.post(url, request.to_bytes(), JSON_CONTENT_TYPE),
        }
    }

    /// Splits `keys` into requests of at most `batch_size` keys each
    pub fn issue_all(
        kind: FetchKind,
        keys: &[ItemKey],
        batch_size: usize,
        url: &str,
        http: &mut dyn HttpClient,
    ) -> Vec<Self> {
        keys.chunks(batch_size.max(1))
            .map(|chunk| Self::issue(kind, chunk, url, http))
            .collect()
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `None` while the reply is outstanding
    pub fn poll(&mut self) -> Option<BatchResult> {
        match self.receiver.receive() {
            ResponseResult::Waiting => None,
            ResponseResult::Success(body) => Some(match FetchResponse::from_bytes(&body) {
                Ok(response) => BatchResult::Records(response.records),
                Err(error) => BatchResult::Failed(error.to_string()),
            }),
            ResponseResult::ErrorResponseCode(code) => {
                Some(BatchResult::Failed(format!("HTTP status {}", code)))
            }
            ResponseResult::TransportFailure(reason) => Some(BatchResult::Failed(reason)),
        }
    }
}
