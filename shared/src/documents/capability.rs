use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{types::SessionId, DocumentError};

const DOCUMENT: &str = "capability";

/// Body posted to the seed capability URL
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CapabilityRequest {
    pub session_id: SessionId,
    pub capabilities: Vec<String>,
}

impl CapabilityRequest {
    pub fn to_bytes(&self) -> Vec<u8> {
        super::to_json(DOCUMENT, self)
    }
}

/// Map of capability name to the URL that serves it
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CapabilityResponse {
    urls: BTreeMap<String, String>,
}

impl CapabilityResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        serde_json::from_slice(bytes).map_err(|error| DocumentError::malformed(DOCUMENT, error))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.urls
            .get(name)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }
}
