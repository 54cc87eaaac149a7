use serde::{Deserialize, Serialize};

use crate::{types::ItemKey, DocumentError};

const DOCUMENT: &str = "fetch";

/// One batch of records to fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub items: Vec<ItemKey>,
}

impl FetchRequest {
    pub fn to_bytes(&self) -> Vec<u8> {
        super::to_json(DOCUMENT, self)
    }
}

/// A fetched record. Skeleton folders list the appearance items they link to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedRecord {
    #[serde(flatten)]
    pub key: ItemKey,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked: Vec<ItemKey>,
}

impl FetchedRecord {
    pub fn new(key: ItemKey) -> Self {
        Self {
            key,
            linked: Vec::new(),
        }
    }

    pub fn with_links(key: ItemKey, linked: Vec<ItemKey>) -> Self {
        Self { key, linked }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub records: Vec<FetchedRecord>,
}

impl FetchResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        serde_json::from_slice(bytes).map_err(|error| DocumentError::malformed(DOCUMENT, error))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        super::to_json(DOCUMENT, self)
    }
}
