use std::{
    fmt,
    net::{IpAddr, SocketAddr},
};

use serde::{Deserialize, Serialize};

use crate::{
    types::{AgentId, CircuitCode, ItemId, ItemKey, SecureSessionId, SessionId},
    DocumentError,
};

const DOCUMENT: &str = "login";

/// Where the avatar should appear once the session is ready
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StartLocation {
    Home,
    #[default]
    Last,
    Region { name: String, x: f32, y: f32, z: f32 },
}

impl StartLocation {
    pub fn to_param(&self) -> String {
        match self {
            StartLocation::Home => "home".to_string(),
            StartLocation::Last => "last".to_string(),
            StartLocation::Region { name, x, y, z } => {
                format!("uri:{}&{}&{}&{}", name, x, y, z)
            }
        }
    }
}

/// Body posted to a login endpoint
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub method: String,
    pub first: String,
    pub last: String,
    #[serde(rename = "passwd")]
    pub secret: String,
    pub start: String,
    pub channel: String,
    pub version: String,
    pub platform: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub agree_to_tos: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_critical: bool,
    pub options: Vec<String>,
}

impl LoginRequest {
    pub fn to_bytes(&self) -> Vec<u8> {
        super::to_json(DOCUMENT, self)
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("method", &self.method)
            .field("first", &self.first)
            .field("last", &self.last)
            .field("secret", &"<redacted>")
            .field("start", &self.start)
            .field("agree_to_tos", &self.agree_to_tos)
            .field("read_critical", &self.read_critical)
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStatus {
    Success,
    Indeterminate,
    Failed,
}

/// A legal notice the server wants acknowledged before it lets the account in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    TermsOfService,
    CriticalMessage,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct FolderEntry {
    folder_id: ItemId,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct OutfitEntry {
    item_id: ItemId,
    #[serde(default)]
    owner_id: Option<AgentId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct BuddyEntry {
    buddy_id: ItemId,
}

/// Reply document returned by a login endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    login: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    next_method: Option<String>,
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default)]
    agent_id: Option<AgentId>,
    #[serde(default)]
    session_id: Option<SessionId>,
    #[serde(default)]
    secure_session_id: Option<SecureSessionId>,
    #[serde(default)]
    circuit_code: Option<CircuitCode>,
    #[serde(default)]
    sim_ip: Option<String>,
    #[serde(default)]
    sim_port: Option<u16>,
    #[serde(default)]
    seed_capability: Option<String>,
    #[serde(default)]
    home: Option<String>,
    #[serde(default)]
    start_location: Option<String>,
    #[serde(default, rename = "inventory-skeleton")]
    inventory_skeleton: Vec<FolderEntry>,
    #[serde(default, rename = "initial-outfit")]
    initial_outfit: Vec<OutfitEntry>,
    #[serde(default, rename = "buddy-list")]
    buddy_list: Vec<BuddyEntry>,
}

impl LoginResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        serde_json::from_slice(bytes).map_err(|error| DocumentError::malformed(DOCUMENT, error))
    }

    pub fn status(&self) -> LoginStatus {
        match self.login.as_str() {
            "true" => LoginStatus::Success,
            "indeterminate" => LoginStatus::Indeterminate,
            _ => LoginStatus::Failed,
        }
    }

    /// Failure class, e.g. "key", "tos", "critical", "presence"
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Human readable text. On success this is the message of the day
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    pub fn notice_kind(&self) -> Option<NoticeKind> {
        match self.reason.as_deref() {
            Some("tos") => Some(NoticeKind::TermsOfService),
            Some("critical") => Some(NoticeKind::CriticalMessage),
            _ => None,
        }
    }

    pub fn next_method(&self) -> Option<&str> {
        self.next_method.as_deref().filter(|method| !method.is_empty())
    }

    pub fn next_url(&self) -> Option<&str> {
        self.next_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn agent_id(&self) -> Result<AgentId, DocumentError> {
        required("agent_id", self.agent_id)
    }

    pub fn session_id(&self) -> Result<SessionId, DocumentError> {
        required("session_id", self.session_id)
    }

    pub fn secure_session_id(&self) -> Result<SecureSessionId, DocumentError> {
        required("secure_session_id", self.secure_session_id)
    }

    pub fn circuit_code(&self) -> Result<CircuitCode, DocumentError> {
        let code = required("circuit_code", self.circuit_code)?;
        if code == 0 {
            return Err(DocumentError::InvalidField {
                field: "circuit_code",
                value: code.to_string(),
            });
        }
        Ok(code)
    }

    pub fn server_address(&self) -> Result<SocketAddr, DocumentError> {
        let ip_text = required("sim_ip", self.sim_ip.as_deref())?;
        let port = required("sim_port", self.sim_port)?;
        let ip: IpAddr = ip_text.parse().map_err(|_| DocumentError::InvalidField {
            field: "sim_ip",
            value: ip_text.to_string(),
        })?;
        Ok(SocketAddr::new(ip, port))
    }

    pub fn seed_capability(&self) -> Result<&str, DocumentError> {
        required("seed_capability", self.seed_capability.as_deref())
            .and_then(|url| non_empty("seed_capability", url))
    }

    pub fn home(&self) -> Option<&str> {
        self.home.as_deref()
    }

    pub fn start_location(&self) -> Option<&str> {
        self.start_location.as_deref()
    }

    /// Reference ids the bootstrap fetches start from, all owned by `agent_id`
    pub fn manifest(&self, agent_id: AgentId) -> BootstrapManifest {
        BootstrapManifest {
            skeleton: self
                .inventory_skeleton
                .iter()
                .map(|folder| ItemKey::new(agent_id, folder.folder_id))
                .collect(),
            appearance: self
                .initial_outfit
                .iter()
                .map(|entry| ItemKey::new(entry.owner_id.unwrap_or(agent_id), entry.item_id))
                .collect(),
            contacts: self
                .buddy_list
                .iter()
                .map(|buddy| ItemKey::new(agent_id, buddy.buddy_id))
                .collect(),
        }
    }
}

/// Counts and reference ids needed for skeleton, appearance and contacts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapManifest {
    pub skeleton: Vec<ItemKey>,
    /// Appearance items known up front; more are discovered from skeleton records
    pub appearance: Vec<ItemKey>,
    pub contacts: Vec<ItemKey>,
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, DocumentError> {
    value.ok_or(DocumentError::MissingField { field })
}

fn non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, DocumentError> {
    if value.is_empty() {
        return Err(DocumentError::MissingField { field });
    }
    Ok(value)
}
