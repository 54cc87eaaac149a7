use std::net::SocketAddr;

use grid_shared::{
    AgentId, BootstrapManifest, CircuitCode, DocumentError, LoginResponse, SecureSessionId,
    SessionId,
};

/// Everything a successful login hands over. Built once by the auth client
/// and read-only afterwards
#[derive(Clone, Debug, PartialEq)]
pub struct SessionGrant {
    agent_id: AgentId,
    session_id: SessionId,
    secure_session_id: SecureSessionId,
    circuit_code: CircuitCode,
    server_address: SocketAddr,
    capability_url: String,
    home: Option<String>,
    start_location: Option<String>,
    message_of_the_day: String,
    manifest: BootstrapManifest,
}

impl SessionGrant {
    pub fn from_response(response: &LoginResponse) -> Result<Self, DocumentError> {
        let agent_id = response.agent_id()?;
        Ok(Self {
            agent_id,
            session_id: response.session_id()?,
            secure_session_id: response.secure_session_id()?,
            circuit_code: response.circuit_code()?,
            server_address: response.server_address()?,
            capability_url: response.seed_capability()?.to_string(),
            home: response.home().map(str::to_string),
            start_location: response.start_location().map(str::to_string),
            message_of_the_day: response.message().to_string(),
            manifest: response.manifest(agent_id),
        })
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn secure_session_id(&self) -> SecureSessionId {
        self.secure_session_id
    }

    pub fn circuit_code(&self) -> CircuitCode {
        self.circuit_code
    }

    pub fn server_address(&self) -> SocketAddr {
        self.server_address
    }

    pub fn capability_url(&self) -> &str {
        &self.capability_url
    }

    pub fn home(&self) -> Option<&str> {
        self.home.as_deref()
    }

    pub fn start_location(&self) -> Option<&str> {
        self.start_location.as_deref()
    }

    pub fn message_of_the_day(&self) -> &str {
        &self.message_of_the_day
    }

    pub fn manifest(&self) -> &BootstrapManifest {
        &self.manifest
    }
}
