use log::{info, warn};

use grid_shared::{
    LoginRequest, LoginResponse, LoginStatus, NoticeKind, StartLocation, JSON_CONTENT_TYPE,
};

use crate::{
    auth::{AttemptVerdict, AuthAttempts, Credentials},
    transport::{HttpClient, ResponseReceiver, ResponseResult},
    ClientConfig, LoginError, SessionGrant,
};

/// Request fields that stay the same for every attempt of a login round
#[derive(Clone, Debug)]
pub struct LoginOptions {
    pub method: String,
    pub start: StartLocation,
    pub channel: String,
    pub version: String,
    pub platform: String,
    pub requested_options: Vec<String>,
}

impl LoginOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            method: config.login_method.clone(),
            start: config.start_location.clone(),
            channel: config.client_channel.clone(),
            version: config.client_version.clone(),
            platform: config.platform.clone(),
            requested_options: config.requested_options.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RetryReason {
    /// The request failed or the reply was unusable. The next request goes
    /// to endpoint `cursor`, as attempt number `attempt` against it
    Transport {
        error: LoginError,
        cursor: usize,
        attempt: u32,
    },
    /// The server asked for another round at a method and URL of its choosing
    Continuation { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthOutcome {
    Success(SessionGrant),
    Retryable(RetryReason),
    TermsRequired { kind: NoticeKind, message: String },
    CredentialsInvalid,
    TerminallyFailed(LoginError),
}

/// One login round against a ranked list of endpoints.
///
/// The client never blocks. [`AuthClient::send_request`] dispatches a request
/// to the current endpoint, and [`AuthClient::poll`] classifies the reply
/// once it is in. Transport failures move the cursor according to
/// [`AuthAttempts`]; credential and notice replies never do.
pub struct AuthClient {
    candidates: Vec<String>,
    attempts: AuthAttempts,
    options: LoginOptions,
    method: String,
    continuation_url: Option<String>,
    accepted_notice: Option<NoticeKind>,
    pending: Option<Box<dyn ResponseReceiver>>,
    requests_sent: usize,
    last_failure: Option<LoginError>,
}

impl AuthClient {
    pub fn new(
        candidates: Vec<String>,
        options: LoginOptions,
        attempts_per_candidate: u32,
        max_continuation_hops: u32,
    ) -> Self {
        let attempts = AuthAttempts::new(
            candidates.len(),
            attempts_per_candidate,
            max_continuation_hops,
        );
        let method = options.method.clone();
        Self {
            candidates,
            attempts,
            options,
            method,
            continuation_url: None,
            accepted_notice: None,
            pending: None,
            requests_sent: 0,
            last_failure: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.candidates.clone(),
            LoginOptions::from_config(config),
            config.auth_attempts_per_candidate,
            config.max_continuation_hops,
        )
    }

    /// URL the next request goes to
    pub fn endpoint(&self) -> Option<&str> {
        self.continuation_url
            .as_deref()
            .or_else(|| self.candidates.get(self.attempts.cursor()).map(String::as_str))
    }

    pub fn cursor(&self) -> usize {
        self.attempts.cursor()
    }

    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Flags the notice as accepted on the next request only
    pub fn accept_notice(&mut self, kind: NoticeKind) {
        self.accepted_notice = Some(kind);
    }

    /// Drops any request in flight. Its reply will be discarded
    pub fn abandon(&mut self) {
        self.pending = None;
    }

    /// Dispatches a login request to the current endpoint. Returns false when
    /// no endpoint is left to try
    pub fn send_request(&mut self, credentials: &Credentials, http: &mut dyn HttpClient) -> bool {
        let Some(url) = self.endpoint().map(str::to_string) else {
            return false;
        };

        let (first, last) = credentials.first_last();
        let accepted = self.accepted_notice.take();
        let request = LoginRequest {
            method: self.method.clone(),
            first,
            last,
            secret: credentials.secret().to_string(),
            start: self.options.start.to_param(),
            channel: self.options.channel.clone(),
            version: self.options.version.clone(),
            platform: self.options.platform.clone(),
            agree_to_tos: accepted == Some(NoticeKind::TermsOfService),
            read_critical: accepted == Some(NoticeKind::CriticalMessage),
            options: self.options.requested_options.clone(),
        };

        info!(
            "Authenticating {} {} with {} (method {})",
            request.first, request.last, url, request.method
        );

        self.pending = Some(http.post(&url, request.to_bytes(), JSON_CONTENT_TYPE));
        self.requests_sent += 1;
        true
    }

    /// Checks the request in flight. `None` while no reply has arrived
    pub fn poll(&mut self) -> Option<AuthOutcome> {
        let Some(receiver) = self.pending.as_mut() else {
            if self.attempts.is_exhausted() {
                return Some(AuthOutcome::TerminallyFailed(self.exhausted_error()));
            }
            return None;
        };

        let result = receiver.receive();
        if result.is_waiting() {
            return None;
        }
        self.pending = None;

        let endpoint = self.endpoint().unwrap_or_default().to_string();
        let outcome = match result {
            ResponseResult::Success(body) => self.classify(endpoint, &body),
            ResponseResult::ErrorResponseCode(code) => {
                self.transport_failure(LoginError::Transport {
                    endpoint,
                    reason: format!("HTTP status {}", code),
                })
            }
            ResponseResult::TransportFailure(reason) => {
                self.transport_failure(LoginError::Transport { endpoint, reason })
            }
            ResponseResult::Waiting => return None,
        };
        Some(outcome)
    }

    fn classify(&mut self, endpoint: String, body: &[u8]) -> AuthOutcome {
        let response = match LoginResponse::from_bytes(body) {
            Ok(response) => response,
            Err(source) => {
                return self.transport_failure(LoginError::ProtocolViolation { endpoint, source })
            }
        };

        match response.status() {
            LoginStatus::Success => match SessionGrant::from_response(&response) {
                Ok(grant) => {
                    info!(
                        "Login accepted by {}: agent {}, region {}",
                        endpoint,
                        grant.agent_id(),
                        grant.server_address()
                    );
                    self.attempts.record_reply();
                    AuthOutcome::Success(grant)
                }
                Err(source) => {
                    self.transport_failure(LoginError::ProtocolViolation { endpoint, source })
                }
            },
            LoginStatus::Indeterminate => {
                self.attempts.record_reply();
                if !self.attempts.record_hop() {
                    warn!("Login continuation limit reached at {}", endpoint);
                    return AuthOutcome::TerminallyFailed(LoginError::TooManyContinuations {
                        hops: self.attempts.hops(),
                    });
                }
                if let Some(method) = response.next_method() {
                    self.method = method.to_string();
                }
                if let Some(url) = response.next_url() {
                    self.continuation_url = Some(url.to_string());
                }
                info!(
                    "Login continues with method {} at {}",
                    self.method,
                    self.endpoint().unwrap_or_default()
                );
                AuthOutcome::Retryable(RetryReason::Continuation {
                    message: response.message().to_string(),
                })
            }
            LoginStatus::Failed => {
                self.attempts.record_reply();
                if response.reason() == Some("key") {
                    return AuthOutcome::CredentialsInvalid;
                }
                if let Some(kind) = response.notice_kind() {
                    return AuthOutcome::TermsRequired {
                        kind,
                        message: response.message().to_string(),
                    };
                }
                let message = match (response.message(), response.reason()) {
                    ("", Some(reason)) => reason.to_string(),
                    ("", None) => "the login server gave no reason".to_string(),
                    (message, _) => message.to_string(),
                };
                AuthOutcome::TerminallyFailed(LoginError::Rejected { message })
            }
        }
    }

    fn transport_failure(&mut self, error: LoginError) -> AuthOutcome {
        warn!("Login attempt failed: {}", error);
        self.last_failure = Some(error.clone());

        match self.attempts.record_failure() {
            AttemptVerdict::RetrySame { attempt } => AuthOutcome::Retryable(RetryReason::Transport {
                error,
                cursor: self.attempts.cursor(),
                attempt,
            }),
            AttemptVerdict::Advanced { cursor } => {
                self.continuation_url = None;
                self.method = self.options.method.clone();
                info!(
                    "Moving on to login endpoint #{}: {}",
                    cursor + 1,
                    self.endpoint().unwrap_or_default()
                );
                AuthOutcome::Retryable(RetryReason::Transport {
                    error,
                    cursor,
                    attempt: 1,
                })
            }
            AttemptVerdict::Exhausted => AuthOutcome::TerminallyFailed(self.exhausted_error()),
        }
    }

    fn exhausted_error(&self) -> LoginError {
        LoginError::EndpointsExhausted {
            attempts: self.attempts.total_failures(),
            candidates: self.candidates.len(),
            last: self
                .last_failure
                .as_ref()
                .map(|error| error.to_string())
                .unwrap_or_else(|| "no login endpoint configured".to_string()),
        }
    }
}
