use std::{
    mem,
    sync::mpsc::{self, Receiver, Sender},
    time::Instant,
};

use log::{info, warn};

use grid_shared::{NoticeKind, Timer};

use crate::{
    auth::{AuthClient, AuthOutcome, CredentialStore, Credentials, RetryReason},
    bootstrap::BootstrapCoordinator,
    capability::{CapabilityWaiter, GrantStatus},
    circuit::{CircuitHandle, CircuitNegotiator, RetryOutcome},
    events::{SessionEvents, StateChange},
    session::{context::Session, SessionState},
    ClientConfig, ConfigError, Io, LoginError, SessionGrant,
};

/// Drives one session from credential entry to READY.
///
/// The host calls [`SessionStateMachine::tick`] once per frame. A tick does
/// one unit of work for the current state (send a request, poll one, check a
/// tracker) and takes at most one transition. Nothing here blocks; waiting
/// means staying in the same state until a later tick.
pub struct SessionStateMachine {
    config: ClientConfig,
    io: Io,
    store: Box<dyn CredentialStore>,
    state: SessionState,
    session: Session,
    status: (f32, String),
    last_error: Option<LoginError>,
    bootstrap_failures: Vec<LoginError>,
    events: SessionEvents,
    subscribers: Vec<Sender<StateChange>>,
    auto_login_attempted: bool,
    rejected_transitions: usize,
}

impl SessionStateMachine {
    pub fn new(
        config: ClientConfig,
        io: Io,
        store: Box<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            io,
            store,
            state: SessionState::Init,
            session: Session::default(),
            status: (0.0, String::new()),
            last_error: None,
            bootstrap_failures: Vec::new(),
            events: SessionEvents::new(),
            subscribers: Vec::new(),
            auto_login_attempted: false,
            rejected_transitions: 0,
        })
    }

    // Public

    pub fn tick(&mut self, now: Instant) {
        let next = match self.state {
            SessionState::Init => Some(SessionState::ShowCredentials),
            SessionState::ShowCredentials => self.show_credentials(),
            SessionState::Authenticating => self.authenticating(),
            SessionState::AuthRetry => Some(SessionState::Authenticating),
            SessionState::NoticeWait => self.notice_wait(),
            SessionState::CircuitNegotiate => self.circuit_negotiate(&now),
            SessionState::CircuitWait => self.circuit_wait(&now),
            SessionState::CapabilityWait => self.capability_wait(&now),
            SessionState::BootstrapSend => self.bootstrap_send(&now),
            SessionState::BootstrapWait => self.bootstrap_wait(&now),
            SessionState::Precache => self.precache(&now),
            SessionState::Ready => None,
        };

        if let Some(next) = next {
            self.transition(next);
        }
        self.status = self.compute_status(&now);
    }

    pub fn tick_now(&mut self) {
        self.tick(Instant::now());
    }

    pub fn current_state(&self) -> SessionState {
        self.state
    }

    /// Progress fraction and message for a progress bar, as of the last tick
    pub fn status_text(&self) -> (f32, String) {
        self.status.clone()
    }

    /// Hands over the credentials the user entered. Only accepted while
    /// credentials are being shown
    pub fn submit_credentials(&mut self, credentials: Credentials) -> bool {
        if self.state != SessionState::ShowCredentials {
            warn!(
                "Ignoring credentials submitted in state {}",
                self.state.name()
            );
            return false;
        }
        self.last_error = None;
        self.session.credentials = Some(credentials);
        true
    }

    pub fn accept_notice(&mut self) -> bool {
        self.reply_to_notice(true)
    }

    pub fn decline_notice(&mut self) -> bool {
        self.reply_to_notice(false)
    }

    /// The notice awaiting a reply, if any
    pub fn pending_notice(&self) -> Option<&(NoticeKind, String)> {
        self.session.notice.as_ref()
    }

    /// Abandons everything in flight and returns to credential entry
    pub fn reset(&mut self) {
        info!("Resetting session from {}", self.state.name());
        self.teardown();
        self.last_error = None;
        self.transition(SessionState::ShowCredentials);
        self.status = self.compute_status(&Instant::now());
    }

    /// Tells the server instance the agent is leaving, then resets
    pub fn logout(&mut self) {
        if let Some(circuit) = self.session.circuit.as_mut() {
            circuit.send_logout(self.io.sender());
        }
        self.reset();
    }

    /// Subscribes to state changes. Dropped receivers are pruned on the next
    /// change
    pub fn subscribe(&mut self) -> Receiver<StateChange> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Drains the events collected since the last call
    pub fn take_events(&mut self) -> SessionEvents {
        mem::take(&mut self.events)
    }

    pub fn grant(&self) -> Option<&SessionGrant> {
        self.session.grant.as_ref()
    }

    pub fn circuit(&self) -> Option<&CircuitHandle> {
        self.session.circuit.as_ref().map(CircuitNegotiator::handle)
    }

    pub fn bootstrap(&self) -> Option<&BootstrapCoordinator> {
        self.session.bootstrap.as_ref()
    }

    pub fn capabilities(&self) -> Option<&CapabilityWaiter> {
        self.session.capabilities.as_ref()
    }

    /// The error behind the last rollback to credential entry
    pub fn last_error(&self) -> Option<&LoginError> {
        self.last_error.as_ref()
    }

    /// Non-fatal bootstrap losses of the current session
    pub fn bootstrap_failures(&self) -> &[LoginError] {
        &self.bootstrap_failures
    }

    /// Transitions refused because the state graph has no such edge. Stays
    /// at zero unless the machine has a bug
    pub fn rejected_transitions(&self) -> usize {
        self.rejected_transitions
    }

    pub fn credential_store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // State handlers

    fn show_credentials(&mut self) -> Option<SessionState> {
        if self.session.credentials.is_some() {
            return Some(SessionState::Authenticating);
        }

        if self.config.auto_login && !self.auto_login_attempted {
            self.auto_login_attempted = true;
            if let Some(credentials) = self.store.load() {
                if credentials.remember() && credentials.has_secret() {
                    info!("Logging in with remembered credentials");
                    self.session.credentials = Some(credentials);
                    return Some(SessionState::Authenticating);
                }
            }
        }
        None
    }

    fn authenticating(&mut self) -> Option<SessionState> {
        let Some(credentials) = self.session.credentials.as_ref() else {
            warn!("Authenticating without credentials");
            return self.rollback();
        };
        let auth = self
            .session
            .auth
            .get_or_insert_with(|| AuthClient::from_config(&self.config));

        if !auth.is_waiting() && auth.send_request(credentials, self.io.http()) {
            return None;
        }

        let outcome = auth.poll()?;
        self.on_auth_outcome(outcome)
    }

    fn on_auth_outcome(&mut self, outcome: AuthOutcome) -> Option<SessionState> {
        match outcome {
            AuthOutcome::Success(grant) => {
                if let Some(credentials) = self.session.credentials.as_ref() {
                    if credentials.remember() {
                        self.store.save(credentials);
                    }
                }
                self.session.auth = None;
                self.session.status_message = None;
                self.session.grant = Some(grant);
                Some(SessionState::CircuitNegotiate)
            }
            AuthOutcome::Retryable(RetryReason::Transport { cursor, attempt, .. }) => {
                self.session.status_message = Some(format!(
                    "Retrying login (server {}, attempt {})",
                    cursor + 1,
                    attempt
                ));
                Some(SessionState::AuthRetry)
            }
            AuthOutcome::Retryable(RetryReason::Continuation { message }) => {
                self.session.status_message = (!message.is_empty()).then_some(message);
                Some(SessionState::AuthRetry)
            }
            AuthOutcome::TermsRequired { kind, message } => {
                info!("Login requires acceptance of a notice ({:?})", kind);
                self.events.push_notice(kind, message.clone());
                self.session.notice = Some((kind, message));
                self.session.notice_reply = None;
                Some(SessionState::NoticeWait)
            }
            AuthOutcome::CredentialsInvalid => {
                self.store.clear_secret();
                if let Some(credentials) = self.session.credentials.as_mut() {
                    credentials.clear_secret();
                }
                self.fail(LoginError::CredentialsInvalid)
            }
            AuthOutcome::TerminallyFailed(error) => self.fail(error),
        }
    }

    fn notice_wait(&mut self) -> Option<SessionState> {
        let accepted = self.session.notice_reply.take()?;
        let Some((kind, _)) = self.session.notice.take() else {
            return self.rollback();
        };

        if !accepted {
            return self.fail(LoginError::NoticeDeclined { kind });
        }
        info!("Notice accepted, resuming login");
        if let Some(auth) = self.session.auth.as_mut() {
            auth.accept_notice(kind);
        }
        Some(SessionState::Authenticating)
    }

    fn circuit_negotiate(&mut self, now: &Instant) -> Option<SessionState> {
        let Some(grant) = self.session.grant.as_ref() else {
            warn!("No session grant to open a circuit with");
            return self.rollback();
        };

        let handle = CircuitHandle::from_grant(
            grant,
            self.config.circuit_resend_interval,
            self.config.circuit_max_attempts,
            now,
        );
        self.session.circuit = Some(CircuitNegotiator::open_circuit(handle, self.io.sender(), now));
        Some(SessionState::CircuitWait)
    }

    fn circuit_wait(&mut self, now: &Instant) -> Option<SessionState> {
        let Some(circuit) = self.session.circuit.as_mut() else {
            return self.rollback();
        };

        if circuit.poll_incoming(self.io.receiver()) {
            return Some(SessionState::CapabilityWait);
        }

        match circuit.retry_if_due(self.io.sender(), now) {
            RetryOutcome::NotDue => None,
            RetryOutcome::Resent { attempt } => {
                warn!("Resending circuit claim, attempt {}", attempt);
                None
            }
            RetryOutcome::Exhausted => {
                let error = LoginError::CircuitTimeout {
                    address: circuit.handle().address(),
                    attempts: circuit.attempts(),
                };
                self.fail(error)
            }
        }
    }

    fn capability_wait(&mut self, now: &Instant) -> Option<SessionState> {
        let Some(grant) = self.session.grant.as_ref() else {
            return self.rollback();
        };
        let config = &self.config;
        let waiter = self.session.capabilities.get_or_insert_with(|| {
            CapabilityWaiter::new(
                grant.capability_url(),
                grant.session_id(),
                config.requested_capabilities.clone(),
                config.capability_poll_interval,
                now,
            )
        });

        match waiter.poll_grant(self.io.http(), now) {
            GrantStatus::Granted => Some(SessionState::BootstrapSend),
            GrantStatus::Pending | GrantStatus::Retrying(_) => None,
        }
    }

    fn bootstrap_send(&mut self, now: &Instant) -> Option<SessionState> {
        let (Some(grant), Some(capabilities)) = (
            self.session.grant.as_ref(),
            self.session.capabilities.as_ref(),
        ) else {
            return self.rollback();
        };

        self.bootstrap_failures.clear();
        self.session.bootstrap = Some(BootstrapCoordinator::start(
            grant.manifest(),
            capabilities.fetch_url(),
            self.config.fetch_batch_size,
            self.config.fetch_timeout,
            self.io.http(),
            now,
        ));
        Some(SessionState::BootstrapWait)
    }

    fn bootstrap_wait(&mut self, now: &Instant) -> Option<SessionState> {
        let Some(bootstrap) = self.session.bootstrap.as_mut() else {
            return self.rollback();
        };

        for (kind, ids) in bootstrap.poll(self.io.http(), now) {
            let failure = LoginError::PartialBootstrapFailure {
                kind,
                count: ids.len(),
            };
            warn!("{}", failure);
            self.bootstrap_failures.push(failure);
            self.events.push_fetch_failure(kind, ids);
        }

        if !bootstrap.is_ready(now) {
            return None;
        }
        self.session.precache = Some(Timer::new(self.config.precache_delay, now));
        Some(SessionState::Precache)
    }

    fn precache(&mut self, now: &Instant) -> Option<SessionState> {
        match &self.session.precache {
            Some(timer) if !timer.ringing(now) => None,
            _ => Some(SessionState::Ready),
        }
    }

    // Private

    fn reply_to_notice(&mut self, accepted: bool) -> bool {
        if self.state != SessionState::NoticeWait {
            return false;
        }
        self.session.notice_reply = Some(accepted);
        true
    }

    fn transition(&mut self, next: SessionState) {
        if next == self.state {
            return;
        }
        if !self.state.can_transition_to(next) {
            self.rejected_transitions += 1;
            warn!(
                "Ignoring illegal transition {} -> {}",
                self.state.name(),
                next.name()
            );
            return;
        }

        let change = StateChange {
            from: self.state,
            to: next,
        };
        info!("Session {} -> {}", change.from.name(), change.to.name());
        self.state = next;

        self.events.push_state_change(change);
        if next == SessionState::Ready {
            self.events.push_ready();
        }
        self.subscribers
            .retain(|subscriber| subscriber.send(change).is_ok());
    }

    /// Records a fatal error and rolls back to credential entry
    fn fail(&mut self, error: LoginError) -> Option<SessionState> {
        warn!("Login failed in {}: {}", self.state.name(), error);
        self.events.push_login_failure(error.clone());
        self.last_error = Some(error);
        self.rollback()
    }

    fn rollback(&mut self) -> Option<SessionState> {
        self.teardown();
        Some(SessionState::ShowCredentials)
    }

    fn teardown(&mut self) {
        self.session = Session::default();
        self.bootstrap_failures.clear();
    }

    fn compute_status(&self, now: &Instant) -> (f32, String) {
        let message = |default: &str| {
            self.session
                .status_message
                .clone()
                .unwrap_or_else(|| default.to_string())
        };

        match self.state {
            SessionState::Init => (0.0, String::new()),
            SessionState::ShowCredentials => (
                0.0,
                self.last_error
                    .as_ref()
                    .map(|error| error.to_string())
                    .unwrap_or_default(),
            ),
            SessionState::Authenticating | SessionState::AuthRetry => {
                let sent = self
                    .session
                    .auth
                    .as_ref()
                    .map(AuthClient::requests_sent)
                    .unwrap_or(0);
                let fraction = (0.02 + 0.02 * sent.saturating_sub(1) as f32).min(0.10);
                (fraction, message("Logging in..."))
            }
            SessionState::NoticeWait => {
                let text = match &self.session.notice {
                    Some((NoticeKind::TermsOfService, _)) => {
                        "Please accept the terms of service to continue"
                    }
                    Some((NoticeKind::CriticalMessage, _)) => {
                        "Please read the critical message to continue"
                    }
                    None => "",
                };
                (0.10, text.to_string())
            }
            SessionState::CircuitNegotiate | SessionState::CircuitWait => {
                let attempts = self
                    .session
                    .circuit
                    .as_ref()
                    .map(CircuitNegotiator::attempts)
                    .unwrap_or(0);
                let text = if attempts > 1 {
                    format!("Connecting to region (attempt {})...", attempts)
                } else {
                    "Connecting to region...".to_string()
                };
                (0.40, text)
            }
            SessionState::CapabilityWait => {
                let attempt = self
                    .session
                    .capabilities
                    .as_ref()
                    .map(CapabilityWaiter::attempt)
                    .unwrap_or(0);
                let text = if attempt > 1 {
                    format!("Retrying region capability request (attempt {})", attempt)
                } else {
                    "Requesting region capabilities".to_string()
                };
                (0.45, text)
            }
            SessionState::BootstrapSend => (0.60, "Loading inventory...".to_string()),
            SessionState::BootstrapWait => {
                let progress = self
                    .session
                    .bootstrap
                    .as_ref()
                    .map(BootstrapCoordinator::progress)
                    .unwrap_or(0.0);
                (0.60 + 0.10 * progress, "Loading inventory...".to_string())
            }
            SessionState::Precache => {
                let progress = self
                    .session
                    .precache
                    .as_ref()
                    .map(|timer| timer.progress(now))
                    .unwrap_or(1.0);
                (0.70 + 0.30 * progress, "Loading world...".to_string())
            }
            SessionState::Ready => (1.0, String::new()),
        }
    }
}

