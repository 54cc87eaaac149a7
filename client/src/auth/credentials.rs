use std::fmt;

// Accounts with a single-word name log in under this last name
const DEFAULT_LAST_NAME: &str = "Resident";

/// What the user typed into the login form
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    secret: String,
    remember: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            remember: false,
        }
    }

    pub fn with_remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn remember(&self) -> bool {
        self.remember
    }

    pub fn set_remember(&mut self, remember: bool) {
        self.remember = remember;
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    pub fn clear_secret(&mut self) {
        self.secret.clear();
    }

    /// Splits "First Last" into its parts. "First" alone gets the default
    /// last name; anything after the second word is ignored
    pub fn first_last(&self) -> (String, String) {
        let mut words = self.username.split_whitespace();
        let first = words.next().unwrap_or_default().to_string();
        let last = words.next().unwrap_or(DEFAULT_LAST_NAME).to_string();
        (first, last)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// Persistent home of remembered credentials
pub trait CredentialStore: Send {
    fn load(&self) -> Option<Credentials>;
    fn save(&mut self, credentials: &Credentials);
    /// Forgets the secret but keeps the account name
    fn clear_secret(&mut self);
}

/// Keeps credentials for the lifetime of the process only
#[derive(Default)]
pub struct MemoryCredentialStore {
    stored: Option<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            stored: Some(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credentials> {
        self.stored.clone()
    }

    fn save(&mut self, credentials: &Credentials) {
        self.stored = Some(credentials.clone());
    }

    fn clear_secret(&mut self) {
        if let Some(stored) = self.stored.as_mut() {
            stored.clear_secret();
        }
    }
}
