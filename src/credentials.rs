//! Credential storage collaborators.

use std::sync::RwLock;

/// Store for the bearer token injected on every exchange.
///
/// `clear_token` is invoked synchronously when an authentication failure
/// is classified, so a known-invalid token is never reused by subsequent
/// requests — by the time the error reaches the caller, the token is gone.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn clear_token(&self);
}

/// In-memory store for single-process apps and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("credential lock poisoned") = Some(token.into());
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.read().expect("credential lock poisoned").clone()
    }

    fn clear_token(&self) {
        self.token.write().expect("credential lock poisoned").take();
    }
}
