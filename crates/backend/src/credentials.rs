use std::env;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::remote::BackendError;

/// Holder of the opaque sign-in token.
///
/// Passed explicitly to every adapter at construction; clones share the same
/// slot, so signing out through one handle is seen by all of them.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let credentials = Self::default();
        credentials.sign_in(token);
        credentials
    }

    /// Reads `PREP_TOKEN`; blank values count as signed out.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("PREP_TOKEN") {
            Ok(token) => Self::with_token(token),
            Err(_) => Self::anonymous(),
        }
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        let token = token.into();
        let value = if token.trim().is_empty() {
            None
        } else {
            Some(token.trim().to_owned())
        };
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn sign_out(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    /// The token, or `BackendError::Unauthenticated` before any request is built.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthenticated` when no token is held.
    pub fn require(&self) -> Result<String, BackendError> {
        self.token().ok_or(BackendError::Unauthenticated)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}
