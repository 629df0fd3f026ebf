//! Session identity resolution.
//!
//! # Responsibility
//! - Resolve the identity of the caller for one request.
//! - Hold the process-local signed-in identity for UI and CLI callers.
//!
//! # Invariants
//! - "Not signed in" is `None`, never an error.
//! - An identity with a blank `id` is never handed out.

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque owner id stamped onto created records.
    pub id: String,
    pub email: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    fn is_usable(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Public view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
}

/// Resolves the identity for the current request.
pub trait SessionProvider {
    fn current_identity(&self) -> Option<Identity>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for &P {
    fn current_identity(&self) -> Option<Identity> {
        (**self).current_identity()
    }
}

impl<P: SessionProvider + ?Sized> SessionProvider for Arc<P> {
    fn current_identity(&self) -> Option<Identity> {
        (**self).current_identity()
    }
}

/// Session that never has an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl SessionProvider for Anonymous {
    fn current_identity(&self) -> Option<Identity> {
        None
    }
}

/// Session pinned to one identity, for request-scoped callers.
#[derive(Debug, Clone)]
pub struct FixedSession(Option<Identity>);

impl FixedSession {
    pub fn new(identity: Identity) -> Self {
        Self(Some(identity))
    }
}

impl SessionProvider for FixedSession {
    fn current_identity(&self) -> Option<Identity> {
        self.0.clone().filter(Identity::is_usable)
    }
}

/// Shared, mutable session slot. Clones observe the same identity.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Identity>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the signed-in identity.
    ///
    /// Returns `false` and leaves the session signed out when `identity.id`
    /// is blank.
    pub fn sign_in(&self, identity: Identity) -> bool {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !identity.is_usable() {
            *slot = None;
            info!("event=session_sign_in module=session status=error error_code=blank_identity");
            return false;
        }
        *slot = Some(identity);
        info!("event=session_sign_in module=session status=ok");
        true
    }

    pub fn sign_out(&self) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        info!("event=session_sign_out module=session status=ok");
    }
}

impl SessionProvider for SessionHandle {
    fn current_identity(&self) -> Option<Identity> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(Identity::is_usable)
    }
}

/// Returns the signed-in user's public view, or `None` when signed out.
pub fn current_user(session: &impl SessionProvider) -> Option<CurrentUser> {
    session
        .current_identity()
        .map(|identity| CurrentUser {
            email: identity.email,
        })
}
