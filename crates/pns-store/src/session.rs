//! Explicit network session handle.
//!
//! Every network call takes a `&Session`. An unregistered session can read
//! public data; anything that creates, sets up, encrypts or mutates requires
//! an authorized one.

use crate::error::{StoreError, StoreResult};

/// Authentication state of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAuth {
    /// Read-only access without credentials.
    Unregistered,
    /// Access granted by the network for the given token.
    Authorized { token: String },
}

/// A connection to the mutable-data network on behalf of one application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    app_id: String,
    auth: SessionAuth,
}

impl Session {
    /// A read-only session.
    pub fn unregistered(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            auth: SessionAuth::Unregistered,
        }
    }

    /// A session authorized with `token`.
    pub fn authorized(app_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            auth: SessionAuth::Authorized {
                token: token.into(),
            },
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn auth(&self) -> &SessionAuth {
        &self.auth
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self.auth, SessionAuth::Authorized { .. })
    }

    /// Fail with [`StoreError::NotAuthorized`] unless the session is authorized.
    pub fn require_authorized(&self, operation: &str) -> StoreResult<()> {
        if self.is_authorized() {
            Ok(())
        } else {
            Err(StoreError::NotAuthorized(format!(
                "{operation} requires an authorized session (app {})",
                self.app_id
            )))
        }
    }
}
