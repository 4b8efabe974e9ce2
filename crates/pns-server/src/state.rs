use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderMap;
use pns_registry::Pns;
use pns_store::{InMemoryNetwork, Session};
use tokio::sync::Mutex;
use tracing::warn;

use crate::auth::{AuthProvider, Credentials};
use crate::error::{ServerError, ServerResult};

/// Where the in-memory network is snapshotted after each mutation.
///
/// Saves are serialized: each one snapshots and writes while holding the
/// lock, so a later save always reflects every earlier mutation.
#[derive(Clone)]
pub struct Persistence {
    network: Arc<InMemoryNetwork>,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl Persistence {
    pub fn new(network: Arc<InMemoryNetwork>, path: PathBuf) -> Self {
        Self {
            network,
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Snapshot the network and write it out on the blocking pool.
    pub async fn save(&self) -> ServerResult<()> {
        let _guard = self.lock.lock().await;
        let network = Arc::clone(&self.network);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || network.save(&path))
            .await
            .map_err(|e| ServerError::Internal(format!("snapshot task failed: {e}")))??;
        Ok(())
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pns: Pns,
    pub auth: Arc<dyn AuthProvider>,
    pub allow_anonymous_read: bool,
    pub persistence: Option<Persistence>,
}

impl AppState {
    pub fn new(pns: Pns, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            pns,
            auth,
            allow_anonymous_read: true,
            persistence: None,
        }
    }

    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_anonymous_read(mut self, allow: bool) -> Self {
        self.allow_anonymous_read = allow;
        self
    }

    /// Session for a read request.
    pub async fn reader(&self, headers: &HeaderMap) -> ServerResult<Session> {
        let credentials = Credentials::from_headers(headers)?;
        if credentials == Credentials::Anonymous && !self.allow_anonymous_read {
            return Err(ServerError::AuthRequired);
        }
        self.auth.authenticate(&credentials).await
    }

    /// Session for a mutating request; bearer credentials are mandatory.
    pub async fn writer(&self, headers: &HeaderMap) -> ServerResult<Session> {
        let credentials = Credentials::from_headers(headers)?;
        if credentials == Credentials::Anonymous {
            return Err(ServerError::AuthRequired);
        }
        self.auth.authenticate(&credentials).await
    }

    /// Write the snapshot, if configured. Save failures are only logged.
    pub async fn persist(&self) {
        if let Some(p) = &self.persistence {
            if let Err(e) = p.save().await {
                warn!(path = %p.path().display(), error = %e, "failed to save network snapshot");
            }
        }
    }
}
