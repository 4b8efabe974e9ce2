use std::sync::Arc;

use pns_registry::Pns;
use pns_store::InMemoryNetwork;
use tokio::net::TcpListener;

use crate::auth::{AllowAllAuth, AuthProvider};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::{AppState, Persistence};

/// PNS HTTP gateway over an in-memory network.
pub struct PnsServer {
    config: ServerConfig,
    state: AppState,
}

impl PnsServer {
    /// Open the network (from `state_file` when it exists) and wire the
    /// registry with the given auth provider.
    pub fn new(config: ServerConfig, auth: Arc<dyn AuthProvider>) -> ServerResult<Self> {
        let network = Arc::new(match &config.state_file {
            Some(path) => InMemoryNetwork::load_or_new(path)?,
            None => InMemoryNetwork::new(),
        });
        let pns = Pns::new(network.clone(), config.registry.clone());
        let mut state =
            AppState::new(pns, auth).with_anonymous_read(config.allow_anonymous_read);
        if let Some(path) = &config.state_file {
            state = state.with_persistence(Persistence::new(network, path.clone()));
        }
        Ok(Self { config, state })
    }

    /// A server that accepts any bearer token.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        Self::new(config, Arc::new(AllowAllAuth))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("PNS gateway listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
