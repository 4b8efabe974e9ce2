use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use pns_store::Session;

use crate::error::{ServerError, ServerResult};

/// App id given to requests without credentials.
pub const ANONYMOUS_APP: &str = "anonymous";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read an `Authorization: Bearer <token>` header.
    pub fn from_headers(headers: &HeaderMap) -> ServerResult<Self> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(Self::Anonymous);
        };
        let value = value
            .to_str()
            .map_err(|_| ServerError::AuthFailed("authorization header is not ASCII".into()))?;
        match value.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Self::Bearer(token.trim().to_string())),
            _ => Err(ServerError::AuthFailed("expected a bearer token".into())),
        }
    }
}

/// Turns request credentials into a network session.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Session>;
}

/// Accepts any bearer token; the token prefix becomes the app id.
pub struct AllowAllAuth;

#[async_trait]
impl AuthProvider for AllowAllAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Session> {
        match credentials {
            Credentials::Bearer(token) => {
                let prefix: String = token.chars().take(8).collect();
                let app = format!("bearer:{prefix}");
                Ok(Session::authorized(app, token.clone()))
            }
            Credentials::Anonymous => Ok(Session::unregistered(ANONYMOUS_APP)),
        }
    }
}

/// Fixed token → app id table.
#[derive(Default)]
pub struct StaticTokenAuth {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, app_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), app_id.into());
        self
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Session> {
        match credentials {
            Credentials::Bearer(token) => match self.tokens.get(token) {
                Some(app) => Ok(Session::authorized(app.clone(), token.clone())),
                None => Err(ServerError::AuthFailed("unknown token".into())),
            },
            Credentials::Anonymous => Ok(Session::unregistered(ANONYMOUS_APP)),
        }
    }
}
