//! Identity and service URIs.
//!
//! An identity URI names a public identity: `safe://happybeing`, or with
//! leading labels, `safe://me.happybeing`. A service URI names a service
//! under a public name: `safe://files.files-happybeing`. Both are plain
//! ASCII strings; nothing here percent-encodes.

use std::fmt;

use pns_types::{PublicName, SubName, HOSTING_SERVICE};

use crate::error::{RegistryError, RegistryResult};
use crate::validate;

fn invalid(uri: &str, reason: impl Into<String>) -> RegistryError {
    RegistryError::InvalidUri {
        uri: uri.to_string(),
        reason: reason.into(),
    }
}

/// Split `scheme://host/...` into scheme and host, dropping any path,
/// query or fragment.
fn split_authority<'a>(raw: &'a str, default_scheme: &'a str) -> RegistryResult<(&'a str, &'a str)> {
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => (default_scheme, raw),
    };
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return Err(invalid(raw, format!("bad scheme {scheme:?}")));
    }
    let host = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    if host.is_empty() {
        return Err(invalid(raw, "missing host"));
    }
    if host.split('.').any(str::is_empty) {
        return Err(invalid(raw, "empty label in host"));
    }
    Ok((scheme, host))
}

/// A parsed identity URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityUri {
    pub scheme: String,
    /// Last host label: the public name of the identity.
    pub host: String,
    /// Labels before the host, joined by `.`; not used for provisioning yet.
    pub sub_path: Option<String>,
}

impl IdentityUri {
    /// Parse `raw`, assuming `default_scheme` when it has none.
    ///
    /// ```
    /// use pns_registry::IdentityUri;
    ///
    /// let uri = IdentityUri::parse("me.happybeing", "safe").unwrap();
    /// assert_eq!(uri.scheme, "safe");
    /// assert_eq!(uri.host, "happybeing");
    /// assert_eq!(uri.sub_path.as_deref(), Some("me"));
    /// ```
    pub fn parse(raw: &str, default_scheme: &str) -> RegistryResult<Self> {
        let raw = raw.trim();
        let (scheme, host) = split_authority(raw, default_scheme)?;
        let (sub_path, host) = match host.rsplit_once('.') {
            Some((subs, last)) => (Some(subs.to_string()), last),
            None => (None, host),
        };
        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            sub_path,
        })
    }
}

/// `scheme://sub.publicName`: the address of one service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceUri {
    pub scheme: String,
    pub sub_name: SubName,
    pub public_name: PublicName,
}

impl ServiceUri {
    pub fn new(scheme: impl Into<String>, sub_name: SubName, public_name: PublicName) -> Self {
        Self {
            scheme: scheme.into(),
            sub_name,
            public_name,
        }
    }

    /// Parse a service URI. A bare `scheme://name` addresses the `www` sub name.
    pub fn parse(raw: &str, default_scheme: &str) -> RegistryResult<Self> {
        let raw = raw.trim();
        let (scheme, host) = split_authority(raw, default_scheme)?;
        let (sub, name) = host.rsplit_once('.').unwrap_or((HOSTING_SERVICE, host));
        let sub_name = validate::sub_name(sub).map_err(|e| invalid(raw, e.to_string()))?;
        let public_name = validate::public_name(name).map_err(|e| invalid(raw, e.to_string()))?;
        Ok(Self::new(scheme, sub_name, public_name))
    }
}

impl fmt::Display for ServiceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}.{}", self.scheme, self.sub_name, self.public_name)
    }
}
