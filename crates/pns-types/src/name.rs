//! Public names, sub names and service keys.
//!
//! Valid public names:
//! - Are trimmed of surrounding whitespace before any other check
//! - Must be non-empty after trimming
//! - Must not contain whitespace, `.`, `/`, `:`, `@`, `?`, `#`
//!
//! Sub names follow the same rules except that interior dots are allowed
//! (`blog.files`), so long as no label is empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The canonical hosting service. Its key is the bare sub name.
pub const HOSTING_SERVICE: &str = "www";

/// Characters that would make a name ambiguous inside `scheme://sub.name`.
const FORBIDDEN_CHARS: &[char] = &['/', ':', '@', '?', '#', '\\'];

fn invalid(kind: &'static str, name: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidName {
        kind,
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn check_label_chars(kind: &'static str, name: &str) -> Result<(), TypeError> {
    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(kind, name, format!("contains whitespace or control character {ch:?}")));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(kind, name, format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// A normalized public name registered in the naming directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicName(String);

impl PublicName {
    /// Trim and validate a raw public name.
    ///
    /// ```
    /// use pns_types::PublicName;
    ///
    /// assert_eq!(PublicName::new("  happybeing ").unwrap().as_str(), "happybeing");
    /// assert!(PublicName::new("   ").is_err());
    /// assert!(PublicName::new("a.b").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, TypeError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(invalid("public name", raw, "must not be empty"));
        }
        check_label_chars("public name", name)?;
        if name.contains('.') {
            return Err(invalid("public name", name, "must not contain '.'"));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PublicName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PublicName> for String {
    fn from(name: PublicName) -> Self {
        name.0
    }
}

/// The subdomain part of a service URI (`files` in `safe://files.files-happybeing`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubName(String);

impl SubName {
    pub fn new(raw: &str) -> Result<Self, TypeError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(invalid("sub name", raw, "must not be empty"));
        }
        check_label_chars("sub name", name)?;
        if name.split('.').any(str::is_empty) {
            return Err(invalid("sub name", name, "labels between dots must not be empty"));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<SubName> for String {
    fn from(name: SubName) -> Self {
        name.0
    }
}

/// Lookup key of a service entry inside a services container.
///
/// The hosting service (`www`) is keyed by the sub name alone; every other
/// service is keyed `sub@service`, so one sub name can carry several services.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKey(String);

impl ServiceKey {
    /// Derive the key for `service_name` published under `sub_name`.
    ///
    /// ```
    /// use pns_types::{ServiceKey, SubName};
    ///
    /// let sub = SubName::new("files").unwrap();
    /// assert_eq!(ServiceKey::derive(&sub, "www").unwrap().as_str(), "files");
    /// assert_eq!(ServiceKey::derive(&sub, "ldp").unwrap().as_str(), "files@ldp");
    /// ```
    pub fn derive(sub_name: &SubName, service_name: &str) -> Result<Self, TypeError> {
        let service = service_name.trim();
        if service.is_empty() {
            return Err(invalid("service name", service_name, "must not be empty"));
        }
        check_label_chars("service name", service)?;
        if service == HOSTING_SERVICE {
            Ok(Self(sub_name.as_str().to_string()))
        } else {
            Ok(Self(format!("{}@{service}", sub_name.as_str())))
        }
    }

    /// Wrap a key read back from a services container.
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the key back into its sub name and service name.
    pub fn parts(&self) -> (&str, &str) {
        match self.0.split_once('@') {
            Some((sub, service)) => (sub, service),
            None => (&self.0, HOSTING_SERVICE),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
