//! Identity profile payload exchanged with profile tooling.
//!
//! Profiles arrive from user-facing forms where any field may be blank. The
//! payload is normalized once, here, into a typed struct: blank strings
//! become `None`, and the fields a profile cannot exist without are checked.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A validated identity profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    /// Identity URI, e.g. `safe://happybeing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Short handle; required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_mime_type: Option<String>,
    /// Storage URI produced by storage provisioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

fn non_blank(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl IdentityProfile {
    /// Drop blank fields and check that `uri` and `nick` are present.
    pub fn sanitized(self) -> Result<Self, TypeError> {
        let profile = Self {
            uri: non_blank(self.uri),
            nick: non_blank(self.nick),
            name: non_blank(self.name),
            website: non_blank(self.website),
            image: non_blank(self.image),
            image_mime_type: non_blank(self.image_mime_type),
            storage: non_blank(self.storage),
        };
        if profile.uri.is_none() {
            return Err(TypeError::InvalidProfile("uri is required".into()));
        }
        if profile.nick.is_none() {
            return Err(TypeError::InvalidProfile("nick is required".into()));
        }
        if profile.image.is_some() && profile.image_mime_type.is_none() {
            return Err(TypeError::InvalidProfile(
                "imageMimeType is required when image is set".into(),
            ));
        }
        Ok(profile)
    }

    /// Decode a profile document from its stored JSON form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Encode the profile document as JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
