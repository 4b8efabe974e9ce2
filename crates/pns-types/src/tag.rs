use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema discriminator attached to a container when it is created.
///
/// The tag does not change how the network stores entries; it tells readers
/// what the keys and values of the container mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(pub u64);

impl TypeTag {
    /// Well-known directories bootstrapped by the network itself.
    pub const DIRECTORY: Self = Self(15000);
    /// Per-name services container (DNS-like lookup).
    pub const SERVICES: Self = Self(15001);
    /// Storage / hosting root folder for a `www`-style service.
    pub const WWW: Self = Self(15002);
    /// Identity profile document.
    pub const PROFILE: Self = Self(16048);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable metadata applied to a container during setup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub name: String,
    pub description: String,
}

impl ContainerMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Metadata for the services container of a public name.
    pub fn services_for(public_name: &str) -> Self {
        Self::new(
            format!("Services for {public_name}"),
            format!("Container where all the services are mapped for the public name {public_name}"),
        )
    }

    /// Metadata for the storage root folder of a provisioned service.
    pub fn storage_root_for(storage_name: &str) -> Self {
        Self::new(
            format!("Service Root Directory for: {storage_name}"),
            format!("Has the files hosted for the service: {storage_name}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_tags_are_distinct() {
        let tags = [
            TypeTag::DIRECTORY,
            TypeTag::SERVICES,
            TypeTag::WWW,
            TypeTag::PROFILE,
        ];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn tag_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&TypeTag::WWW).unwrap(), "15002");
    }

    #[test]
    fn storage_root_metadata_mentions_name() {
        let md = ContainerMetadata::storage_root_for("files-happybeing");
        assert_eq!(md.name, "Service Root Directory for: files-happybeing");
        assert_eq!(
            md.description,
            "Has the files hosted for the service: files-happybeing"
        );
    }
}
