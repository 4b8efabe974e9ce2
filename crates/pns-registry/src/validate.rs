//! Input checks run before any network call.

use pns_types::{ContainerAddress, PublicName, ServiceKey, SubName, TypeError};

use crate::error::{RegistryError, RegistryResult};

fn reason(err: TypeError) -> String {
    match err {
        TypeError::InvalidName { name, reason, .. } => format!("{name:?}: {reason}"),
        other => other.to_string(),
    }
}

pub fn public_name(raw: &str) -> RegistryResult<PublicName> {
    PublicName::new(raw).map_err(|e| RegistryError::InvalidPublicName(reason(e)))
}

pub fn sub_name(raw: &str) -> RegistryResult<SubName> {
    SubName::new(raw).map_err(|e| RegistryError::InvalidSubName(reason(e)))
}

pub fn service_key(sub: &SubName, service_name: &str) -> RegistryResult<ServiceKey> {
    ServiceKey::derive(sub, service_name).map_err(|e| RegistryError::InvalidServiceName(reason(e)))
}

/// A service must point at a real container.
pub fn resource(address: &ContainerAddress) -> RegistryResult<()> {
    if address.is_null() {
        return Err(RegistryError::InvalidServiceName(
            "service resource address must not be null".into(),
        ));
    }
    Ok(())
}

/// Paths in the public container are `/`-separated with no empty segments.
pub fn service_path(path: &str) -> RegistryResult<()> {
    if path.is_empty() {
        return Err(RegistryError::InvalidServicePath("path must not be empty".into()));
    }
    if path.split('/').any(|segment| segment.trim().is_empty()) {
        return Err(RegistryError::InvalidServicePath(format!(
            "{path:?} contains an empty segment"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_map_to_field_errors() {
        assert!(matches!(public_name(" "), Err(RegistryError::InvalidPublicName(_))));
        assert!(matches!(sub_name(""), Err(RegistryError::InvalidSubName(_))));
        let sub = sub_name("files").unwrap();
        assert!(matches!(
            service_key(&sub, ""),
            Err(RegistryError::InvalidServiceName(_))
        ));
    }

    #[test]
    fn null_resource_rejected() {
        assert!(resource(&ContainerAddress::null()).is_err());
        assert!(resource(&ContainerAddress::from_hash([1; 32])).is_ok());
    }

    #[test]
    fn service_path_segments() {
        assert!(service_path("_public/files-happybeing/root-ldp").is_ok());
        assert!(service_path("_public//root-ldp").is_err());
        assert!(service_path("").is_err());
    }
}
