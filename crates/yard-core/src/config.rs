//! The resource registry.
//!
//! A [`Config`] holds every declared resource in registration order together
//! with the optional blueprint metadata. Resources are looked up by address
//! and never removed during a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::resource::{Network, Resource};
use crate::status::Status;
use crate::{Address, Error, Result};

/// Name of the reserved network every blueprint can attach to.
pub const WAN_NETWORK: &str = "wan";
/// Subnet of the reserved network.
pub const WAN_SUBNET: &str = "10.200.0.0/16";

/// Descriptive metadata for a blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub title: String,
    pub author: String,
    pub slug: String,
    /// URLs opened in a browser once the blueprint is applied.
    pub browser_windows: Vec<String>,
    /// Introductory text shown after apply.
    pub intro: Option<String>,
}

/// Ordered collection of declared resources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub blueprint: Option<Blueprint>,
    resources: Vec<Resource>,
    #[serde(skip)]
    index: HashMap<Address, usize>,
}

impl Config {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the reserved `network.wan`.
    pub fn with_wan() -> Self {
        let mut config = Self::new();
        let wan = Network::new(WAN_NETWORK).with_subnet(WAN_SUBNET);
        config.push(wan.into());
        config
    }

    /// Append a resource.
    ///
    /// Fails with [`Error::ResourceExists`] if the address is taken; the
    /// registry is left untouched in that case.
    pub fn add_resource(&mut self, resource: impl Into<Resource>) -> Result<()> {
        let resource = resource.into();
        let address = resource.address();

        if self.index.contains_key(&address) {
            return Err(Error::ResourceExists { address });
        }

        debug!(%address, position = self.resources.len(), "registering resource");
        self.push(resource);
        Ok(())
    }

    fn push(&mut self, resource: Resource) {
        self.index.insert(resource.address(), self.resources.len());
        self.resources.push(resource);
    }

    /// Look up a resource by its raw `type.name` address.
    ///
    /// e.g. `config.find_resource("cluster.k3s")`
    pub fn find_resource(&self, address: &str) -> Result<&Resource> {
        let address = Address::parse(address)?;
        self.find(&address)
    }

    /// Look up a resource by parsed address.
    pub fn find(&self, address: &Address) -> Result<&Resource> {
        self.position(address)
            .map(|i| &self.resources[i])
            .ok_or_else(|| Error::ResourceNotFound {
                address: address.clone(),
                referenced_by: None,
            })
    }

    /// Registration index of the resource at `address`.
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.index.get(address).copied()
    }

    /// Resource at a registration index.
    pub fn get(&self, index: usize) -> Option<&Resource> {
        self.resources.get(index)
    }

    /// All resources in registration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    pub fn set_blueprint(&mut self, blueprint: Blueprint) {
        self.blueprint = Some(blueprint);
    }

    /// Move a resource to a new status, returning the previous one.
    ///
    /// Only transitions allowed by [`Status::can_transition_to`] are accepted.
    pub fn set_status(&mut self, address: &Address, status: Status) -> Result<Status> {
        let position = self
            .position(address)
            .ok_or_else(|| Error::ResourceNotFound {
                address: address.clone(),
                referenced_by: None,
            })?;

        let info = self.resources[position].info_mut();
        let previous = info.status;
        info.status = previous.transition(status, address)?;

        debug!(%address, from = %previous, to = %status, "status transition");
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Cluster, Container, Helm, ResourceType};

    #[test]
    fn test_added_resources_are_found_by_address() {
        let mut config = Config::new();
        config.add_resource(Network::new("cloud")).unwrap();
        config.add_resource(Cluster::new("k3s")).unwrap();
        config.add_resource(Container::new("consul")).unwrap();

        for resource in config.resources() {
            let raw = format!("{}.{}", resource.kind(), resource.name());
            let found = config.find_resource(&raw).unwrap();
            assert_eq!(found, resource);
        }
        assert_eq!(config.resource_count(), 3);
    }

    #[test]
    fn test_duplicate_address_is_rejected() {
        let mut config = Config::new();
        config.add_resource(Container::new("consul")).unwrap();

        let err = config
            .add_resource(Container::new("consul").with_image("consul:1.7"))
            .unwrap_err();
        assert_eq!(
            err,
            Error::ResourceExists {
                address: Address::new(ResourceType::Container, "consul")
            }
        );
        assert_eq!(config.resource_count(), 1);
        assert_eq!(
            config.resources()[0],
            Resource::from(Container::new("consul"))
        );
    }

    #[test]
    fn test_same_name_different_type_is_allowed() {
        let mut config = Config::new();
        config.add_resource(Cluster::new("consul")).unwrap();
        config.add_resource(Helm::new("consul")).unwrap();
        config.add_resource(Container::new("consul")).unwrap();

        assert_eq!(config.resource_count(), 3);
        assert_eq!(
            config.find_resource("helm.consul").unwrap().kind(),
            ResourceType::Helm
        );
    }

    #[test]
    fn test_find_missing_resource() {
        let config = Config::with_wan();
        assert!(matches!(
            config.find_resource("cluster.k3s"),
            Err(Error::ResourceNotFound { ref address, referenced_by: None })
                if address.to_string() == "cluster.k3s"
        ));
        // bare names never match
        assert!(matches!(
            config.find_resource("wan"),
            Err(Error::MalformedAddress { .. })
        ));
    }

    #[test]
    fn test_find_malformed_address_does_not_panic() {
        let mut config = Config::new();
        config.add_resource(Cluster::new("k3s")).unwrap();

        for raw in ["cluster", "", "cluster.k3s.extra", ".k3s"] {
            assert!(matches!(
                config.find_resource(raw),
                Err(Error::MalformedAddress { .. })
            ));
        }
    }

    #[test]
    fn test_with_wan_registers_reserved_network() {
        let config = Config::with_wan();
        let wan = config.find_resource("network.wan").unwrap();
        match wan {
            Resource::Network(n) => assert_eq!(n.subnet, WAN_SUBNET),
            other => panic!("unexpected resource: {:?}", other),
        }
        assert!(Config::new().is_empty());
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut config = Config::new();
        for name in ["c", "a", "b"] {
            config.add_resource(Container::new(name)).unwrap();
        }
        let names: Vec<_> = config.resources().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(
            config.position(&Address::new(ResourceType::Container, "b")),
            Some(2)
        );
    }

    #[test]
    fn test_set_status_follows_lifecycle() {
        let mut config = Config::new();
        config.add_resource(Cluster::new("k3s")).unwrap();
        let address = Address::new(ResourceType::Cluster, "k3s");

        let previous = config.set_status(&address, Status::Applied).unwrap();
        assert_eq!(previous, Status::PendingCreation);
        assert_eq!(config.find(&address).unwrap().status(), Status::Applied);

        config
            .set_status(&address, Status::PendingModification)
            .unwrap();
        config.set_status(&address, Status::Failed).unwrap();

        let err = config.set_status(&address, Status::Applied).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: Status::Failed,
                to: Status::Applied,
                ..
            }
        ));
        assert_eq!(config.find(&address).unwrap().status(), Status::Failed);
    }

    #[test]
    fn test_set_status_unknown_resource() {
        let mut config = Config::new();
        let address = Address::new(ResourceType::Docs, "site");
        assert!(matches!(
            config.set_status(&address, Status::Applied),
            Err(Error::ResourceNotFound { .. })
        ));
    }
}
