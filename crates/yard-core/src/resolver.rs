//! Reference resolution.
//!
//! Turns the `type.name` strings a resource declares into registry indices
//! (for `depends_on`) or resource references (for attributes such as a
//! container's network). Resolution is all-or-nothing: the first address that
//! does not resolve fails the whole pass.

use tracing::debug;

use crate::resource::{Network, Resource, ResourceType};
use crate::{Address, Config, Error, Result};

/// Resolved `depends_on` lists, indexed by registration position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependencies {
    dependencies: Vec<Vec<usize>>,
}

impl ResolvedDependencies {
    /// Registry indices the resource at `index` depends on, in declaration
    /// order and without repeats.
    pub fn of(&self, index: usize) -> &[usize] {
        self.dependencies
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `(dependent, dependencies)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.dependencies
            .iter()
            .enumerate()
            .map(|(i, deps)| (i, deps.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Read-only view over a registry that resolves addresses.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    config: &'a Config,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Resolve every `depends_on` entry of every resource.
    pub fn resolve_dependencies(&self) -> Result<ResolvedDependencies> {
        let mut dependencies = Vec::with_capacity(self.config.resource_count());

        for resource in self.config.resources() {
            let referrer = resource.address();
            let mut resolved: Vec<usize> = Vec::new();

            for raw in &resource.info().depends_on {
                let index = Address::parse(raw)
                    .and_then(|address| {
                        self.config.position(&address).ok_or(Error::ResourceNotFound {
                            address,
                            referenced_by: None,
                        })
                    })
                    .map_err(|e| e.referenced_by(&referrer))?;

                if !resolved.contains(&index) {
                    resolved.push(index);
                }
            }

            debug!(resource = %referrer, dependencies = resolved.len(), "resolved dependencies");
            dependencies.push(resolved);
        }

        Ok(ResolvedDependencies { dependencies })
    }

    /// Resolve any address to the registered resource.
    pub fn lookup(&self, address: &str) -> Result<&'a Resource> {
        self.config.find_resource(address)
    }

    /// Resolve an address and check the resource has one of the expected types.
    pub fn lookup_kind(&self, address: &str, expected: &[ResourceType]) -> Result<&'a Resource> {
        let resource = self.lookup(address)?;
        if !expected.contains(&resource.kind()) {
            return Err(Error::KindMismatch {
                address: resource.address(),
                expected: expected.to_vec(),
                found: resource.kind(),
            });
        }
        Ok(resource)
    }

    /// The container or cluster an ingress or remote exec points at.
    pub fn target_of(&self, resource: &Resource) -> Result<Option<&'a Resource>> {
        let target = match resource {
            Resource::Ingress(i) => Some(i.target.as_str()),
            Resource::ExecRemote(e) => e.target.as_deref(),
            _ => None,
        };

        match target.filter(|t| !t.is_empty()) {
            Some(address) => self
                .lookup_kind(address, &[ResourceType::Container, ResourceType::Cluster])
                .map(Some)
                .map_err(|e| e.referenced_by(&resource.address())),
            None => Ok(None),
        }
    }

    /// The network a resource attaches to.
    ///
    /// Ingresses and targeted remote execs inherit the network of their target.
    pub fn network_of(&self, resource: &Resource) -> Result<Option<&'a Network>> {
        match resource {
            Resource::Container(c) => self.network(&c.network, resource),
            Resource::Cluster(c) => self.network(&c.network, resource),
            Resource::Ingress(_) => match self.target_of(resource)? {
                Some(target) => self.network_of(target),
                None => Ok(None),
            },
            Resource::ExecRemote(e) => match self.target_of(resource)? {
                Some(target) => self.network_of(target),
                None => self.network(e.network.as_deref().unwrap_or_default(), resource),
            },
            _ => Ok(None),
        }
    }

    fn network(&self, address: &str, referrer: &Resource) -> Result<Option<&'a Network>> {
        if address.is_empty() {
            return Ok(None);
        }
        match self
            .lookup(address)
            .map_err(|e| e.referenced_by(&referrer.address()))?
        {
            Resource::Network(network) => Ok(Some(network)),
            other => Err(Error::KindMismatch {
                address: other.address(),
                expected: vec![ResourceType::Network],
                found: other.kind(),
            }),
        }
    }

    /// Check every attribute reference in the registry resolves to a
    /// resource of an accepted type.
    pub fn validate_references(&self) -> Result<()> {
        for resource in self.config.resources() {
            for reference in resource.attribute_refs() {
                self.lookup_kind(reference.address, reference.accepts)
                    .map_err(|e| e.referenced_by(&resource.address()))?;
            }
        }
        Ok(())
    }
}

/// Resolve the `depends_on` lists of every resource in `config`.
pub fn resolve(config: &Config) -> Result<ResolvedDependencies> {
    Resolver::new(config).resolve_dependencies()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Cluster, Container, ExecRemote, Helm, Ingress};

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    fn sample() -> Config {
        let mut config = Config::with_wan();
        config
            .add_resource(Network::new("cloud").with_subnet("10.5.0.0/16"))
            .unwrap();
        config
            .add_resource(
                Resource::from(Cluster::new("k3s").with_network("network.cloud"))
                    .depends_on(["network.cloud"]),
            )
            .unwrap();
        config
            .add_resource(
                Resource::from(Container::new("consul").with_network("network.cloud"))
                    .depends_on(["network.cloud", "network.cloud"]),
            )
            .unwrap();
        config
            .add_resource(Ingress::new("consul-http").with_target("container.consul"))
            .unwrap();
        config
    }

    #[test]
    fn test_resolves_to_registry_indices() {
        let config = sample();
        let resolved = resolve(&config).unwrap();

        assert_eq!(resolved.len(), config.resource_count());
        assert_eq!(resolved.of(0), &[] as &[usize]);
        assert_eq!(resolved.of(2), &[1]);
        // repeated entries collapse into one
        assert_eq!(resolved.of(3), &[1]);
        assert_eq!(resolved.of(99), &[] as &[usize]);
    }

    #[test]
    fn test_missing_dependency_names_referrer() {
        let mut config = sample();
        config
            .add_resource(Resource::from(Helm::new("consul")).depends_on(["cluster.k8s"]))
            .unwrap();

        let err = resolve(&config).unwrap_err();
        assert_eq!(
            err,
            Error::ResourceNotFound {
                address: addr("cluster.k8s"),
                referenced_by: Some(addr("helm.consul")),
            }
        );
        assert!(err.to_string().contains("referenced by helm.consul"));
    }

    #[test]
    fn test_malformed_dependency_names_referrer() {
        let mut config = Config::new();
        config
            .add_resource(Resource::from(Container::new("web")).depends_on(["consul"]))
            .unwrap();

        assert!(matches!(
            resolve(&config),
            Err(Error::MalformedAddress { ref raw, referenced_by: Some(ref r) })
                if raw == "consul" && r.to_string() == "container.web"
        ));
    }

    #[test]
    fn test_network_of_follows_targets() {
        let config = sample();
        let resolver = Resolver::new(&config);

        let ingress = config.find_resource("ingress.consul-http").unwrap();
        let network = resolver.network_of(ingress).unwrap().unwrap();
        assert_eq!(network.info.name, "cloud");

        let target = resolver.target_of(ingress).unwrap().unwrap();
        assert_eq!(target.address(), addr("container.consul"));

        let wan = config.find_resource("network.wan").unwrap();
        assert!(resolver.network_of(wan).unwrap().is_none());
    }

    #[test]
    fn test_exec_remote_without_target_uses_own_network() {
        let mut config = sample();
        config
            .add_resource(ExecRemote {
                network: Some("network.wan".to_string()),
                ..ExecRemote::new("setup")
            })
            .unwrap();

        let resolver = Resolver::new(&config);
        let exec = config.find_resource("exec_remote.setup").unwrap();
        assert_eq!(resolver.network_of(exec).unwrap().unwrap().info.name, "wan");
    }

    #[test]
    fn test_kind_mismatch_is_reported() {
        let mut config = sample();
        config
            .add_resource(Ingress::new("bad").with_target("network.cloud"))
            .unwrap();

        let resolver = Resolver::new(&config);
        let err = resolver.validate_references().unwrap_err();
        assert!(matches!(
            err,
            Error::KindMismatch {
                found: ResourceType::Network,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "network.cloud is a network, expected container or cluster"
        );
    }

    #[test]
    fn test_validate_references_reports_missing_network() {
        let mut config = Config::new();
        config
            .add_resource(Container::new("web").with_network("network.cloud"))
            .unwrap();

        assert_eq!(
            Resolver::new(&config).validate_references().unwrap_err(),
            Error::ResourceNotFound {
                address: addr("network.cloud"),
                referenced_by: Some(addr("container.web")),
            }
        );
        assert!(Resolver::new(&sample()).validate_references().is_ok());
    }
}
