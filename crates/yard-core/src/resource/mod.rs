//! Resource model.
//!
//! Each declared block becomes one [`Resource`] variant. Every variant embeds
//! a [`ResourceInfo`] carrying its identity, status and declared dependencies;
//! the registry and graph only ever look at that common part.

mod cluster;
mod container;
mod docs;
mod exec;
mod helm;
mod ingress;
mod k8s;
mod network;

pub use cluster::Cluster;
pub use container::Container;
pub use docs::Docs;
pub use exec::{ExecLocal, ExecRemote};
pub use helm::Helm;
pub use ingress::Ingress;
pub use k8s::K8sConfig;
pub use network::Network;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Address;
use crate::status::Status;

/// Resource type tag, the first segment of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Network,
    Cluster,
    Container,
    Helm,
    K8sConfig,
    Ingress,
    Docs,
    ExecLocal,
    ExecRemote,
}

impl ResourceType {
    pub const ALL: [ResourceType; 9] = [
        ResourceType::Network,
        ResourceType::Cluster,
        ResourceType::Container,
        ResourceType::Helm,
        ResourceType::K8sConfig,
        ResourceType::Ingress,
        ResourceType::Docs,
        ResourceType::ExecLocal,
        ResourceType::ExecRemote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Network => "network",
            ResourceType::Cluster => "cluster",
            ResourceType::Container => "container",
            ResourceType::Helm => "helm",
            ResourceType::K8sConfig => "k8s_config",
            ResourceType::Ingress => "ingress",
            ResourceType::Docs => "docs",
            ResourceType::ExecLocal => "exec_local",
            ResourceType::ExecRemote => "exec_remote",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown resource type: {}", s))
    }
}

/// Identity, status and dependencies shared by every resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Name, unique within the resource type.
    pub name: String,
    /// Resource type tag.
    #[serde(rename = "type")]
    pub kind: ResourceType,
    /// Current status, always `PendingCreation` for a new resource.
    pub status: Status,
    /// Addresses of resources that must be applied before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ResourceInfo {
    pub fn new(kind: ResourceType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            status: Status::PendingCreation,
            depends_on: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        Address::new(self.kind, self.name.clone())
    }
}

/// An environment variable passed to a container, cluster or script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// A host path mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Host path, absolute once loaded.
    pub source: String,
    /// Path inside the container.
    pub destination: String,
}

/// A port mapping.
///
/// Containers use `local`/`host`/`protocol`; ingresses use `local`/`remote`/`host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub local: u16,
    pub remote: Option<u16>,
    pub host: Option<u16>,
    pub protocol: String,
}

impl Port {
    pub fn new(local: u16) -> Self {
        Self {
            local,
            remote: None,
            host: None,
            protocol: "tcp".to_string(),
        }
    }
}

/// An address embedded in a kind-specific attribute, such as a container's network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRef<'a> {
    /// Attribute name as declared, e.g. `network` or `target`.
    pub attribute: &'static str,
    pub address: &'a str,
    /// Types the referenced resource may have.
    pub accepts: &'static [ResourceType],
}

const NETWORKS: &[ResourceType] = &[ResourceType::Network];
const CLUSTERS: &[ResourceType] = &[ResourceType::Cluster];
pub(crate) const TARGETS: &[ResourceType] = &[ResourceType::Container, ResourceType::Cluster];

/// A declared resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Network(Network),
    Cluster(Cluster),
    Container(Container),
    Helm(Helm),
    K8sConfig(K8sConfig),
    Ingress(Ingress),
    Docs(Docs),
    ExecLocal(ExecLocal),
    ExecRemote(ExecRemote),
}

impl Resource {
    /// The common identity view.
    pub fn info(&self) -> &ResourceInfo {
        match self {
            Resource::Network(r) => &r.info,
            Resource::Cluster(r) => &r.info,
            Resource::Container(r) => &r.info,
            Resource::Helm(r) => &r.info,
            Resource::K8sConfig(r) => &r.info,
            Resource::Ingress(r) => &r.info,
            Resource::Docs(r) => &r.info,
            Resource::ExecLocal(r) => &r.info,
            Resource::ExecRemote(r) => &r.info,
        }
    }

    /// Mutable identity view. Status changes on registered resources go
    /// through [`crate::Config::set_status`] instead.
    pub(crate) fn info_mut(&mut self) -> &mut ResourceInfo {
        match self {
            Resource::Network(r) => &mut r.info,
            Resource::Cluster(r) => &mut r.info,
            Resource::Container(r) => &mut r.info,
            Resource::Helm(r) => &mut r.info,
            Resource::K8sConfig(r) => &mut r.info,
            Resource::Ingress(r) => &mut r.info,
            Resource::Docs(r) => &mut r.info,
            Resource::ExecLocal(r) => &mut r.info,
            Resource::ExecRemote(r) => &mut r.info,
        }
    }

    pub fn kind(&self) -> ResourceType {
        self.info().kind
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn status(&self) -> Status {
        self.info().status
    }

    pub fn address(&self) -> Address {
        self.info().address()
    }

    /// Append dependency addresses, consuming and returning the resource.
    pub fn depends_on<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info_mut()
            .depends_on
            .extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Addresses held in kind-specific attributes, skipping unset ones.
    pub fn attribute_refs(&self) -> Vec<AttributeRef<'_>> {
        let candidates: Vec<(&'static str, Option<&str>, &'static [ResourceType])> = match self {
            Resource::Cluster(c) => vec![("network", Some(c.network.as_str()), NETWORKS)],
            Resource::Container(c) => vec![("network", Some(c.network.as_str()), NETWORKS)],
            Resource::Helm(h) => vec![("cluster", Some(h.cluster.as_str()), CLUSTERS)],
            Resource::K8sConfig(k) => vec![("cluster", Some(k.cluster.as_str()), CLUSTERS)],
            Resource::Ingress(i) => vec![("target", Some(i.target.as_str()), TARGETS)],
            Resource::ExecRemote(e) => vec![
                ("target", e.target.as_deref(), TARGETS),
                ("network", e.network.as_deref(), NETWORKS),
            ],
            Resource::Network(_) | Resource::Docs(_) | Resource::ExecLocal(_) => Vec::new(),
        };

        candidates
            .into_iter()
            .filter_map(|(attribute, address, accepts)| {
                address
                    .filter(|a| !a.is_empty())
                    .map(|address| AttributeRef {
                        attribute,
                        address,
                        accepts,
                    })
            })
            .collect()
    }
}

macro_rules! impl_from_kind {
    ($($kind:ident),+ $(,)?) => {
        $(
            impl From<$kind> for Resource {
                fn from(resource: $kind) -> Self {
                    Resource::$kind(resource)
                }
            }
        )+
    };
}

impl_from_kind!(
    Network, Cluster, Container, Helm, K8sConfig, Ingress, Docs, ExecLocal, ExecRemote,
);
