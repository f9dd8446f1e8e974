use serde::{Deserialize, Serialize};

use super::{Port, ResourceInfo, ResourceType};

/// Exposes a service of a container or cluster on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingress {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// Address of the container or cluster to route to.
    pub target: String,
    /// Service inside the target, e.g. `svc/consul-ui` for clusters.
    pub service: Option<String>,
    pub ports: Vec<Port>,
    pub ip_address: Option<String>,
}

impl Ingress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::Ingress, name),
            target: String::new(),
            service: None,
            ports: Vec::new(),
            ip_address: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}
