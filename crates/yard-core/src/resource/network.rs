use serde::{Deserialize, Serialize};

use super::{ResourceInfo, ResourceType};

/// A Docker network shared by containers and clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// CIDR block, e.g. `10.5.0.0/16`.
    pub subnet: String,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::Network, name),
            subnet: String::new(),
        }
    }

    pub fn with_subnet(mut self, subnet: impl Into<String>) -> Self {
        self.subnet = subnet.into();
        self
    }
}
