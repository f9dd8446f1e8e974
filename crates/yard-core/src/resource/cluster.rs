use serde::{Deserialize, Serialize};

use super::{EnvVar, ResourceInfo, ResourceType};

pub const DEFAULT_DRIVER: &str = "k3s";

/// A Kubernetes cluster running in Docker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// Cluster driver, `k3s` unless declared otherwise.
    pub driver: String,
    pub version: Option<String>,
    pub nodes: u32,
    /// Address of the network the cluster attaches to.
    pub network: String,
    /// Images to import into the cluster once it is running.
    pub images: Vec<String>,
    pub env: Vec<EnvVar>,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::Cluster, name),
            driver: DEFAULT_DRIVER.to_string(),
            version: None,
            nodes: 1,
            network: String::new(),
            images: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }
}
