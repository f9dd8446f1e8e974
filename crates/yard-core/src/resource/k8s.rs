use serde::{Deserialize, Serialize};

use super::{ResourceInfo, ResourceType};

/// Raw Kubernetes manifests applied to a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct K8sConfig {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// Address of the target cluster.
    pub cluster: String,
    /// Manifest files or directories, absolute once loaded.
    pub paths: Vec<String>,
    pub wait_until_ready: bool,
}

impl K8sConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::K8sConfig, name),
            cluster: String::new(),
            paths: Vec::new(),
            wait_until_ready: false,
        }
    }
}
