use serde::{Deserialize, Serialize};

use super::{ResourceInfo, ResourceType};

/// A Helm chart installed into a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Helm {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// Address of the target cluster.
    pub cluster: String,
    /// Chart directory, absolute once loaded.
    pub chart: String,
    /// Values file, absolute once loaded.
    pub values: Option<String>,
}

impl Helm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::Helm, name),
            cluster: String::new(),
            chart: String::new(),
            values: None,
        }
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }
}
