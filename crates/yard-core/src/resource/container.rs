use serde::{Deserialize, Serialize};

use super::{EnvVar, Port, ResourceInfo, ResourceType, Volume};

/// A standalone Docker container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(flatten)]
    pub info: ResourceInfo,
    pub image: String,
    /// Command and arguments; empty runs the image entrypoint.
    pub command: Vec<String>,
    pub env: Vec<EnvVar>,
    pub volumes: Vec<Volume>,
    /// Address of the network the container attaches to.
    pub network: String,
    pub ip_address: Option<String>,
    pub ports: Vec<Port>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::Container, name),
            image: String::new(),
            command: Vec::new(),
            env: Vec::new(),
            volumes: Vec::new(),
            network: String::new(),
            ip_address: None,
            ports: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }
}
