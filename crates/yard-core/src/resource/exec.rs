use serde::{Deserialize, Serialize};

use super::{EnvVar, ResourceInfo, ResourceType, Volume};

/// A script run on the local machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecLocal {
    #[serde(flatten)]
    pub info: ResourceInfo,
    pub script: String,
    pub arguments: Vec<String>,
    pub env: Vec<EnvVar>,
}

impl ExecLocal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::ExecLocal, name),
            script: String::new(),
            arguments: Vec::new(),
            env: Vec::new(),
        }
    }
}

/// A script run inside a container, either an existing target or a
/// throwaway container attached to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecRemote {
    #[serde(flatten)]
    pub info: ResourceInfo,
    /// Address of a container or cluster to run in.
    pub target: Option<String>,
    /// Address of the network for a throwaway container, used when no target is set.
    pub network: Option<String>,
    pub image: Option<String>,
    pub script: Option<String>,
    pub arguments: Vec<String>,
    pub volumes: Vec<Volume>,
    pub env: Vec<EnvVar>,
}

impl ExecRemote {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::ExecRemote, name),
            target: None,
            network: None,
            image: None,
            script: None,
            arguments: Vec::new(),
            volumes: Vec::new(),
            env: Vec::new(),
        }
    }
}
