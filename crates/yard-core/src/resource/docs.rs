use serde::{Deserialize, Serialize};

use super::{ResourceInfo, ResourceType};

pub const DEFAULT_PORT: u16 = 80;

/// A documentation site served from a local directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docs {
    #[serde(flatten)]
    pub info: ResourceInfo,
    pub path: String,
    pub port: u16,
    pub open_in_browser: bool,
}

impl Docs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ResourceInfo::new(ResourceType::Docs, name),
            path: String::new(),
            port: DEFAULT_PORT,
            open_in_browser: false,
        }
    }
}
