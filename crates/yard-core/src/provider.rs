//! Provider trait.
//!
//! Providers perform the side effects for a resource (creating Docker
//! networks, starting clusters, installing charts). The apply engine calls
//! them in dependency order and records the resulting status.

use async_trait::async_trait;
use thiserror::Error;

use crate::resource::Resource;

/// Failure reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ProviderResult = std::result::Result<(), ProviderError>;

/// Backend that applies and destroys resources.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name of this provider.
    fn name(&self) -> &'static str;

    /// Create a resource that has never been applied.
    async fn create(&self, resource: &Resource) -> ProviderResult;

    /// Reapply a resource whose declaration changed.
    ///
    /// Defaults to destroying and recreating it.
    async fn update(&self, resource: &Resource) -> ProviderResult {
        self.destroy(resource).await?;
        self.create(resource).await
    }

    /// Remove a resource.
    async fn destroy(&self, resource: &Resource) -> ProviderResult;
}
