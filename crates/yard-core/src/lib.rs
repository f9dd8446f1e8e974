//! Core domain types for yard blueprints.
//!
//! This crate contains:
//! - Resource addresses (`type.name`) and the resource model
//! - The resource registry (`Config`)
//! - Status lifecycle for the apply engine
//! - Reference resolution and the dependency graph builder
//! - The provider trait implemented by runtime backends

pub mod address;
pub mod config;
pub mod error;
pub mod graph;
pub mod provider;
pub mod resolver;
pub mod resource;
pub mod status;

pub use address::Address;
pub use config::{Blueprint, Config};
pub use error::{Error, Result};
pub use graph::{DependencyGraph, Edge};
pub use provider::{Provider, ProviderError, ProviderResult};
pub use resolver::{ResolvedDependencies, Resolver};
pub use resource::{Resource, ResourceInfo, ResourceType};
pub use status::Status;
