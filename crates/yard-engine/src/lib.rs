//! Apply engine for yard blueprints.
//!
//! Walks the dependency graph of a validated [`yard_core::Config`] and calls a
//! [`yard_core::Provider`] for each resource, recording the resulting status.

pub mod engine;

pub use engine::{Engine, EngineEvent, Outcome, RunResult};
