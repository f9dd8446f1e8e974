//! Engine - applies and destroys resources in dependency order.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use yard_core::{Address, Config, DependencyGraph, Provider, Resource, Status};

/// Result of processing a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    /// Already applied, nothing to do.
    Unchanged,
    Destroyed,
    /// Not attempted. `blocked_by` lists dependencies that are not applied;
    /// it is empty for a resource that had already failed.
    Skipped { blocked_by: Vec<Address> },
    Failed { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Created | Outcome::Updated | Outcome::Unchanged | Outcome::Destroyed
        )
    }
}

/// Event emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ResourceStarted { address: Address },
    ResourceCompleted { address: Address, outcome: Outcome },
    RunCompleted { success: bool },
}

/// Result of an apply or destroy run.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    /// The registry with statuses written back.
    pub config: Config,
    /// Outcome per resource, in walk order.
    pub outcomes: Vec<(Address, Outcome)>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when the dependency graph could not be built.
    pub error: Option<yard_core::Error>,
}

impl RunResult {
    pub fn outcome(&self, address: &Address) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, outcome)| outcome)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Apply,
    Destroy,
}

/// Drives a [`Provider`] over the resources of a config.
pub struct Engine {
    provider: Arc<dyn Provider>,
}

impl Engine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Apply every pending resource, dependencies first.
    ///
    /// Returns a channel of events and a handle to get the final result.
    pub fn apply(
        &self,
        config: Config,
    ) -> (mpsc::UnboundedReceiver<EngineEvent>, JoinHandle<RunResult>) {
        self.spawn(config, Mode::Apply)
    }

    /// Destroy every resource that may exist, dependents first.
    pub fn destroy(
        &self,
        config: Config,
    ) -> (mpsc::UnboundedReceiver<EngineEvent>, JoinHandle<RunResult>) {
        self.spawn(config, Mode::Destroy)
    }

    fn spawn(
        &self,
        config: Config,
        mode: Mode,
    ) -> (mpsc::UnboundedReceiver<EngineEvent>, JoinHandle<RunResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = self.provider.clone();

        let handle = tokio::spawn(async move { Self::run(provider, config, mode, tx).await });

        (rx, handle)
    }

    async fn run(
        provider: Arc<dyn Provider>,
        mut config: Config,
        mode: Mode,
        tx: mpsc::UnboundedSender<EngineEvent>,
    ) -> RunResult {
        let started_at = Utc::now();
        info!(provider = provider.name(), ?mode, "starting run");

        let graph = match DependencyGraph::build(&config) {
            Ok(graph) => graph,
            Err(e) => {
                error!(error = %e, "invalid configuration");
                let _ = tx.send(EngineEvent::RunCompleted { success: false });
                return RunResult {
                    success: false,
                    config,
                    outcomes: Vec::new(),
                    started_at,
                    finished_at: Utc::now(),
                    error: Some(e),
                };
            }
        };

        let outcomes = match mode {
            Mode::Apply => Self::apply_all(&provider, &mut config, &graph, &tx).await,
            Mode::Destroy => Self::destroy_all(&provider, &config, &graph, &tx).await,
        };

        let success = outcomes.iter().all(|(_, o)| o.is_success());
        info!(success, resources = outcomes.len(), "run completed");
        let _ = tx.send(EngineEvent::RunCompleted { success });

        RunResult {
            success,
            config,
            outcomes,
            started_at,
            finished_at: Utc::now(),
            error: None,
        }
    }

    async fn apply_all(
        provider: &Arc<dyn Provider>,
        config: &mut Config,
        graph: &DependencyGraph,
        tx: &mpsc::UnboundedSender<EngineEvent>,
    ) -> Vec<(Address, Outcome)> {
        let mut outcomes = Vec::with_capacity(graph.node_count());

        for &index in graph.topological_order() {
            let Some(resource) = config.get(index).cloned() else {
                continue;
            };
            let address = resource.address();

            let blocked_by: Vec<Address> = graph
                .dependencies_of(index)
                .iter()
                .filter_map(|&dep| config.get(dep))
                .filter(|dep| !dep.status().is_applied())
                .map(Resource::address)
                .collect();

            let status = resource.status();
            let outcome = if !blocked_by.is_empty() {
                info!(%address, ?blocked_by, "skipping resource with unapplied dependencies");
                Outcome::Skipped { blocked_by }
            } else if status.is_pending() {
                let _ = tx.send(EngineEvent::ResourceStarted {
                    address: address.clone(),
                });
                Self::apply_one(provider, config, &resource).await
            } else if status.is_applied() {
                Outcome::Unchanged
            } else {
                Outcome::Skipped {
                    blocked_by: Vec::new(),
                }
            };

            let _ = tx.send(EngineEvent::ResourceCompleted {
                address: address.clone(),
                outcome: outcome.clone(),
            });
            outcomes.push((address, outcome));
        }

        outcomes
    }

    async fn apply_one(
        provider: &Arc<dyn Provider>,
        config: &mut Config,
        resource: &Resource,
    ) -> Outcome {
        let address = resource.address();
        let updating = resource.status() == Status::PendingModification;

        let result = if updating {
            provider.update(resource).await
        } else {
            provider.create(resource).await
        };

        let (status, outcome) = match result {
            Ok(()) if updating => (Status::Applied, Outcome::Updated),
            Ok(()) => (Status::Applied, Outcome::Created),
            Err(e) => {
                error!(%address, error = %e, "resource failed");
                (
                    Status::Failed,
                    Outcome::Failed {
                        message: e.to_string(),
                    },
                )
            }
        };

        if let Err(e) = config.set_status(&address, status) {
            error!(%address, error = %e, "failed to record status");
        } else if outcome.is_success() {
            info!(%address, "resource applied");
        }

        outcome
    }

    async fn destroy_all(
        provider: &Arc<dyn Provider>,
        config: &Config,
        graph: &DependencyGraph,
        tx: &mpsc::UnboundedSender<EngineEvent>,
    ) -> Vec<(Address, Outcome)> {
        let mut outcomes = Vec::new();

        for index in graph.reverse_order() {
            let Some(resource) = config.get(index) else {
                continue;
            };
            if resource.status() == Status::PendingCreation {
                continue;
            }

            let address = resource.address();
            let _ = tx.send(EngineEvent::ResourceStarted {
                address: address.clone(),
            });

            let outcome = match provider.destroy(resource).await {
                Ok(()) => {
                    info!(%address, "resource destroyed");
                    Outcome::Destroyed
                }
                Err(e) => {
                    error!(%address, error = %e, "failed to destroy resource");
                    Outcome::Failed {
                        message: e.to_string(),
                    }
                }
            };

            let _ = tx.send(EngineEvent::ResourceCompleted {
                address: address.clone(),
                outcome: outcome.clone(),
            });
            outcomes.push((address, outcome));
        }

        outcomes
    }
}
