//! Resource lifecycle status.
//!
//! The apply engine drives resources through this state machine:
//!
//! ```text
//! PendingCreation ──► Applied ──► PendingModification
//!        │               ▲                │
//!        ▼               └────────────────┤
//!      Failed ◄───────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::{Address, Error, Result};

/// Provisioning status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Declared but not yet created. Every resource starts here.
    PendingCreation,
    /// Successfully created or updated.
    Applied,
    /// Applied previously and redeclared with changed attributes.
    PendingModification,
    /// The last create or update attempt failed.
    Failed,
}

impl Default for Status {
    fn default() -> Self {
        Status::PendingCreation
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::PendingCreation => write!(f, "pending_creation"),
            Status::Applied => write!(f, "applied"),
            Status::PendingModification => write!(f, "pending_modification"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

impl Status {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::PendingCreation, Status::Applied | Status::Failed)
                | (Status::Applied, Status::PendingModification)
                | (Status::PendingModification, Status::Applied | Status::Failed)
        )
    }

    /// Move to `next`, or fail with [`Error::InvalidTransition`] for `address`.
    pub fn transition(self, next: Status, address: &Address) -> Result<Status> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                address: address.clone(),
                from: self,
                to: next,
            });
        }
        Ok(next)
    }

    /// Whether the resource still needs work from the apply engine.
    pub fn is_pending(self) -> bool {
        matches!(self, Status::PendingCreation | Status::PendingModification)
    }

    pub fn is_applied(self) -> bool {
        matches!(self, Status::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 4] = [
        Status::PendingCreation,
        Status::Applied,
        Status::PendingModification,
        Status::Failed,
    ];

    #[test]
    fn test_initial_status() {
        assert_eq!(Status::default(), Status::PendingCreation);
    }

    #[test]
    fn test_legal_transitions() {
        let legal = [
            (Status::PendingCreation, Status::Applied),
            (Status::PendingCreation, Status::Failed),
            (Status::Applied, Status::PendingModification),
            (Status::PendingModification, Status::Applied),
            (Status::PendingModification, Status::Failed),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_failed_cannot_jump_to_applied() {
        assert!(!Status::Failed.can_transition_to(Status::Applied));
        assert!(!Status::PendingCreation.can_transition_to(Status::PendingModification));
    }

    #[test]
    fn test_transition_reports_address() {
        let address = Address::parse("helm.consul").unwrap();
        assert_eq!(
            Status::PendingCreation.transition(Status::Applied, &address),
            Ok(Status::Applied)
        );

        let err = Status::Failed
            .transition(Status::Applied, &address)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid status transition for helm.consul: failed -> applied"
        );
    }

    #[test]
    fn test_pending_and_applied_helpers() {
        let pending: Vec<Status> = ALL.into_iter().filter(|s| s.is_pending()).collect();
        assert_eq!(
            pending,
            vec![Status::PendingCreation, Status::PendingModification]
        );

        let applied: Vec<Status> = ALL.into_iter().filter(|s| s.is_applied()).collect();
        assert_eq!(applied, vec![Status::Applied]);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Status::PendingModification).unwrap(),
            "\"pending_modification\""
        );
        let status: Status = serde_json::from_str("\"applied\"").unwrap();
        assert_eq!(status, Status::Applied);
        assert_eq!(Status::PendingCreation.to_string(), "pending_creation");
    }
}
