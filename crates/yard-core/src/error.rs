//! Error types for yard-core.

use crate::address::Address;
use crate::resource::ResourceType;
use crate::status::Status;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("resource not found: {address}{}", referenced_by_suffix(.referenced_by))]
    ResourceNotFound {
        address: Address,
        referenced_by: Option<Address>,
    },

    #[error("resource already exists: {address}")]
    ResourceExists { address: Address },

    #[error("dependency cycle detected: {}", format_path(.cycle))]
    DependencyCycle { cycle: Vec<Address> },

    #[error("malformed address '{raw}', expected type.name{}", referenced_by_suffix(.referenced_by))]
    MalformedAddress {
        raw: String,
        referenced_by: Option<Address>,
    },

    #[error("invalid status transition for {address}: {from} -> {to}")]
    InvalidTransition {
        address: Address,
        from: Status,
        to: Status,
    },

    #[error("{address} is a {found}, expected {}", format_kinds(.expected))]
    KindMismatch {
        address: Address,
        expected: Vec<ResourceType>,
        found: ResourceType,
    },

    #[error("resolved dependencies cover {resolved} resources, registry holds {registered}")]
    StaleResolution { registered: usize, resolved: usize },
}

impl Error {
    /// Attach the address of the resource whose declaration caused a lookup failure.
    pub fn referenced_by(self, referrer: &Address) -> Self {
        match self {
            Error::ResourceNotFound { address, .. } => Error::ResourceNotFound {
                address,
                referenced_by: Some(referrer.clone()),
            },
            Error::MalformedAddress { raw, .. } => Error::MalformedAddress {
                raw,
                referenced_by: Some(referrer.clone()),
            },
            other => other,
        }
    }
}

fn referenced_by_suffix(referrer: &Option<Address>) -> String {
    match referrer {
        Some(r) => format!(" (referenced by {})", r),
        None => String::new(),
    }
}

fn format_path(path: &[Address]) -> String {
    path.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_kinds(kinds: &[ResourceType]) -> String {
    kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

pub type Result<T> = std::result::Result<T, Error>;
