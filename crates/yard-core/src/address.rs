//! Resource addresses.
//!
//! Every resource is addressed as `type.name`, e.g. `cluster.k3s`. The type
//! segment is mandatory: two resources of different types may share a name.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::resource::ResourceType;
use crate::{Error, Result};

const SEPARATOR: char = '.';

/// A parsed `type.name` address.
///
/// The type segment is kept as written so that an address naming an unknown
/// type still round-trips and fails lookup as "not found" rather than as
/// malformed.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("{kind}.{name}")]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    kind: String,
    name: String,
}

impl Address {
    /// Build the address of a resource of the given type.
    pub fn new(kind: ResourceType, name: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            name: name.into(),
        }
    }

    /// Parse a raw `type.name` string.
    ///
    /// Exactly one separator is accepted and both segments must be non-empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || Error::MalformedAddress {
            raw: raw.to_string(),
            referenced_by: None,
        };

        let (kind, name) = raw.split_once(SEPARATOR).ok_or_else(malformed)?;
        if kind.is_empty() || name.is_empty() || name.contains(SEPARATOR) {
            return Err(malformed());
        }

        Ok(Self {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }

    /// The type segment as written.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The name segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource type named by this address, if it is a known one.
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.kind.parse().ok()
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
