//! Resource kinds and the collection dispatch table.
//!
//! Every nested collection maps to exactly one child kind and one identity
//! key. All kind-dependent behaviour reads [`COLLECTIONS`]; nothing else
//! branches on collection names.

use std::fmt;
use std::str::FromStr;

use crate::error::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Ensemble,
    Parameter,
    Observation,
    Realization,
    Response,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ensemble => "ensemble",
            Self::Parameter => "parameter",
            Self::Observation => "observation",
            Self::Realization => "realization",
            Self::Response => "response",
        }
    }

    /// Field that identifies a record of this kind within its collection.
    pub fn identity_key(self) -> &'static str {
        COLLECTIONS
            .iter()
            .find(|spec| spec.child_kind == self)
            .map(|spec| spec.identity_key)
            .unwrap_or("name")
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Parameters,
    Observations,
    Realizations,
    Responses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub collection: Collection,
    /// Key of the collection inside the parent record.
    pub field: &'static str,
    pub identity_key: &'static str,
    pub child_kind: ResourceKind,
}

pub static COLLECTIONS: [CollectionSpec; 4] = [
    CollectionSpec {
        collection:   Collection::Parameters,
        field:        "parameters",
        identity_key: "key",
        child_kind:   ResourceKind::Parameter,
    },
    CollectionSpec {
        collection:   Collection::Observations,
        field:        "observations",
        identity_key: "name",
        child_kind:   ResourceKind::Observation,
    },
    CollectionSpec {
        collection:   Collection::Realizations,
        field:        "realizations",
        identity_key: "name",
        child_kind:   ResourceKind::Realization,
    },
    CollectionSpec {
        collection:   Collection::Responses,
        field:        "responses",
        identity_key: "name",
        child_kind:   ResourceKind::Response,
    },
];

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Parameters,
        Collection::Observations,
        Collection::Realizations,
        Collection::Responses,
    ];

    pub fn spec(self) -> &'static CollectionSpec {
        &COLLECTIONS[self as usize]
    }

    pub fn field(self) -> &'static str {
        self.spec().field
    }

    pub fn identity_key(self) -> &'static str {
        self.spec().identity_key
    }

    pub fn child_kind(self) -> ResourceKind {
        self.spec().child_kind
    }

    pub fn from_field(field: &str) -> Option<Self> {
        COLLECTIONS
            .iter()
            .find(|spec| spec.field == field)
            .map(|spec| spec.collection)
    }
}

impl FromStr for Collection {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_field(s).ok_or_else(|| NodeError::UnknownCollection(s.to_string()))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}
