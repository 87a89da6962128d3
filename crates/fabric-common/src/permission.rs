//! Permission Vocabulary
//!
//! Permittable endpoints and their named bundles, as declared by target
//! applications and registered with the identity manager.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One authorizable (path, method) unit, tagged with the group it belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PermittableEndpoint {
    pub path: String,
    pub method: String,
    pub group_id: String,
}

impl PermittableEndpoint {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            group_id: group_id.into(),
        }
    }
}

/// A named bundle of permittable endpoints, the unit registered with identity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermittableGroup {
    pub identifier: String,
    pub permittables: Vec<PermittableEndpoint>,
}

impl PermittableGroup {
    pub fn new(identifier: impl Into<String>, permittables: Vec<PermittableEndpoint>) -> Self {
        Self {
            identifier: identifier.into(),
            permittables,
        }
    }
}

/// Operations a permission can allow on a permittable group
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum AllowedOperation {
    Read,
    Change,
    Delete,
}

impl AllowedOperation {
    /// The full operation set, the expansion of "ALL"
    pub fn all() -> BTreeSet<AllowedOperation> {
        [Self::Read, Self::Change, Self::Delete].into_iter().collect()
    }

    pub fn only(operation: AllowedOperation) -> BTreeSet<AllowedOperation> {
        [operation].into_iter().collect()
    }
}

/// A grant on one permittable group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub permittable_group_identifier: String,
    pub allowed_operations: BTreeSet<AllowedOperation>,
}

/// A permission an application requires, tagged with the endpoint-set
/// purpose it will exercise it under
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationPermission {
    pub endpoint_set_identifier: String,
    pub permission: Permission,
}

/// A named set of permittable groups an application calls out under
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEndpointSet {
    pub identifier: String,
    pub permittable_endpoint_group_identifiers: Vec<String>,
}
