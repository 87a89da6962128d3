//! Tenant and Application Domain

use crate::error::ServiceResult;
use crate::identifier::validate_identifier;
use serde::{Deserialize, Serialize};

/// An isolated customer unit with its own keyspace/database
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    /// Unique, immutable identifier; also the basis for keyspace and
    /// database names
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub keyspace_connection_info: Option<KeyspaceConnectionInfo>,
    pub database_connection_info: Option<DatabaseConnectionInfo>,
    /// Set once, by identity-manager assignment
    pub identity_manager_application_name: Option<String>,
    pub identity_manager_application_uri: Option<String>,
}

impl Tenant {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_identifier(&self.identifier)
    }
}

/// Connection parameters for the tenant's isolated keyspace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyspaceConnectionInfo {
    pub cluster_name: String,
    /// Comma-separated host:port pairs
    pub contact_points: String,
    pub keyspace: String,
    pub replication_type: String,
    pub replicas: String,
}

/// Connection parameters for the tenant's relational database
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConnectionInfo {
    pub driver_class: String,
    pub host: String,
    pub port: String,
    pub database_name: String,
    pub user: String,
    pub password: String,
}

/// A registered deployable service, assignable to tenants
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    /// Unique key
    pub name: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub homepage: Option<String>,
}

impl Application {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_identifier(&self.name)
    }
}
