//! Keyspace Backend
//!
//! The operations the control plane issues against the cluster that hosts
//! tenant keyspaces and the provisioner's own metadata tables. The engine
//! behind this trait is external; deployments plug in a driver, tests plug
//! in [`crate::memory::InMemoryKeyspaceBackend`].

use async_trait::async_trait;
use fabric_common::{Application, SignatureSet, Tenant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;

/// Replication of a tenant keyspace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReplicationSpec {
    Simple {
        replicas: u32,
    },
    /// Per-datacenter replica counts
    Network {
        datacenters: BTreeMap<String, u32>,
    },
}

impl ReplicationSpec {
    /// Parse the (strategy, replicas) pair as tenants declare it.
    ///
    /// `Simple` takes a bare count; `Network` takes `dc1:3,dc2:2`.
    pub fn parse(replication_type: &str, replicas: &str) -> Result<Self, StoreError> {
        match replication_type {
            "Simple" => {
                let count = replicas.trim().parse::<u32>().map_err(|_| {
                    StoreError::InvalidReplication(format!(
                        "replica count '{}' is not a number",
                        replicas
                    ))
                })?;
                Ok(Self::Simple { replicas: count })
            }
            "Network" => {
                let mut datacenters = BTreeMap::new();
                for entry in replicas.split(',') {
                    let (datacenter, count) = entry.split_once(':').ok_or_else(|| {
                        StoreError::InvalidReplication(format!(
                            "network replica entry '{}' is not dc:count",
                            entry
                        ))
                    })?;
                    let count = count.trim().parse::<u32>().map_err(|_| {
                        StoreError::InvalidReplication(format!(
                            "replica count '{}' is not a number",
                            count
                        ))
                    })?;
                    datacenters.insert(datacenter.trim().to_string(), count);
                }
                Ok(Self::Network { datacenters })
            }
            other => Err(StoreError::InvalidReplication(format!(
                "unknown replication type '{}'",
                other
            ))),
        }
    }
}

/// Tenant metadata row in the provisioner's own keyspace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantRecord {
    pub identifier: String,
    pub cluster_name: String,
    pub contact_points: String,
    pub keyspace_name: String,
    pub replication_type: String,
    pub replicas: String,
    pub name: String,
    pub description: Option<String>,
    pub identity_manager_application_name: Option<String>,
    pub identity_manager_application_uri: Option<String>,
}

impl TenantRecord {
    /// Build the metadata row for a tenant being created. The identity
    /// manager fields stay empty; it cannot exist before the tenant does.
    pub fn from_tenant(tenant: &Tenant) -> Option<Self> {
        let info = tenant.keyspace_connection_info.as_ref()?;
        Some(Self {
            identifier: tenant.identifier.clone(),
            cluster_name: info.cluster_name.clone(),
            contact_points: info.contact_points.clone(),
            keyspace_name: info.keyspace.clone(),
            replication_type: info.replication_type.clone(),
            replicas: info.replicas.clone(),
            name: tenant.name.clone(),
            description: tenant.description.clone(),
            identity_manager_application_name: None,
            identity_manager_application_uri: None,
        })
    }
}

/// Tenant → assigned application names
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AssignmentRecord {
    pub tenant_identifier: String,
    pub applications: std::collections::BTreeSet<String>,
}

/// Operations issued against the keyspace engine
#[async_trait]
pub trait KeyspaceBackend: Send + Sync {
    /// Ensure the provisioner's own metadata tables exist
    async fn initialize(&self) -> Result<(), StoreError>;

    async fn create_keyspace(
        &self,
        keyspace: &str,
        replication: &ReplicationSpec,
    ) -> Result<(), StoreError>;

    async fn drop_keyspace(&self, keyspace: &str) -> Result<(), StoreError>;

    async fn insert_tenant(&self, record: &TenantRecord) -> Result<(), StoreError>;
    async fn get_tenant(&self, identifier: &str) -> Result<Option<TenantRecord>, StoreError>;
    async fn fetch_all_tenants(&self) -> Result<Vec<TenantRecord>, StoreError>;
    async fn update_tenant(&self, record: &TenantRecord) -> Result<(), StoreError>;
    async fn delete_tenant(&self, identifier: &str) -> Result<(), StoreError>;

    async fn insert_application(&self, application: &Application) -> Result<(), StoreError>;
    async fn get_application(&self, name: &str) -> Result<Option<Application>, StoreError>;
    async fn fetch_all_applications(&self) -> Result<Vec<Application>, StoreError>;
    async fn delete_application(&self, name: &str) -> Result<(), StoreError>;

    async fn upsert_assignment(&self, record: &AssignmentRecord) -> Result<(), StoreError>;
    async fn get_assignment(
        &self,
        tenant_identifier: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError>;
    async fn fetch_all_assignments(&self) -> Result<Vec<AssignmentRecord>, StoreError>;
    async fn delete_assignment(&self, tenant_identifier: &str) -> Result<(), StoreError>;

    /// Record a tenant's signature set as its root of trust
    async fn store_signature_set(
        &self,
        tenant_identifier: &str,
        signature_set: &SignatureSet,
    ) -> Result<(), StoreError>;

    /// The newest signature set stored for the tenant, if any
    async fn latest_signature_set(
        &self,
        tenant_identifier: &str,
    ) -> Result<Option<SignatureSet>, StoreError>;
}
