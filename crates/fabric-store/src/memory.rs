//! In-Memory Backends
//!
//! Backend implementations holding everything in process memory. Tests use
//! them to drive the stores and the provisioner; the operation counters let
//! a test assert that a disabled backend was never touched.

use async_trait::async_trait;
use fabric_common::{Application, DatabaseConnectionInfo, SignatureSet};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StoreError;
use crate::keyspace::{AssignmentRecord, KeyspaceBackend, ReplicationSpec, TenantRecord};
use crate::relational::RelationalBackend;

/// In-memory stand-in for the keyspace engine
#[derive(Default)]
pub struct InMemoryKeyspaceBackend {
    keyspaces: RwLock<BTreeMap<String, ReplicationSpec>>,
    tenants: RwLock<BTreeMap<String, TenantRecord>>,
    applications: RwLock<BTreeMap<String, Application>>,
    assignments: RwLock<BTreeMap<String, AssignmentRecord>>,
    signatures: RwLock<BTreeMap<String, Vec<SignatureSet>>>,
    operations: AtomicU64,
}

impl InMemoryKeyspaceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations issued against this backend
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn has_keyspace(&self, keyspace: &str) -> bool {
        self.keyspaces.read().contains_key(keyspace)
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyspaceBackend for InMemoryKeyspaceBackend {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.touch();
        Ok(())
    }

    async fn create_keyspace(
        &self,
        keyspace: &str,
        replication: &ReplicationSpec,
    ) -> Result<(), StoreError> {
        self.touch();
        let mut keyspaces = self.keyspaces.write();
        if keyspaces.contains_key(keyspace) {
            return Err(StoreError::Duplicate(format!(
                "keyspace {} already exists",
                keyspace
            )));
        }
        keyspaces.insert(keyspace.to_string(), replication.clone());
        Ok(())
    }

    async fn drop_keyspace(&self, keyspace: &str) -> Result<(), StoreError> {
        self.touch();
        self.keyspaces.write().remove(keyspace);
        Ok(())
    }

    async fn insert_tenant(&self, record: &TenantRecord) -> Result<(), StoreError> {
        self.touch();
        self.tenants
            .write()
            .insert(record.identifier.clone(), record.clone());
        Ok(())
    }

    async fn get_tenant(&self, identifier: &str) -> Result<Option<TenantRecord>, StoreError> {
        self.touch();
        Ok(self.tenants.read().get(identifier).cloned())
    }

    async fn fetch_all_tenants(&self) -> Result<Vec<TenantRecord>, StoreError> {
        self.touch();
        Ok(self.tenants.read().values().cloned().collect())
    }

    async fn update_tenant(&self, record: &TenantRecord) -> Result<(), StoreError> {
        self.touch();
        let mut tenants = self.tenants.write();
        if !tenants.contains_key(&record.identifier) {
            return Err(StoreError::TenantNotFound(record.identifier.clone()));
        }
        tenants.insert(record.identifier.clone(), record.clone());
        Ok(())
    }

    async fn delete_tenant(&self, identifier: &str) -> Result<(), StoreError> {
        self.touch();
        self.tenants.write().remove(identifier);
        self.signatures.write().remove(identifier);
        Ok(())
    }

    async fn insert_application(&self, application: &Application) -> Result<(), StoreError> {
        self.touch();
        self.applications
            .write()
            .insert(application.name.clone(), application.clone());
        Ok(())
    }

    async fn get_application(&self, name: &str) -> Result<Option<Application>, StoreError> {
        self.touch();
        Ok(self.applications.read().get(name).cloned())
    }

    async fn fetch_all_applications(&self) -> Result<Vec<Application>, StoreError> {
        self.touch();
        Ok(self.applications.read().values().cloned().collect())
    }

    async fn delete_application(&self, name: &str) -> Result<(), StoreError> {
        self.touch();
        self.applications.write().remove(name);
        Ok(())
    }

    async fn upsert_assignment(&self, record: &AssignmentRecord) -> Result<(), StoreError> {
        self.touch();
        self.assignments
            .write()
            .insert(record.tenant_identifier.clone(), record.clone());
        Ok(())
    }

    async fn get_assignment(
        &self,
        tenant_identifier: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError> {
        self.touch();
        Ok(self.assignments.read().get(tenant_identifier).cloned())
    }

    async fn fetch_all_assignments(&self) -> Result<Vec<AssignmentRecord>, StoreError> {
        self.touch();
        Ok(self.assignments.read().values().cloned().collect())
    }

    async fn delete_assignment(&self, tenant_identifier: &str) -> Result<(), StoreError> {
        self.touch();
        self.assignments.write().remove(tenant_identifier);
        Ok(())
    }

    async fn store_signature_set(
        &self,
        tenant_identifier: &str,
        signature_set: &SignatureSet,
    ) -> Result<(), StoreError> {
        self.touch();
        self.signatures
            .write()
            .entry(tenant_identifier.to_string())
            .or_default()
            .push(signature_set.clone());
        Ok(())
    }

    async fn latest_signature_set(
        &self,
        tenant_identifier: &str,
    ) -> Result<Option<SignatureSet>, StoreError> {
        self.touch();
        Ok(self
            .signatures
            .read()
            .get(tenant_identifier)
            .and_then(|sets| {
                sets.iter()
                    .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
                    .cloned()
            }))
    }
}

/// In-memory stand-in for the relational engine
#[derive(Default)]
pub struct InMemoryRelationalBackend {
    databases: RwLock<BTreeSet<String>>,
    connection_info: RwLock<BTreeMap<String, DatabaseConnectionInfo>>,
    operations: AtomicU64,
}

impl InMemoryRelationalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations issued against this backend
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn has_database(&self, database_name: &str) -> bool {
        self.databases.read().contains(database_name)
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RelationalBackend for InMemoryRelationalBackend {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.touch();
        Ok(())
    }

    async fn tenant_exists(&self, identifier: &str) -> Result<bool, StoreError> {
        self.touch();
        Ok(self.connection_info.read().contains_key(identifier))
    }

    async fn create_database(&self, database_name: &str) -> Result<(), StoreError> {
        self.touch();
        self.databases.write().insert(database_name.to_string());
        Ok(())
    }

    async fn drop_database(&self, database_name: &str) -> Result<(), StoreError> {
        self.touch();
        self.databases.write().remove(database_name);
        Ok(())
    }

    async fn insert_connection_info(
        &self,
        identifier: &str,
        info: &DatabaseConnectionInfo,
    ) -> Result<(), StoreError> {
        self.touch();
        self.connection_info
            .write()
            .insert(identifier.to_string(), info.clone());
        Ok(())
    }

    async fn find_connection_info(
        &self,
        identifier: &str,
    ) -> Result<Option<DatabaseConnectionInfo>, StoreError> {
        self.touch();
        Ok(self.connection_info.read().get(identifier).cloned())
    }

    async fn fetch_all_connection_info(
        &self,
    ) -> Result<Vec<(String, DatabaseConnectionInfo)>, StoreError> {
        self.touch();
        Ok(self
            .connection_info
            .read()
            .iter()
            .map(|(identifier, info)| (identifier.clone(), info.clone()))
            .collect())
    }

    async fn delete_connection_info(&self, identifier: &str) -> Result<(), StoreError> {
        self.touch();
        self.connection_info.write().remove(identifier);
        Ok(())
    }
}
