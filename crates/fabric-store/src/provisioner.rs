//! Datastore Provisioner
//!
//! Orchestrates tenant datastore lifecycle across the enabled backends:
//! keyspace and database creation on tenant-create, teardown plus cascade
//! on tenant-delete. The two backends are provisioned independently; there
//! is no cross-backend transaction.

use fabric_common::Tenant;
use std::sync::Arc;
use tracing::info;

use crate::assignment::AssignmentStore;
use crate::error::StoreError;
use crate::keyspace::{KeyspaceBackend, ReplicationSpec, TenantRecord};
use crate::option::DataStoreOption;
use crate::relational::RelationalBackend;
use crate::tenant::TenantStore;

pub struct DatastoreProvisioner {
    option: DataStoreOption,
    keyspace: Option<Arc<dyn KeyspaceBackend>>,
    relational: Option<Arc<dyn RelationalBackend>>,
    store: Arc<TenantStore>,
    assignments: Arc<AssignmentStore>,
}

impl DatastoreProvisioner {
    pub fn new(
        option: DataStoreOption,
        keyspace: Option<Arc<dyn KeyspaceBackend>>,
        relational: Option<Arc<dyn RelationalBackend>>,
        store: Arc<TenantStore>,
        assignments: Arc<AssignmentStore>,
    ) -> Self {
        Self {
            option,
            keyspace,
            relational,
            store,
            assignments,
        }
    }

    fn keyspace(&self) -> Option<&Arc<dyn KeyspaceBackend>> {
        if self.option.is_enabled(DataStoreOption::Cassandra) {
            self.keyspace.as_ref()
        } else {
            None
        }
    }

    fn relational(&self) -> Option<&Arc<dyn RelationalBackend>> {
        if self.option.is_enabled(DataStoreOption::Rdbms) {
            self.relational.as_ref()
        } else {
            None
        }
    }

    /// Ensure the provisioner's own metadata structures exist on every
    /// enabled backend. Called once at startup.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        if let Some(backend) = self.keyspace() {
            backend.initialize().await?;
        }
        if let Some(backend) = self.relational() {
            backend.initialize().await?;
        }
        Ok(())
    }

    /// Create the tenant's isolated datastores and record its metadata
    pub async fn create_tenant(&self, tenant: &Tenant) -> Result<(), StoreError> {
        tenant
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        if let Some(backend) = self.keyspace() {
            let record = TenantRecord::from_tenant(tenant).ok_or_else(|| {
                StoreError::MissingConnectionInfo(format!(
                    "tenant {} has no keyspace connection info",
                    tenant.identifier
                ))
            })?;

            if self.store.get_record(&tenant.identifier).await?.is_some() {
                return Err(StoreError::Duplicate(format!(
                    "tenant {} already exists",
                    tenant.identifier
                )));
            }

            let replication =
                ReplicationSpec::parse(&record.replication_type, &record.replicas)?;

            backend
                .create_keyspace(&record.keyspace_name, &replication)
                .await
                .map_err(|e| match e {
                    StoreError::Duplicate(_) => StoreError::KeyspaceExists(record.keyspace_name.clone()),
                    other => other,
                })?;

            self.store.create_record(&record).await?;
            info!(tenant = %tenant.identifier, keyspace = %record.keyspace_name, "tenant keyspace provisioned");
        }

        if let Some(backend) = self.relational() {
            let info = tenant.database_connection_info.as_ref().ok_or_else(|| {
                StoreError::MissingConnectionInfo(format!(
                    "tenant {} has no database connection info",
                    tenant.identifier
                ))
            })?;

            if self.store.connection_info_exists(&tenant.identifier).await? {
                return Err(StoreError::Duplicate(format!(
                    "tenant {} already exists",
                    tenant.identifier
                )));
            }

            backend.create_database(&info.database_name).await?;
            self.store
                .record_connection_info(&tenant.identifier, info)
                .await?;
            info!(tenant = %tenant.identifier, database = %info.database_name, "tenant database provisioned");
        }

        Ok(())
    }

    pub async fn find_tenant(&self, identifier: &str) -> Result<Option<Tenant>, StoreError> {
        self.store.find(identifier).await
    }

    pub async fn fetch_all_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        self.store.fetch_all().await
    }

    /// Tear down the tenant's datastores and cascade its assignment record
    pub async fn delete_tenant(&self, identifier: &str) -> Result<(), StoreError> {
        if let Some(backend) = self.keyspace() {
            if let Some(record) = self.store.get_record(identifier).await? {
                backend.drop_keyspace(&record.keyspace_name).await?;
                self.store.delete_record(identifier).await?;
                self.assignments.delete(identifier).await?;
                info!(tenant = identifier, keyspace = %record.keyspace_name, "tenant keyspace dropped");
            }
        }

        if let Some(backend) = self.relational() {
            if let Some(info) = self.store.find_connection_info(identifier).await? {
                backend.drop_database(&info.database_name).await?;
                self.store.delete_connection_info(identifier).await?;
                info!(tenant = identifier, database = %info.database_name, "tenant database dropped");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryKeyspaceBackend, InMemoryRelationalBackend};
    use fabric_common::{DatabaseConnectionInfo, KeyspaceConnectionInfo};

    struct Fixture {
        keyspace: Arc<InMemoryKeyspaceBackend>,
        relational: Arc<InMemoryRelationalBackend>,
        provisioner: DatastoreProvisioner,
    }

    fn fixture(option: DataStoreOption) -> Fixture {
        let keyspace = Arc::new(InMemoryKeyspaceBackend::new());
        let relational = Arc::new(InMemoryRelationalBackend::new());

        let store = Arc::new(
            TenantStore::new(
                option,
                Some(keyspace.clone() as Arc<dyn KeyspaceBackend>),
                Some(relational.clone() as Arc<dyn RelationalBackend>),
            )
            .unwrap(),
        );
        let assignments = Arc::new(AssignmentStore::new(
            keyspace.clone() as Arc<dyn KeyspaceBackend>
        ));

        let provisioner = DatastoreProvisioner::new(
            option,
            Some(keyspace.clone() as Arc<dyn KeyspaceBackend>),
            Some(relational.clone() as Arc<dyn RelationalBackend>),
            store,
            assignments,
        );

        Fixture {
            keyspace,
            relational,
            provisioner,
        }
    }

    fn tenant(identifier: &str) -> Tenant {
        Tenant {
            identifier: identifier.into(),
            name: "Test Tenant".into(),
            description: Some("provisioner test".into()),
            keyspace_connection_info: Some(KeyspaceConnectionInfo {
                cluster_name: "main".into(),
                contact_points: "cas1:9042,cas2:9042".into(),
                keyspace: format!("{}_ks", identifier),
                replication_type: "Simple".into(),
                replicas: "3".into(),
            }),
            database_connection_info: Some(DatabaseConnectionInfo {
                driver_class: "mariadb".into(),
                host: "db.internal".into(),
                port: "3306".into(),
                database_name: format!("{}_db", identifier),
                user: "fabric".into(),
                password: "secret".into(),
            }),
            identity_manager_application_name: None,
            identity_manager_application_uri: None,
        }
    }

    #[tokio::test]
    async fn cassandra_only_never_touches_the_relational_backend() {
        let f = fixture(DataStoreOption::Cassandra);

        f.provisioner.create_tenant(&tenant("acme")).await.unwrap();
        f.provisioner.find_tenant("acme").await.unwrap().unwrap();
        f.provisioner.fetch_all_tenants().await.unwrap();
        f.provisioner.delete_tenant("acme").await.unwrap();

        assert_eq!(f.relational.operation_count(), 0);
        assert!(f.keyspace.operation_count() > 0);
    }

    #[tokio::test]
    async fn rdbms_only_never_touches_the_keyspace_backend() {
        let f = fixture(DataStoreOption::Rdbms);

        f.provisioner.create_tenant(&tenant("acme")).await.unwrap();
        f.provisioner.find_tenant("acme").await.unwrap().unwrap();
        f.provisioner.fetch_all_tenants().await.unwrap();
        f.provisioner.delete_tenant("acme").await.unwrap();

        assert_eq!(f.keyspace.operation_count(), 0);
        assert!(f.relational.operation_count() > 0);
    }

    #[tokio::test]
    async fn create_provisions_both_backends_when_all_enabled() {
        let f = fixture(DataStoreOption::All);

        f.provisioner.create_tenant(&tenant("acme")).await.unwrap();

        assert!(f.keyspace.has_keyspace("acme_ks"));
        assert!(f.relational.has_database("acme_db"));

        let found = f.provisioner.find_tenant("acme").await.unwrap().unwrap();
        assert!(found.keyspace_connection_info.is_some());
        assert!(found.database_connection_info.is_some());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let f = fixture(DataStoreOption::All);
        f.provisioner.create_tenant(&tenant("acme")).await.unwrap();

        let err = f.provisioner.create_tenant(&tenant("acme")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn malformed_replication_spec_is_a_bad_request() {
        let f = fixture(DataStoreOption::Cassandra);
        let mut bad = tenant("acme");
        bad.keyspace_connection_info.as_mut().unwrap().replicas = "several".into();

        let err = f.provisioner.create_tenant(&bad).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidReplication(_)));
        assert!(!f.keyspace.has_keyspace("acme_ks"));
    }

    #[tokio::test]
    async fn delete_drops_artifacts_and_cascades_the_assignment() {
        let f = fixture(DataStoreOption::All);
        f.provisioner.create_tenant(&tenant("acme")).await.unwrap();

        f.keyspace
            .upsert_assignment(&crate::keyspace::AssignmentRecord {
                tenant_identifier: "acme".into(),
                applications: ["ledger-v1".to_string()].into_iter().collect(),
            })
            .await
            .unwrap();

        f.provisioner.delete_tenant("acme").await.unwrap();

        assert!(!f.keyspace.has_keyspace("acme_ks"));
        assert!(!f.relational.has_database("acme_db"));
        assert!(f.keyspace.get_assignment("acme").await.unwrap().is_none());
        assert!(f.provisioner.find_tenant("acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_an_unknown_tenant_is_a_quiet_no_op() {
        let f = fixture(DataStoreOption::All);
        f.provisioner.delete_tenant("ghost").await.unwrap();
    }
}
