//! Tenant Store
//!
//! Record-level persistence for tenant metadata across the enabled
//! backends. Keyspace-side rows hold identity and cluster parameters;
//! relational-side rows hold database connection parameters. Every path
//! consults the same enablement flag.

use fabric_common::{DatabaseConnectionInfo, KeyspaceConnectionInfo, SignatureSet, Tenant};
use std::sync::Arc;

use crate::error::StoreError;
use crate::keyspace::{KeyspaceBackend, TenantRecord};
use crate::option::DataStoreOption;
use crate::relational::RelationalBackend;

/// Dual-backend repository for tenant metadata
pub struct TenantStore {
    option: DataStoreOption,
    keyspace: Option<Arc<dyn KeyspaceBackend>>,
    relational: Option<Arc<dyn RelationalBackend>>,
}

impl TenantStore {
    pub fn new(
        option: DataStoreOption,
        keyspace: Option<Arc<dyn KeyspaceBackend>>,
        relational: Option<Arc<dyn RelationalBackend>>,
    ) -> Result<Self, StoreError> {
        if option.is_enabled(DataStoreOption::Cassandra) && keyspace.is_none() {
            return Err(StoreError::BackendUnavailable(
                "keyspace backend enabled but not configured".into(),
            ));
        }
        if option.is_enabled(DataStoreOption::Rdbms) && relational.is_none() {
            return Err(StoreError::BackendUnavailable(
                "relational backend enabled but not configured".into(),
            ));
        }
        Ok(Self {
            option,
            keyspace,
            relational,
        })
    }

    pub fn option(&self) -> DataStoreOption {
        self.option
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

    fn keyspace_required(&self) -> Result<&Arc<dyn KeyspaceBackend>, StoreError> {
        self.keyspace().ok_or_else(|| {
            StoreError::BackendUnavailable("keyspace backend disabled".into())
        })
    }

    /// Insert the keyspace-side metadata row; Conflict when the tenant
    /// already has one.
    pub async fn create_record(&self, record: &TenantRecord) -> Result<(), StoreError> {
        let backend = self.keyspace_required()?;
        if backend.get_tenant(&record.identifier).await?.is_some() {
            return Err(StoreError::Duplicate(format!(
                "tenant {} already exists",
                record.identifier
            )));
        }
        backend.insert_tenant(record).await
    }

    /// The keyspace-side metadata row, if the backend is enabled and the
    /// tenant known.
    pub async fn get_record(&self, identifier: &str) -> Result<Option<TenantRecord>, StoreError> {
        match self.keyspace() {
            Some(backend) => backend.get_tenant(identifier).await,
            None => Ok(None),
        }
    }

    pub async fn delete_record(&self, identifier: &str) -> Result<(), StoreError> {
        match self.keyspace() {
            Some(backend) => backend.delete_tenant(identifier).await,
            None => Ok(()),
        }
    }

    /// Set the identity-manager fields, the only mutation a tenant record
    /// sees after creation.
    pub async fn set_identity_manager(
        &self,
        identifier: &str,
        application_name: &str,
        application_uri: &str,
    ) -> Result<(), StoreError> {
        let backend = self.keyspace_required()?;
        let mut record = backend
            .get_tenant(identifier)
            .await?
            .ok_or_else(|| StoreError::TenantNotFound(identifier.to_string()))?;

        record.identity_manager_application_name = Some(application_name.to_string());
        record.identity_manager_application_uri = Some(application_uri.to_string());
        backend.update_tenant(&record).await
    }

    pub async fn store_signature_set(
        &self,
        identifier: &str,
        signature_set: &SignatureSet,
    ) -> Result<(), StoreError> {
        self.keyspace_required()?
            .store_signature_set(identifier, signature_set)
            .await
    }

    pub async fn latest_signature_set(
        &self,
        identifier: &str,
    ) -> Result<Option<SignatureSet>, StoreError> {
        match self.keyspace() {
            Some(backend) => backend.latest_signature_set(identifier).await,
            None => Ok(None),
        }
    }

    pub async fn record_connection_info(
        &self,
        identifier: &str,
        info: &DatabaseConnectionInfo,
    ) -> Result<(), StoreError> {
        match self.relational() {
            Some(backend) => backend.insert_connection_info(identifier, info).await,
            None => Ok(()),
        }
    }

    pub async fn connection_info_exists(&self, identifier: &str) -> Result<bool, StoreError> {
        match self.relational() {
            Some(backend) => backend.tenant_exists(identifier).await,
            None => Ok(false),
        }
    }

    pub async fn find_connection_info(
        &self,
        identifier: &str,
    ) -> Result<Option<DatabaseConnectionInfo>, StoreError> {
        match self.relational() {
            Some(backend) => backend.find_connection_info(identifier).await,
            None => Ok(None),
        }
    }

    pub async fn delete_connection_info(&self, identifier: &str) -> Result<(), StoreError> {
        match self.relational() {
            Some(backend) => backend.delete_connection_info(identifier).await,
            None => Ok(()),
        }
    }

    /// Assemble the tenant view from every enabled backend
    pub async fn find(&self, identifier: &str) -> Result<Option<Tenant>, StoreError> {
        if let Some(backend) = self.keyspace() {
            let Some(record) = backend.get_tenant(identifier).await? else {
                return Ok(None);
            };
            let mut tenant = tenant_from_record(&record);
            tenant.database_connection_info = self.find_connection_info(identifier).await?;
            return Ok(Some(tenant));
        }

        // Relational-only deployments reconstruct what they can from the
        // connection-info row.
        match self.find_connection_info(identifier).await? {
            Some(info) => Ok(Some(connection_only_tenant(identifier, info))),
            None => Ok(None),
        }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Tenant>, StoreError> {
        let mut tenants = Vec::new();

        if let Some(backend) = self.keyspace() {
            for record in backend.fetch_all_tenants().await? {
                tenants.push(tenant_from_record(&record));
            }
        }

        if let Some(backend) = self.relational() {
            if tenants.is_empty() {
                for (identifier, info) in backend.fetch_all_connection_info().await? {
                    tenants.push(connection_only_tenant(&identifier, info));
                }
            } else {
                for tenant in tenants.iter_mut() {
                    tenant.database_connection_info =
                        backend.find_connection_info(&tenant.identifier).await?;
                }
            }
        }

        Ok(tenants)
    }
}

fn tenant_from_record(record: &TenantRecord) -> Tenant {
    Tenant {
        identifier: record.identifier.clone(),
        name: record.name.clone(),
        description: record.description.clone(),
        keyspace_connection_info: Some(KeyspaceConnectionInfo {
            cluster_name: record.cluster_name.clone(),
            contact_points: record.contact_points.clone(),
            keyspace: record.keyspace_name.clone(),
            replication_type: record.replication_type.clone(),
            replicas: record.replicas.clone(),
        }),
        database_connection_info: None,
        identity_manager_application_name: record.identity_manager_application_name.clone(),
        identity_manager_application_uri: record.identity_manager_application_uri.clone(),
    }
}

fn connection_only_tenant(identifier: &str, info: DatabaseConnectionInfo) -> Tenant {
    Tenant {
        identifier: identifier.to_string(),
        name: identifier.to_string(),
        description: None,
        keyspace_connection_info: None,
        database_connection_info: Some(info),
        identity_manager_application_name: None,
        identity_manager_application_uri: None,
    }
}
