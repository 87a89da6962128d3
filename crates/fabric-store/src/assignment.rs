//! Assignment Store
//!
//! Tenant → application assignment sets. Upserted whenever an assignment
//! is requested; removed wholesale when the tenant goes away.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::StoreError;
use crate::keyspace::{AssignmentRecord, KeyspaceBackend};

pub struct AssignmentStore {
    backend: Arc<dyn KeyspaceBackend>,
}

impl AssignmentStore {
    pub fn new(backend: Arc<dyn KeyspaceBackend>) -> Self {
        Self { backend }
    }

    pub async fn upsert(
        &self,
        tenant_identifier: &str,
        applications: BTreeSet<String>,
    ) -> Result<(), StoreError> {
        self.backend
            .upsert_assignment(&AssignmentRecord {
                tenant_identifier: tenant_identifier.to_string(),
                applications,
            })
            .await
    }

    pub async fn find(
        &self,
        tenant_identifier: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError> {
        self.backend.get_assignment(tenant_identifier).await
    }

    pub async fn delete(&self, tenant_identifier: &str) -> Result<(), StoreError> {
        self.backend.delete_assignment(tenant_identifier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryKeyspaceBackend;

    #[tokio::test]
    async fn upsert_replaces_the_assignment_set() {
        let store = AssignmentStore::new(Arc::new(InMemoryKeyspaceBackend::new()));

        store
            .upsert("acme", ["ledger-v1".to_string()].into_iter().collect())
            .await
            .unwrap();
        store
            .upsert(
                "acme",
                ["ledger-v1".to_string(), "reports-v1".to_string()]
                    .into_iter()
                    .collect(),
            )
            .await
            .unwrap();

        let found = store.find("acme").await.unwrap().unwrap();
        assert_eq!(found.applications.len(), 2);
    }

    #[tokio::test]
    async fn missing_assignment_reads_as_none() {
        let store = AssignmentStore::new(Arc::new(InMemoryKeyspaceBackend::new()));
        assert!(store.find("acme").await.unwrap().is_none());
    }
}
