//! Application Store
//!
//! Registry of deployable applications. Applications are independent of
//! tenants; deleting one removes it from every tenant's assignment set.

use fabric_common::Application;
use std::sync::Arc;

use crate::error::StoreError;
use crate::keyspace::KeyspaceBackend;

pub struct ApplicationStore {
    backend: Arc<dyn KeyspaceBackend>,
}

impl ApplicationStore {
    pub fn new(backend: Arc<dyn KeyspaceBackend>) -> Self {
        Self { backend }
    }

    pub async fn create(&self, application: &Application) -> Result<(), StoreError> {
        application
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        if self.backend.get_application(&application.name).await?.is_some() {
            return Err(StoreError::Duplicate(format!(
                "application {} already exists",
                application.name
            )));
        }
        self.backend.insert_application(application).await
    }

    pub async fn find(&self, name: &str) -> Result<Application, StoreError> {
        self.backend
            .get_application(name)
            .await?
            .ok_or_else(|| StoreError::ApplicationNotFound(name.to_string()))
    }

    pub async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.backend.get_application(name).await?.is_some())
    }

    pub async fn fetch_all(&self) -> Result<Vec<Application>, StoreError> {
        self.backend.fetch_all_applications().await
    }

    /// Delete the application and scrub it from every assignment
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.backend.delete_application(name).await?;

        for mut assignment in self.backend.fetch_all_assignments().await? {
            if assignment.applications.remove(name) {
                self.backend.upsert_assignment(&assignment).await?;
            }
        }
        Ok(())
    }
}
