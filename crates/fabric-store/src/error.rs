//! Store Errors

use fabric_common::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    #[error("already exists: {0}")]
    Duplicate(String),

    #[error("invalid replication spec: {0}")]
    InvalidReplication(String),

    #[error("missing connection info: {0}")]
    MissingConnectionInfo(String),

    #[error("invalid: {0}")]
    Invalid(String),

    #[error("keyspace already exists: {0}")]
    KeyspaceExists(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TenantNotFound(what) | StoreError::ApplicationNotFound(what) => {
                ServiceError::NotFound(what)
            }
            StoreError::Duplicate(what) => ServiceError::Conflict(what),
            StoreError::InvalidReplication(what)
            | StoreError::MissingConnectionInfo(what)
            | StoreError::Invalid(what)
            | StoreError::KeyspaceExists(what) => ServiceError::BadRequest(what),
            StoreError::BackendUnavailable(what) | StoreError::Backend(what) => {
                ServiceError::Internal(what)
            }
        }
    }
}
