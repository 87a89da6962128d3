//! Collaborator API Contracts
//!
//! The operations the core consumes from the identity manager and from a
//! target application's authorization surface. Implementations live in
//! [`crate::http`]; tests plug in hand-rolled fakes.

use async_trait::async_trait;
use fabric_common::{
    ApplicationPermission, CallEndpointSet, Permission, PermittableEndpoint, PermittableGroup,
    Signature, SignatureSet,
};
use fabric_token::CallContext;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The identity manager was initialized on an earlier run
    #[error("tenant already initialized")]
    AlreadyInitialized,

    /// The resource exists; resolved locally by fetch-and-compare
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The remote service did not accept our system token
    #[error("token rejected by remote service")]
    InvalidToken,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("remote call failed: {0}")]
    Remote(String),
}

/// The identity manager's provisioning surface
#[async_trait]
pub trait IdentityManagerApi: Send + Sync {
    /// Initialize the tenant's identity manager with the hashed admin
    /// password; `AlreadyInitialized` when a previous run got here first
    async fn initialize(
        &self,
        context: &CallContext,
        identity_uri: &str,
        password_hash: &str,
    ) -> Result<SignatureSet, ApiError>;

    async fn get_latest_signature_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
    ) -> Result<SignatureSet, ApiError>;

    async fn create_permittable_group(
        &self,
        context: &CallContext,
        identity_uri: &str,
        group: &PermittableGroup,
    ) -> Result<(), ApiError>;

    async fn get_permittable_group(
        &self,
        context: &CallContext,
        identity_uri: &str,
        group_identifier: &str,
    ) -> Result<PermittableGroup, ApiError>;

    async fn set_application_signature(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        key_timestamp: &str,
        signature: &Signature,
    ) -> Result<(), ApiError>;

    async fn create_application_permission(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        permission: &Permission,
    ) -> Result<(), ApiError>;

    async fn get_application_permission(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        group_identifier: &str,
    ) -> Result<Permission, ApiError>;

    async fn create_application_call_endpoint_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        endpoint_set: &CallEndpointSet,
    ) -> Result<(), ApiError>;

    async fn get_application_call_endpoint_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        set_identifier: &str,
    ) -> Result<CallEndpointSet, ApiError>;
}

/// The authorization surface every assigned application exposes
#[async_trait]
pub trait AuthorizationApi: Send + Sync {
    async fn get_permittable_endpoints(
        &self,
        context: &CallContext,
        application_uri: &str,
    ) -> Result<Vec<PermittableEndpoint>, ApiError>;

    /// Ask the application to mint its own signature set bound to the
    /// identity manager's current key epoch
    async fn create_signature_set(
        &self,
        context: &CallContext,
        application_uri: &str,
        key_timestamp: &str,
        identity_signature: &Signature,
    ) -> Result<SignatureSet, ApiError>;

    async fn initialize_resources(
        &self,
        context: &CallContext,
        application_uri: &str,
    ) -> Result<(), ApiError>;
}

/// The permission-requirements surface of a target application
#[async_trait]
pub trait PermissionRequirementsApi: Send + Sync {
    async fn get_required_permissions(
        &self,
        context: &CallContext,
        application_uri: &str,
    ) -> Result<Vec<ApplicationPermission>, ApiError>;
}
