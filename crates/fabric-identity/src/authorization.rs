//! Authorization Provisioning Client
//!
//! Calls against a newly assigned application's own authorization
//! endpoints. Discovery runs as guest and degrades to empty on any
//! failure; signature minting and resource initialization run under a
//! system context and abort the application's sub-saga on failure.

use fabric_common::{
    ApplicationPermission, PermittableEndpoint, ServiceError, ServiceResult, Signature,
    SignatureSet,
};
use fabric_token::ContextMinter;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::{AuthorizationApi, PermissionRequirementsApi};

pub struct AuthorizationProvisioningClient {
    authorization: Arc<dyn AuthorizationApi>,
    requirements: Arc<dyn PermissionRequirementsApi>,
    contexts: Arc<dyn ContextMinter>,
}

impl AuthorizationProvisioningClient {
    pub fn new(
        authorization: Arc<dyn AuthorizationApi>,
        requirements: Arc<dyn PermissionRequirementsApi>,
        contexts: Arc<dyn ContextMinter>,
    ) -> Self {
        Self {
            authorization,
            requirements,
            contexts,
        }
    }

    /// Guest-context read of the application's permittable endpoints. An
    /// unreachable application yields an empty list and a logged error,
    /// never an abort.
    pub async fn discover_permittable_endpoints(
        &self,
        tenant_identifier: &str,
        application_uri: &str,
    ) -> Vec<PermittableEndpoint> {
        let context = self.contexts.guest_context(tenant_identifier);
        match self
            .authorization
            .get_permittable_endpoints(&context, application_uri)
            .await
        {
            Ok(endpoints) => endpoints,
            Err(e) => {
                error!(
                    uri = application_uri,
                    error = %e,
                    "permittable endpoint discovery failed"
                );
                Vec::new()
            }
        }
    }

    /// Guest-context read of the permissions the application requires;
    /// same degrade-to-empty policy as endpoint discovery.
    pub async fn discover_required_permissions(
        &self,
        tenant_identifier: &str,
        application_name: &str,
        application_uri: &str,
    ) -> Vec<ApplicationPermission> {
        let context = self.contexts.guest_context(tenant_identifier);
        match self
            .requirements
            .get_required_permissions(&context, application_uri)
            .await
        {
            Ok(permissions) => {
                info!(
                    application = application_name,
                    count = permissions.len(),
                    "required permissions discovered"
                );
                permissions
            }
            Err(e) => {
                error!(
                    application = application_name,
                    error = %e,
                    "required permission discovery failed"
                );
                Vec::new()
            }
        }
    }

    /// Ask the application to mint its signature set, bound to the
    /// identity manager's current key epoch.
    pub async fn create_signature_set(
        &self,
        tenant_identifier: &str,
        application_name: &str,
        application_uri: &str,
        key_timestamp: &str,
        identity_signature: &Signature,
    ) -> ServiceResult<SignatureSet> {
        let context = self
            .contexts
            .system_context(tenant_identifier, application_name)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        let signature_set = self
            .authorization
            .create_signature_set(&context, application_uri, key_timestamp, identity_signature)
            .await
            .map_err(|e| {
                ServiceError::internal(format!(
                    "signature set creation on application {} failed: {}",
                    application_name, e
                ))
            })?;

        info!(
            tenant = tenant_identifier,
            application = application_name,
            timestamp = %signature_set.timestamp,
            "application signature set created"
        );
        Ok(signature_set)
    }

    /// Tell the application its security material is fully registered.
    /// Must be the last step for the application; it may call back into
    /// other services expecting its permissions to exist.
    pub async fn initialize_resources(
        &self,
        tenant_identifier: &str,
        application_name: &str,
        application_uri: &str,
    ) -> ServiceResult<()> {
        let context = self
            .contexts
            .system_context(tenant_identifier, application_name)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        self.authorization
            .initialize_resources(&context, application_uri)
            .await
            .map_err(|e| {
                ServiceError::internal(format!(
                    "resource initialization on application {} failed: {}",
                    application_name, e
                ))
            })?;

        info!(
            tenant = tenant_identifier,
            application = application_name,
            "application resources initialized"
        );
        Ok(())
    }
}
