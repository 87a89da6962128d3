//! Identity Provisioning Client
//!
//! Everything the saga pushes into a tenant's identity manager: tenant
//! initialization, permittable groups, application signatures, permissions
//! and call endpoint sets. Creates are paired with event expectations where
//! the identity manager acknowledges asynchronously, and "already exists"
//! responses are reconciled by fetch-and-compare instead of failing.

use fabric_common::{
    ApplicationPermission, CallEndpointSet, PermittableEndpoint, PermittableGroup, ServiceError,
    ServiceResult, SignatureSet,
};
use fabric_events::{EventExpectation, IdentityEventListener};
use fabric_token::hash::{hash_admin_password, INITIAL_ADMIN_PASSWORD};
use fabric_token::{CallContext, ContextMinter};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::{ApiError, IdentityManagerApi};

/// Outcome of initializing a tenant's identity manager
#[derive(Debug)]
pub struct TenantInitialization {
    pub signature_set: SignatureSet,
    /// The one-time admin password; absent when the identity manager was
    /// already initialized by an earlier run
    pub admin_password: Option<String>,
}

pub struct IdentityProvisioningClient {
    identity: Arc<dyn IdentityManagerApi>,
    listener: IdentityEventListener,
    contexts: Arc<dyn ContextMinter>,
    domain: String,
}

impl IdentityProvisioningClient {
    pub fn new(
        identity: Arc<dyn IdentityManagerApi>,
        listener: IdentityEventListener,
        contexts: Arc<dyn ContextMinter>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            listener,
            contexts,
            domain: domain.into(),
        }
    }

    /// Initialize the tenant's identity manager under a minted system
    /// context. An identity manager initialized by an earlier run yields
    /// its existing signature set and no password; a second password is
    /// never generated.
    pub async fn initialize_tenant(
        &self,
        tenant_identifier: &str,
        application_name: &str,
        identity_uri: &str,
    ) -> ServiceResult<TenantInitialization> {
        let context = self
            .contexts
            .system_context(tenant_identifier, application_name)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        let password_hash = hash_admin_password(tenant_identifier, &self.domain);

        match self
            .identity
            .initialize(&context, identity_uri, &password_hash)
            .await
        {
            Ok(signature_set) => {
                info!(tenant = tenant_identifier, "identity manager initialized");
                Ok(TenantInitialization {
                    signature_set,
                    admin_password: Some(INITIAL_ADMIN_PASSWORD.to_string()),
                })
            }
            Err(ApiError::AlreadyInitialized) => {
                let signature_set = self
                    .identity
                    .get_latest_signature_set(&context, identity_uri)
                    .await
                    .map_err(|e| {
                        ServiceError::internal(format!(
                            "could not fetch existing signature set: {}",
                            e
                        ))
                    })?;
                info!(
                    tenant = tenant_identifier,
                    "identity manager already initialized, reusing its signature set"
                );
                Ok(TenantInitialization {
                    signature_set,
                    admin_password: None,
                })
            }
            Err(ApiError::InvalidToken) => {
                warn!(
                    tenant = tenant_identifier,
                    "identity manager did not recognize the system token"
                );
                Err(ServiceError::conflict(
                    "identity manager did not recognize the system token; \
                     the system keys for the provisioner or the identity manager may be misconfigured",
                ))
            }
            Err(e) => Err(ServiceError::internal(format!(
                "identity initialization failed: {}",
                e
            ))),
        }
    }

    /// Register the group with identity, expectation first so a fast
    /// acknowledgment cannot be missed. An existing group is fetched and
    /// compared as unordered sets; mismatches are logged, never corrected.
    /// The returned expectation is already withdrawn when no
    /// acknowledgment can arrive.
    pub async fn create_or_find_permittable_group(
        &self,
        context: &CallContext,
        identity_uri: &str,
        group: &PermittableGroup,
    ) -> EventExpectation {
        let expectation = self
            .listener
            .expect_permittable_group_created(context.tenant_identifier(), &group.identifier);

        match self
            .identity
            .create_permittable_group(context, identity_uri, group)
            .await
        {
            Ok(()) => {
                info!(
                    tenant = context.tenant_identifier(),
                    group = %group.identifier,
                    "permittable group creation requested"
                );
            }
            Err(ApiError::AlreadyExists(_)) => {
                self.listener.withdraw(&expectation);
                match self
                    .identity
                    .get_permittable_group(context, identity_uri, &group.identifier)
                    .await
                {
                    Ok(existing) => {
                        let existing_endpoints: HashSet<&PermittableEndpoint> =
                            existing.permittables.iter().collect();
                        let wanted_endpoints: HashSet<&PermittableEndpoint> =
                            group.permittables.iter().collect();
                        if existing_endpoints != wanted_endpoints {
                            warn!(
                                tenant = context.tenant_identifier(),
                                group = %group.identifier,
                                "permittable group exists with different contents"
                            );
                        }
                    }
                    Err(e) => error!(
                        tenant = context.tenant_identifier(),
                        group = %group.identifier,
                        error = %e,
                        "could not fetch existing permittable group"
                    ),
                }
            }
            Err(e) => {
                self.listener.withdraw(&expectation);
                error!(
                    tenant = context.tenant_identifier(),
                    group = %group.identifier,
                    error = %e,
                    "permittable group creation failed"
                );
            }
        }

        expectation
    }

    /// Push the application's signature to identity, expectation first.
    /// Failure withdraws the expectation and aborts the caller's
    /// sub-saga for this application.
    pub async fn push_application_signature(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        signature_set: &SignatureSet,
    ) -> ServiceResult<EventExpectation> {
        let expectation = self.listener.expect_application_signature_set(
            context.tenant_identifier(),
            application_name,
            &signature_set.timestamp,
        );

        match self
            .identity
            .set_application_signature(
                context,
                identity_uri,
                application_name,
                &signature_set.timestamp,
                &signature_set.application_signature,
            )
            .await
        {
            Ok(()) => Ok(expectation),
            Err(e) => {
                self.listener.withdraw(&expectation);
                Err(ServiceError::internal(format!(
                    "pushing signature for application {} failed: {}",
                    application_name, e
                )))
            }
        }
    }

    /// Create-or-compare for an application permission. No acknowledgment
    /// event exists for permissions; nothing is waited on, and no failure
    /// escalates.
    pub async fn create_or_find_application_permission(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        application_permission: &ApplicationPermission,
    ) {
        let group = &application_permission.permission.permittable_group_identifier;
        match self
            .identity
            .create_application_permission(
                context,
                identity_uri,
                application_name,
                &application_permission.permission,
            )
            .await
        {
            Ok(()) => {
                info!(
                    application = application_name,
                    group = %group,
                    "application permission created"
                );
            }
            Err(ApiError::AlreadyExists(_)) => {
                match self
                    .identity
                    .get_application_permission(context, identity_uri, application_name, group)
                    .await
                {
                    Ok(existing) => {
                        if existing.allowed_operations
                            != application_permission.permission.allowed_operations
                        {
                            warn!(
                                application = application_name,
                                group = %group,
                                "application permission exists with different operations"
                            );
                        }
                    }
                    Err(e) => error!(
                        application = application_name,
                        group = %group,
                        error = %e,
                        "could not fetch existing application permission"
                    ),
                }
            }
            Err(e) => error!(
                application = application_name,
                group = %group,
                error = %e,
                "creating application permission failed"
            ),
        }
    }

    /// Create-or-compare for a call endpoint set; same no-ack, no-escalate
    /// policy as permissions.
    pub async fn create_or_find_call_endpoint_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        endpoint_set: &CallEndpointSet,
    ) {
        match self
            .identity
            .create_application_call_endpoint_set(
                context,
                identity_uri,
                application_name,
                endpoint_set,
            )
            .await
        {
            Ok(()) => {}
            Err(ApiError::AlreadyExists(_)) => {
                match self
                    .identity
                    .get_application_call_endpoint_set(
                        context,
                        identity_uri,
                        application_name,
                        &endpoint_set.identifier,
                    )
                    .await
                {
                    Ok(existing) => {
                        let existing_groups: HashSet<&String> = existing
                            .permittable_endpoint_group_identifiers
                            .iter()
                            .collect();
                        let wanted_groups: HashSet<&String> = endpoint_set
                            .permittable_endpoint_group_identifiers
                            .iter()
                            .collect();
                        if existing_groups != wanted_groups {
                            warn!(
                                application = application_name,
                                endpoint_set = %endpoint_set.identifier,
                                "call endpoint set exists with different contents"
                            );
                        }
                    }
                    Err(e) => error!(
                        application = application_name,
                        endpoint_set = %endpoint_set.identifier,
                        error = %e,
                        "could not fetch existing call endpoint set"
                    ),
                }
            }
            Err(e) => error!(
                application = application_name,
                endpoint_set = %endpoint_set.identifier,
                error = %e,
                "creating call endpoint set failed"
            ),
        }
    }
}

/// Partition endpoints into groups by group id, preserving first-seen group
/// order and collapsing duplicate endpoints within a group.
pub fn group_permittables(permittables: &[PermittableEndpoint]) -> Vec<PermittableGroup> {
    let mut groups: Vec<PermittableGroup> = Vec::new();

    for endpoint in permittables {
        match groups.iter_mut().find(|g| g.identifier == endpoint.group_id) {
            Some(group) => {
                if !group.permittables.contains(endpoint) {
                    group.permittables.push(endpoint.clone());
                }
            }
            None => groups.push(PermittableGroup::new(
                endpoint.group_id.clone(),
                vec![endpoint.clone()],
            )),
        }
    }

    groups
}

/// Partition required permissions into call endpoint sets by their
/// declared purpose, preserving first-seen purpose order.
pub fn call_endpoint_sets(permissions: &[ApplicationPermission]) -> Vec<CallEndpointSet> {
    let mut sets: Vec<CallEndpointSet> = Vec::new();

    for permission in permissions {
        let group = permission.permission.permittable_group_identifier.clone();
        match sets
            .iter_mut()
            .find(|s| s.identifier == permission.endpoint_set_identifier)
        {
            Some(set) => set.permittable_endpoint_group_identifiers.push(group),
            None => sets.push(CallEndpointSet {
                identifier: permission.endpoint_set_identifier.clone(),
                permittable_endpoint_group_identifiers: vec![group],
            }),
        }
    }

    sets
}
