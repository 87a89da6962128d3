//! Assignment Worker
//!
//! Executes assignment sagas off the request path. Steps within one
//! application are strictly sequential; applications in one batch run one
//! after the other, and a failure in one never aborts its siblings.

use fabric_common::{ServiceError, ServiceResult, SignatureSet};
use fabric_identity::{
    call_endpoint_sets, group_permittables, AuthorizationProvisioningClient,
    IdentityProvisioningClient,
};
use fabric_store::{ApplicationStore, AssignmentStore, TenantStore};
use fabric_token::ContextMinter;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::progress::{SagaProgressLog, SagaStatus};

/// How long the saga waits for one identity acknowledgment
pub const ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the saga needs to run
pub struct ProvisioningServices {
    pub tenants: Arc<TenantStore>,
    pub applications: Arc<ApplicationStore>,
    pub assignments: Arc<AssignmentStore>,
    pub identity: Arc<IdentityProvisioningClient>,
    pub authorization: Arc<AuthorizationProvisioningClient>,
    pub contexts: Arc<dyn ContextMinter>,
    pub progress: SagaProgressLog,
}

/// One accepted assignment request
#[derive(Debug)]
pub struct AssignmentJob {
    pub execution_id: String,
    pub tenant_identifier: String,
    pub applications: BTreeSet<String>,
    pub application_uris: BTreeMap<String, String>,
}

pub(crate) fn spawn_worker(
    services: Arc<ProvisioningServices>,
) -> (mpsc::Sender<AssignmentJob>, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::channel::<AssignmentJob>(32);

    let handle = tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            run_assignment(&services, job).await;
        }
    });

    (sender, handle)
}

pub(crate) async fn run_assignment(services: &ProvisioningServices, job: AssignmentJob) {
    let progress = &services.progress;
    let tenant = job.tenant_identifier.clone();
    progress.mark_running(&job.execution_id);

    if let Err(e) = services
        .assignments
        .upsert(&tenant, job.applications.clone())
        .await
    {
        error!(tenant = %tenant, error = %e, "persisting the assignment failed");
        progress.finish(&job.execution_id, SagaStatus::Failed, Some(e.to_string()));
        return;
    }

    let record = match services.tenants.get_record(&tenant).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            error!(tenant = %tenant, "tenant vanished between acceptance and execution");
            progress.finish(
                &job.execution_id,
                SagaStatus::Failed,
                Some("tenant not found".into()),
            );
            return;
        }
        Err(e) => {
            error!(tenant = %tenant, error = %e, "could not load tenant record");
            progress.finish(&job.execution_id, SagaStatus::Failed, Some(e.to_string()));
            return;
        }
    };

    let (identity_manager_name, identity_manager_uri) = match (
        record.identity_manager_application_name,
        record.identity_manager_application_uri,
    ) {
        (Some(name), Some(uri)) => (name, uri),
        _ => {
            warn!(
                tenant = %tenant,
                "no identity manager assigned, applications cannot be secured yet"
            );
            progress.finish(
                &job.execution_id,
                SagaStatus::Stopped,
                Some("no identity manager assigned".into()),
            );
            return;
        }
    };

    // The root of trust is read once per run.
    let identity_signature_set = match services.tenants.latest_signature_set(&tenant).await {
        Ok(Some(set)) => set,
        Ok(None) => {
            warn!(
                tenant = %tenant,
                "identity manager signature set absent, applications cannot be secured yet"
            );
            progress.finish(
                &job.execution_id,
                SagaStatus::Stopped,
                Some("identity manager signature set absent".into()),
            );
            return;
        }
        Err(e) => {
            error!(tenant = %tenant, error = %e, "could not read identity manager signature set");
            progress.finish(&job.execution_id, SagaStatus::Failed, Some(e.to_string()));
            return;
        }
    };

    for application_name in &job.applications {
        if *application_name == identity_manager_name {
            continue;
        }
        let application_uri = job
            .application_uris
            .get(application_name)
            .cloned()
            .unwrap_or_default();

        if let Err(e) = secure_application(
            services,
            &job,
            &identity_manager_name,
            &identity_manager_uri,
            &identity_signature_set,
            application_name,
            &application_uri,
        )
        .await
        {
            error!(
                tenant = %tenant,
                application = %application_name,
                error = %e,
                "application onboarding failed, continuing with remaining applications"
            );
        }
    }

    progress.finish(&job.execution_id, SagaStatus::Completed, None);
    info!(tenant = %tenant, execution = %job.execution_id, "assignment saga finished");
}

/// Run steps (a) through (f) for one application; an error aborts only
/// this application's remaining steps.
#[allow(clippy::too_many_arguments)]
async fn secure_application(
    services: &ProvisioningServices,
    job: &AssignmentJob,
    identity_manager_name: &str,
    identity_manager_uri: &str,
    identity_signature_set: &SignatureSet,
    application_name: &str,
    application_uri: &str,
) -> ServiceResult<()> {
    let tenant = &job.tenant_identifier;
    let progress = &services.progress;
    let execution = &job.execution_id;

    // (a) discover and register permittable groups, one bounded wait per
    // group; a timed-out acknowledgment is a warning, not a failure
    progress.step_started(execution, application_name, "permittable-groups");
    let endpoints = services
        .authorization
        .discover_permittable_endpoints(tenant, application_uri)
        .await;
    let groups = group_permittables(&endpoints);

    let identity_context = services
        .contexts
        .system_context(tenant, identity_manager_name)
        .map_err(|e| {
            let e = ServiceError::internal(e.to_string());
            progress.step_failed(execution, application_name, "permittable-groups", &e.to_string());
            e
        })?;

    for group in &groups {
        let expectation = services
            .identity
            .create_or_find_permittable_group(&identity_context, identity_manager_uri, group)
            .await;
        if !expectation.wait(ACK_TIMEOUT).await {
            warn!(
                tenant = %tenant,
                group = %group.identifier,
                "identity did not acknowledge group registration in time"
            );
        }
    }
    progress.step_completed(execution, application_name, "permittable-groups");

    // (b) the application mints its signature set against the identity
    // manager's key epoch
    progress.step_started(execution, application_name, "signature-set");
    let application_signature_set = match services
        .authorization
        .create_signature_set(
            tenant,
            application_name,
            application_uri,
            &identity_signature_set.timestamp,
            &identity_signature_set.identity_manager_signature,
        )
        .await
    {
        Ok(set) => set,
        Err(e) => {
            progress.step_failed(execution, application_name, "signature-set", &e.to_string());
            return Err(e);
        }
    };
    progress.step_completed(execution, application_name, "signature-set");

    // (c) discover required permissions; degrades to empty on failure
    progress.step_started(execution, application_name, "required-permissions");
    let required_permissions = services
        .authorization
        .discover_required_permissions(tenant, application_name, application_uri)
        .await;
    progress.step_completed(execution, application_name, "required-permissions");

    // (d) push the application signature to identity, bounded wait
    progress.step_started(execution, application_name, "signature-push");
    let expectation = match services
        .identity
        .push_application_signature(
            &identity_context,
            identity_manager_uri,
            application_name,
            &application_signature_set,
        )
        .await
    {
        Ok(expectation) => expectation,
        Err(e) => {
            progress.step_failed(execution, application_name, "signature-push", &e.to_string());
            return Err(e);
        }
    };
    if !expectation.wait(ACK_TIMEOUT).await {
        warn!(
            tenant = %tenant,
            application = %application_name,
            "identity did not acknowledge the application signature in time"
        );
    }
    progress.step_completed(execution, application_name, "signature-push");

    // (e) permissions, then call endpoint sets grouped by purpose
    progress.step_started(execution, application_name, "permissions");
    for permission in &required_permissions {
        services
            .identity
            .create_or_find_application_permission(
                &identity_context,
                identity_manager_uri,
                application_name,
                permission,
            )
            .await;
    }
    for endpoint_set in call_endpoint_sets(&required_permissions) {
        services
            .identity
            .create_or_find_call_endpoint_set(
                &identity_context,
                identity_manager_uri,
                application_name,
                &endpoint_set,
            )
            .await;
    }
    progress.step_completed(execution, application_name, "permissions");

    // (f) resource initialization, always last: the application may call
    // back into services expecting its permissions to already exist
    progress.step_started(execution, application_name, "initialize-resources");
    if let Err(e) = services
        .authorization
        .initialize_resources(tenant, application_name, application_uri)
        .await
    {
        progress.step_failed(
            execution,
            application_name,
            "initialize-resources",
            &e.to_string(),
        );
        return Err(e);
    }
    progress.step_completed(execution, application_name, "initialize-resources");

    info!(
        tenant = %tenant,
        application = %application_name,
        "application secured"
    );
    Ok(())
}
