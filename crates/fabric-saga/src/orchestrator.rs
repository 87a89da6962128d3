//! Assignment Orchestrator
//!
//! The synchronous entry points of the onboarding saga. Identity-manager
//! assignment runs inline and returns the one-time admin password;
//! application assignment validates its preconditions, queues a job for
//! the background worker and returns an execution id immediately.

use fabric_common::{ServiceError, ServiceResult};
use fabric_store::StoreError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::worker::{spawn_worker, AssignmentJob, ProvisioningServices};

pub struct AssignmentOrchestrator {
    services: Arc<ProvisioningServices>,
    sender: Mutex<Option<mpsc::Sender<AssignmentJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AssignmentOrchestrator {
    /// Spawn the background worker and return the orchestrator in front
    /// of it.
    pub fn new(services: Arc<ProvisioningServices>) -> Self {
        let (sender, worker) = spawn_worker(services.clone());
        Self {
            services,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Persist the identity-manager choice, initialize it, and store the
    /// returned signature set as the tenant's root of trust. Returns the
    /// one-time admin password, absent when the identity manager was
    /// already initialized.
    pub async fn assign_identity_manager(
        &self,
        tenant_identifier: &str,
        application_name: &str,
        application_uri: &str,
    ) -> ServiceResult<Option<String>> {
        self.services
            .tenants
            .set_identity_manager(tenant_identifier, application_name, application_uri)
            .await
            .map_err(ServiceError::from)?;

        let initialization = self
            .services
            .identity
            .initialize_tenant(tenant_identifier, application_name, application_uri)
            .await?;

        self.services
            .tenants
            .store_signature_set(tenant_identifier, &initialization.signature_set)
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = tenant_identifier,
            application = application_name,
            "identity manager assigned"
        );
        Ok(initialization.admin_password)
    }

    /// Accept an application assignment. The tenant must exist and every
    /// named application must be registered; the saga itself runs on the
    /// background worker. Returns the saga execution id.
    pub async fn assign_applications(
        &self,
        tenant_identifier: &str,
        applications: BTreeSet<String>,
    ) -> ServiceResult<String> {
        if self
            .services
            .tenants
            .get_record(tenant_identifier)
            .await
            .map_err(ServiceError::from)?
            .is_none()
        {
            return Err(ServiceError::not_found(format!(
                "tenant {} not found",
                tenant_identifier
            )));
        }

        let mut application_uris = BTreeMap::new();
        for name in &applications {
            match self.services.applications.find(name).await {
                Ok(application) => {
                    application_uris.insert(name.clone(), application.homepage.unwrap_or_default());
                }
                Err(StoreError::ApplicationNotFound(_)) => {
                    return Err(ServiceError::bad_request(format!(
                        "application {} is not registered",
                        name
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let execution_id = self.services.progress.begin(tenant_identifier);
        let job = AssignmentJob {
            execution_id: execution_id.clone(),
            tenant_identifier: tenant_identifier.to_string(),
            applications,
            application_uris,
        };

        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| ServiceError::internal("assignment worker is shut down"))?;
        sender
            .send(job)
            .await
            .map_err(|_| ServiceError::internal("assignment worker is not running"))?;

        info!(
            tenant = tenant_identifier,
            execution = %execution_id,
            "application assignment accepted"
        );
        Ok(execution_id)
    }

    /// The tenant's current assignment set, how callers observe the
    /// saga's outcome.
    pub async fn find_assignment(
        &self,
        tenant_identifier: &str,
    ) -> ServiceResult<BTreeSet<String>> {
        if self
            .services
            .tenants
            .get_record(tenant_identifier)
            .await
            .map_err(ServiceError::from)?
            .is_none()
        {
            return Err(ServiceError::not_found(format!(
                "tenant {} not found",
                tenant_identifier
            )));
        }

        Ok(self
            .services
            .assignments
            .find(tenant_identifier)
            .await
            .map_err(ServiceError::from)?
            .map(|record| record.applications)
            .unwrap_or_default())
    }

    pub fn progress(&self) -> &crate::progress::SagaProgressLog {
        &self.services.progress
    }

    /// Stop accepting work and wait for queued sagas to drain.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{SagaProgressLog, SagaStatus, StepStatus};
    use async_trait::async_trait;
    use fabric_common::{
        AllowedOperation, Application, ApplicationPermission, CallEndpointSet, Permission,
        PermittableEndpoint, PermittableGroup, Signature, SignatureSet,
    };
    use fabric_events::IdentityEventListener;
    use fabric_identity::{
        ApiError, AuthorizationApi, AuthorizationProvisioningClient, IdentityManagerApi,
        IdentityProvisioningClient, PermissionRequirementsApi,
    };
    use fabric_store::{
        ApplicationStore, AssignmentStore, DataStoreOption, InMemoryKeyspaceBackend,
        KeyspaceBackend, TenantRecord, TenantStore,
    };
    use fabric_token::{CallContext, ContextMinter, TokenError};
    use std::collections::BTreeSet;

    type CallLog = Arc<Mutex<Vec<String>>>;

    const IDENTITY_URI: &str = "http://identity";
    const KEY_TIMESTAMP: &str = "2026-01-01T00:00:00";

    struct StaticContexts;

    impl ContextMinter for StaticContexts {
        fn system_context(
            &self,
            tenant_identifier: &str,
            _audience_application: &str,
        ) -> Result<CallContext, TokenError> {
            Ok(CallContext::system(tenant_identifier, "test-token"))
        }

        fn guest_context(&self, tenant_identifier: &str) -> CallContext {
            CallContext::guest(tenant_identifier)
        }
    }

    /// Identity manager fake: in-memory state, shared call log, publishes
    /// acknowledgments the way the real one does over the bus.
    struct FakeIdentityManager {
        log: CallLog,
        listener: IdentityEventListener,
        groups: Mutex<std::collections::BTreeMap<String, PermittableGroup>>,
        endpoint_sets: Mutex<std::collections::BTreeMap<String, CallEndpointSet>>,
        initialized: Mutex<Option<SignatureSet>>,
    }

    impl FakeIdentityManager {
        fn new(log: CallLog, listener: IdentityEventListener) -> Self {
            Self {
                log,
                listener,
                groups: Mutex::new(Default::default()),
                endpoint_sets: Mutex::new(Default::default()),
                initialized: Mutex::new(None),
            }
        }

        fn record(&self, entry: impl Into<String>) {
            self.log.lock().push(entry.into());
        }
    }

    fn identity_signature_set() -> SignatureSet {
        SignatureSet::new(
            KEY_TIMESTAMP,
            Signature {
                public_key_mod: "AQCD".into(),
                public_key_exp: "AQAB".into(),
            },
            Signature {
                public_key_mod: "AQCD".into(),
                public_key_exp: "AQAB".into(),
            },
        )
    }

    #[async_trait]
    impl IdentityManagerApi for FakeIdentityManager {
        async fn initialize(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
            _password_hash: &str,
        ) -> Result<SignatureSet, ApiError> {
            self.record("identity:initialize");
            let mut initialized = self.initialized.lock();
            match initialized.as_ref() {
                Some(_) => Err(ApiError::AlreadyInitialized),
                None => {
                    let set = identity_signature_set();
                    *initialized = Some(set.clone());
                    Ok(set)
                }
            }
        }

        async fn get_latest_signature_set(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
        ) -> Result<SignatureSet, ApiError> {
            self.record("identity:get_latest_signature_set");
            self.initialized
                .lock()
                .clone()
                .ok_or_else(|| ApiError::NotFound("not initialized".into()))
        }

        async fn create_permittable_group(
            &self,
            context: &CallContext,
            _identity_uri: &str,
            group: &PermittableGroup,
        ) -> Result<(), ApiError> {
            self.record(format!("identity:create_group:{}", group.identifier));
            let mut groups = self.groups.lock();
            if groups.contains_key(&group.identifier) {
                return Err(ApiError::AlreadyExists(group.identifier.clone()));
            }
            groups.insert(group.identifier.clone(), group.clone());
            self.listener
                .on_permittable_group_created(context.tenant_identifier(), &group.identifier);
            Ok(())
        }

        async fn get_permittable_group(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
            group_identifier: &str,
        ) -> Result<PermittableGroup, ApiError> {
            self.record(format!("identity:get_group:{}", group_identifier));
            self.groups
                .lock()
                .get(group_identifier)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(group_identifier.to_string()))
        }

        async fn set_application_signature(
            &self,
            context: &CallContext,
            _identity_uri: &str,
            application_name: &str,
            key_timestamp: &str,
            _signature: &Signature,
        ) -> Result<(), ApiError> {
            self.record(format!("identity:set_signature:{}", application_name));
            let payload = serde_json::json!({
                "application": application_name,
                "timestamp": key_timestamp,
            })
            .to_string();
            self.listener
                .on_application_signature_set(context.tenant_identifier(), &payload);
            Ok(())
        }

        async fn create_application_permission(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
            application_name: &str,
            permission: &Permission,
        ) -> Result<(), ApiError> {
            self.record(format!(
                "identity:create_permission:{}:{}",
                application_name, permission.permittable_group_identifier
            ));
            Ok(())
        }

        async fn get_application_permission(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
            application_name: &str,
            group_identifier: &str,
        ) -> Result<Permission, ApiError> {
            Err(ApiError::NotFound(format!(
                "{}:{}",
                application_name, group_identifier
            )))
        }

        async fn create_application_call_endpoint_set(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
            application_name: &str,
            endpoint_set: &CallEndpointSet,
        ) -> Result<(), ApiError> {
            self.record(format!(
                "identity:create_endpoint_set:{}:{}",
                application_name, endpoint_set.identifier
            ));
            self.endpoint_sets.lock().insert(
                format!("{}:{}", application_name, endpoint_set.identifier),
                endpoint_set.clone(),
            );
            Ok(())
        }

        async fn get_application_call_endpoint_set(
            &self,
            _context: &CallContext,
            _identity_uri: &str,
            application_name: &str,
            set_identifier: &str,
        ) -> Result<CallEndpointSet, ApiError> {
            Err(ApiError::NotFound(format!(
                "{}:{}",
                application_name, set_identifier
            )))
        }
    }

    /// Authorization-surface fake for assigned applications, keyed by
    /// application URI.
    #[derive(Default)]
    struct FakeAuthorization {
        log: CallLog,
        endpoints: Mutex<std::collections::BTreeMap<String, Vec<PermittableEndpoint>>>,
        permissions: Mutex<std::collections::BTreeMap<String, Vec<ApplicationPermission>>>,
        fail_signature_for: Mutex<BTreeSet<String>>,
    }

    impl FakeAuthorization {
        fn new(log: CallLog) -> Self {
            Self {
                log,
                ..Default::default()
            }
        }

        fn record(&self, entry: impl Into<String>) {
            self.log.lock().push(entry.into());
        }
    }

    #[async_trait]
    impl AuthorizationApi for FakeAuthorization {
        async fn get_permittable_endpoints(
            &self,
            _context: &CallContext,
            application_uri: &str,
        ) -> Result<Vec<PermittableEndpoint>, ApiError> {
            self.record(format!("authz:endpoints:{}", application_uri));
            Ok(self
                .endpoints
                .lock()
                .get(application_uri)
                .cloned()
                .unwrap_or_default())
        }

        async fn create_signature_set(
            &self,
            _context: &CallContext,
            application_uri: &str,
            key_timestamp: &str,
            identity_signature: &Signature,
        ) -> Result<SignatureSet, ApiError> {
            self.record(format!("authz:create_signature_set:{}", application_uri));
            if self.fail_signature_for.lock().contains(application_uri) {
                return Err(ApiError::Remote("connection refused".into()));
            }
            Ok(SignatureSet::new(
                key_timestamp,
                Signature {
                    public_key_mod: "AQEF".into(),
                    public_key_exp: "AQAB".into(),
                },
                identity_signature.clone(),
            ))
        }

        async fn initialize_resources(
            &self,
            _context: &CallContext,
            application_uri: &str,
        ) -> Result<(), ApiError> {
            self.record(format!("authz:initialize_resources:{}", application_uri));
            Ok(())
        }
    }

    #[async_trait]
    impl PermissionRequirementsApi for FakeAuthorization {
        async fn get_required_permissions(
            &self,
            _context: &CallContext,
            application_uri: &str,
        ) -> Result<Vec<ApplicationPermission>, ApiError> {
            self.record(format!("authz:required_permissions:{}", application_uri));
            Ok(self
                .permissions
                .lock()
                .get(application_uri)
                .cloned()
                .unwrap_or_default())
        }
    }

    struct Fixture {
        orchestrator: AssignmentOrchestrator,
        keyspace: Arc<InMemoryKeyspaceBackend>,
        tenants: Arc<TenantStore>,
        applications: Arc<ApplicationStore>,
        identity_api: Arc<FakeIdentityManager>,
        authorization_api: Arc<FakeAuthorization>,
        log: CallLog,
    }

    fn fixture() -> Fixture {
        let keyspace = Arc::new(InMemoryKeyspaceBackend::new());
        let tenants = Arc::new(
            TenantStore::new(
                DataStoreOption::Cassandra,
                Some(keyspace.clone() as Arc<dyn KeyspaceBackend>),
                None,
            )
            .unwrap(),
        );
        let applications = Arc::new(ApplicationStore::new(
            keyspace.clone() as Arc<dyn KeyspaceBackend>
        ));
        let assignments = Arc::new(AssignmentStore::new(
            keyspace.clone() as Arc<dyn KeyspaceBackend>
        ));

        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let listener = IdentityEventListener::new();
        let identity_api = Arc::new(FakeIdentityManager::new(log.clone(), listener.clone()));
        let authorization_api = Arc::new(FakeAuthorization::new(log.clone()));
        let contexts: Arc<dyn ContextMinter> = Arc::new(StaticContexts);

        let identity = Arc::new(IdentityProvisioningClient::new(
            identity_api.clone(),
            listener,
            contexts.clone(),
            "example.org",
        ));
        let authorization = Arc::new(AuthorizationProvisioningClient::new(
            authorization_api.clone(),
            authorization_api.clone(),
            contexts.clone(),
        ));

        let services = Arc::new(ProvisioningServices {
            tenants: tenants.clone(),
            applications: applications.clone(),
            assignments,
            identity,
            authorization,
            contexts,
            progress: SagaProgressLog::new(),
        });

        Fixture {
            orchestrator: AssignmentOrchestrator::new(services),
            keyspace,
            tenants,
            applications,
            identity_api,
            authorization_api,
            log,
        }
    }

    async fn seed_tenant(f: &Fixture, with_identity_manager: bool, with_signature: bool) {
        let mut record = TenantRecord {
            identifier: "acme".into(),
            cluster_name: "main".into(),
            contact_points: "cas1:9042".into(),
            keyspace_name: "acme_ks".into(),
            replication_type: "Simple".into(),
            replicas: "3".into(),
            name: "Acme".into(),
            description: None,
            identity_manager_application_name: None,
            identity_manager_application_uri: None,
        };
        if with_identity_manager {
            record.identity_manager_application_name = Some("identity-v1".into());
            record.identity_manager_application_uri = Some(IDENTITY_URI.into());
        }
        f.keyspace.insert_tenant(&record).await.unwrap();

        if with_signature {
            f.tenants
                .store_signature_set("acme", &identity_signature_set())
                .await
                .unwrap();
        }
    }

    async fn register_application(f: &Fixture, name: &str, uri: &str) {
        f.applications
            .create(&Application {
                name: name.into(),
                description: None,
                vendor: None,
                homepage: Some(uri.into()),
            })
            .await
            .unwrap();
    }

    fn entries_matching<'a>(log: &'a [String], prefix: &str) -> Vec<&'a str> {
        log.iter()
            .filter(|e| e.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn saga_secures_an_application_end_to_end() {
        let f = fixture();
        seed_tenant(&f, true, true).await;
        register_application(&f, "identity-v1", IDENTITY_URI).await;
        register_application(&f, "ledger-v1", "http://ledger").await;

        f.authorization_api.endpoints.lock().insert(
            "http://ledger".into(),
            vec![
                PermittableEndpoint::new("/x/y", "POST", "x"),
                PermittableEndpoint::new("/y/z", "POST", "x"),
                PermittableEndpoint::new("/y/z", "GET", "x"),
                PermittableEndpoint::new("/m/n", "GET", "m"),
            ],
        );
        f.authorization_api.permissions.lock().insert(
            "http://ledger".into(),
            vec![
                ApplicationPermission {
                    endpoint_set_identifier: "forPurposeFoo".into(),
                    permission: Permission {
                        permittable_group_identifier: "x".into(),
                        allowed_operations: AllowedOperation::all(),
                    },
                },
                ApplicationPermission {
                    endpoint_set_identifier: "forPurposeBar".into(),
                    permission: Permission {
                        permittable_group_identifier: "m".into(),
                        allowed_operations: AllowedOperation::only(AllowedOperation::Read),
                    },
                },
            ],
        );

        let execution_id = f
            .orchestrator
            .assign_applications("acme", ["ledger-v1".to_string()].into_iter().collect())
            .await
            .unwrap();
        f.orchestrator.shutdown().await;

        let log = f.log.lock().clone();

        // Exactly two groups, in first-seen order, with duplicates collapsed.
        assert_eq!(
            entries_matching(&log, "identity:create_group:"),
            vec!["identity:create_group:x", "identity:create_group:m"]
        );
        let groups = f.identity_api.groups.lock();
        assert_eq!(groups.get("x").unwrap().permittables.len(), 3);
        assert_eq!(groups.get("m").unwrap().permittables.len(), 1);
        drop(groups);

        // Exactly one signature push.
        assert_eq!(
            entries_matching(&log, "identity:set_signature:").len(),
            1
        );

        // Two permissions and two call endpoint sets with the right bodies.
        assert_eq!(
            entries_matching(&log, "identity:create_permission:"),
            vec![
                "identity:create_permission:ledger-v1:x",
                "identity:create_permission:ledger-v1:m"
            ]
        );
        let endpoint_sets = f.identity_api.endpoint_sets.lock();
        assert_eq!(
            endpoint_sets
                .get("ledger-v1:forPurposeFoo")
                .unwrap()
                .permittable_endpoint_group_identifiers,
            vec!["x"]
        );
        assert_eq!(
            endpoint_sets
                .get("ledger-v1:forPurposeBar")
                .unwrap()
                .permittable_endpoint_group_identifiers,
            vec!["m"]
        );
        drop(endpoint_sets);

        // Resource initialization is the very last call.
        assert_eq!(
            log.last().map(String::as_str),
            Some("authz:initialize_resources:http://ledger")
        );

        // The assignment is observable and the saga completed.
        let assigned = f.orchestrator.find_assignment("acme").await.unwrap();
        assert!(assigned.contains("ledger-v1"));

        let execution = f.orchestrator.progress().get(&execution_id).unwrap();
        assert_eq!(execution.status, SagaStatus::Completed);
        assert!(execution
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn saga_stops_quietly_when_the_root_of_trust_is_absent() {
        let f = fixture();
        seed_tenant(&f, true, false).await;
        register_application(&f, "ledger-v1", "http://ledger").await;

        let execution_id = f
            .orchestrator
            .assign_applications("acme", ["ledger-v1".to_string()].into_iter().collect())
            .await
            .unwrap();
        f.orchestrator.shutdown().await;

        // No remote call was made, but the assignment itself persisted.
        assert!(f.log.lock().is_empty());
        let assigned = f.orchestrator.find_assignment("acme").await.unwrap();
        assert!(assigned.contains("ledger-v1"));

        let execution = f.orchestrator.progress().get(&execution_id).unwrap();
        assert_eq!(execution.status, SagaStatus::Stopped);
    }

    #[tokio::test]
    async fn assign_applications_requires_a_known_tenant() {
        let f = fixture();
        register_application(&f, "ledger-v1", "http://ledger").await;

        let err = f
            .orchestrator
            .assign_applications("ghost", ["ledger-v1".to_string()].into_iter().collect())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        f.orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn assign_applications_requires_registered_applications() {
        let f = fixture();
        seed_tenant(&f, true, true).await;

        let err = f
            .orchestrator
            .assign_applications("acme", ["unregistered".to_string()].into_iter().collect())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(_)));
        f.orchestrator.shutdown().await;
        assert!(f.log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn one_applications_failure_does_not_abort_its_siblings() {
        let f = fixture();
        seed_tenant(&f, true, true).await;
        register_application(&f, "broken-v1", "http://broken").await;
        register_application(&f, "good-v1", "http://good").await;

        f.authorization_api
            .endpoints
            .lock()
            .insert("http://good".into(), vec![PermittableEndpoint::new("/g", "GET", "g")]);
        f.authorization_api
            .fail_signature_for
            .lock()
            .insert("http://broken".into());

        let execution_id = f
            .orchestrator
            .assign_applications(
                "acme",
                ["broken-v1".to_string(), "good-v1".to_string()]
                    .into_iter()
                    .collect(),
            )
            .await
            .unwrap();
        f.orchestrator.shutdown().await;

        let log = f.log.lock().clone();

        // broken-v1 sorts first, fails at signature minting, and gets no
        // further steps; good-v1 still runs to completion.
        assert!(log.contains(&"authz:create_signature_set:http://broken".to_string()));
        assert!(!log.contains(&"identity:set_signature:broken-v1".to_string()));
        assert!(!log.contains(&"authz:initialize_resources:http://broken".to_string()));
        assert!(log.contains(&"authz:initialize_resources:http://good".to_string()));

        let execution = f.orchestrator.progress().get(&execution_id).unwrap();
        assert_eq!(execution.status, SagaStatus::Completed);
        assert!(execution
            .steps
            .iter()
            .any(|s| s.application == "broken-v1" && s.status == StepStatus::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn the_identity_manager_itself_is_not_onboarded() {
        let f = fixture();
        seed_tenant(&f, true, true).await;
        register_application(&f, "identity-v1", IDENTITY_URI).await;
        register_application(&f, "ledger-v1", "http://ledger").await;

        f.orchestrator
            .assign_applications(
                "acme",
                ["identity-v1".to_string(), "ledger-v1".to_string()]
                    .into_iter()
                    .collect(),
            )
            .await
            .unwrap();
        f.orchestrator.shutdown().await;

        let log = f.log.lock().clone();
        assert!(log
            .iter()
            .all(|entry| !entry.ends_with(&format!(":{}", IDENTITY_URI))));
        assert!(log.contains(&"authz:initialize_resources:http://ledger".to_string()));
    }

    #[tokio::test]
    async fn assign_identity_manager_twice_reuses_the_signature_set() {
        let f = fixture();
        seed_tenant(&f, false, false).await;

        let first = f
            .orchestrator
            .assign_identity_manager("acme", "identity-v1", IDENTITY_URI)
            .await
            .unwrap();
        let second = f
            .orchestrator
            .assign_identity_manager("acme", "identity-v1", IDENTITY_URI)
            .await
            .unwrap();

        assert_eq!(first.as_deref(), Some("ChangeThisPassword"));
        assert!(second.is_none());

        let stored = f
            .tenants
            .latest_signature_set("acme")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, identity_signature_set());

        let record = f.tenants.get_record("acme").await.unwrap().unwrap();
        assert_eq!(
            record.identity_manager_application_name.as_deref(),
            Some("identity-v1")
        );

        f.orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn assign_identity_manager_requires_an_existing_tenant() {
        let f = fixture();

        let err = f
            .orchestrator
            .assign_identity_manager("ghost", "identity-v1", IDENTITY_URI)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        f.orchestrator.shutdown().await;
    }
}
