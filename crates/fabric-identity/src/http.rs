//! HTTP Implementations
//!
//! `reqwest`-backed clients for the collaborator APIs. Every request
//! carries the tenant header; authenticated requests add the bearer token
//! from the call context. Per-call timeouts are set here because the
//! provisioning layer imposes none of its own.

use async_trait::async_trait;
use fabric_common::{
    ApplicationPermission, CallEndpointSet, Permission, PermittableEndpoint, PermittableGroup,
    Signature, SignatureSet,
};
use fabric_token::{CallContext, AUTHORIZATION_HEADER, TENANT_HEADER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::api::{ApiError, AuthorizationApi, IdentityManagerApi, PermissionRequirementsApi};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(CALL_TIMEOUT)
        .build()
        .map_err(|e| ApiError::Remote(e.to_string()))
}

fn with_context(request: RequestBuilder, context: &CallContext) -> RequestBuilder {
    let request = request.header(TENANT_HEADER, context.tenant_identifier());
    match context.bearer_token() {
        Some(token) => request.header(AUTHORIZATION_HEADER, format!("Bearer {}", token)),
        None => request,
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::InvalidToken,
        StatusCode::CONFLICT => ApiError::AlreadyExists(detail),
        StatusCode::NOT_FOUND => ApiError::NotFound(detail),
        other => ApiError::Remote(format!("{}: {}", other, detail)),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    check(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::Remote(e.to_string()))
}

fn url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// HTTP client for the identity manager's provisioning surface
pub struct HttpIdentityManagerApi {
    client: reqwest::Client,
}

impl HttpIdentityManagerApi {
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
        })
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        context: &CallContext,
        target: String,
        body: &B,
    ) -> Result<Response, ApiError> {
        with_context(self.client.post(target), context)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Remote(e.to_string()))
    }

    async fn get(&self, context: &CallContext, target: String) -> Result<Response, ApiError> {
        with_context(self.client.get(target), context)
            .send()
            .await
            .map_err(|e| ApiError::Remote(e.to_string()))
    }
}

#[derive(Serialize)]
struct InitializeRequest<'a> {
    password_hash: &'a str,
}

#[async_trait]
impl IdentityManagerApi for HttpIdentityManagerApi {
    async fn initialize(
        &self,
        context: &CallContext,
        identity_uri: &str,
        password_hash: &str,
    ) -> Result<SignatureSet, ApiError> {
        let response = self
            .post_json(
                context,
                url(identity_uri, "/initialize"),
                &InitializeRequest { password_hash },
            )
            .await?;

        // Initialization reports an earlier run as a conflict.
        match check(response).await {
            Ok(ok) => ok
                .json::<SignatureSet>()
                .await
                .map_err(|e| ApiError::Remote(e.to_string())),
            Err(ApiError::AlreadyExists(_)) => Err(ApiError::AlreadyInitialized),
            Err(other) => Err(other),
        }
    }

    async fn get_latest_signature_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
    ) -> Result<SignatureSet, ApiError> {
        let response = self
            .get(context, url(identity_uri, "/signatures/_latest"))
            .await?;
        read_json(response).await
    }

    async fn create_permittable_group(
        &self,
        context: &CallContext,
        identity_uri: &str,
        group: &PermittableGroup,
    ) -> Result<(), ApiError> {
        let response = self
            .post_json(context, url(identity_uri, "/permittablegroups"), group)
            .await?;
        check(response).await.map(|_| ())
    }

    async fn get_permittable_group(
        &self,
        context: &CallContext,
        identity_uri: &str,
        group_identifier: &str,
    ) -> Result<PermittableGroup, ApiError> {
        let response = self
            .get(
                context,
                url(identity_uri, &format!("/permittablegroups/{}", group_identifier)),
            )
            .await?;
        read_json(response).await
    }

    async fn set_application_signature(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        key_timestamp: &str,
        signature: &Signature,
    ) -> Result<(), ApiError> {
        let target = url(
            identity_uri,
            &format!(
                "/applications/{}/signatures/{}",
                application_name, key_timestamp
            ),
        );
        let response = with_context(self.client.put(target), context)
            .json(signature)
            .send()
            .await
            .map_err(|e| ApiError::Remote(e.to_string()))?;
        check(response).await.map(|_| ())
    }

    async fn create_application_permission(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        permission: &Permission,
    ) -> Result<(), ApiError> {
        let response = self
            .post_json(
                context,
                url(
                    identity_uri,
                    &format!("/applications/{}/permissions", application_name),
                ),
                permission,
            )
            .await?;
        check(response).await.map(|_| ())
    }

    async fn get_application_permission(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        group_identifier: &str,
    ) -> Result<Permission, ApiError> {
        let response = self
            .get(
                context,
                url(
                    identity_uri,
                    &format!(
                        "/applications/{}/permissions/{}",
                        application_name, group_identifier
                    ),
                ),
            )
            .await?;
        read_json(response).await
    }

    async fn create_application_call_endpoint_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        endpoint_set: &CallEndpointSet,
    ) -> Result<(), ApiError> {
        let response = self
            .post_json(
                context,
                url(
                    identity_uri,
                    &format!("/applications/{}/callendpointset", application_name),
                ),
                endpoint_set,
            )
            .await?;
        check(response).await.map(|_| ())
    }

    async fn get_application_call_endpoint_set(
        &self,
        context: &CallContext,
        identity_uri: &str,
        application_name: &str,
        set_identifier: &str,
    ) -> Result<CallEndpointSet, ApiError> {
        let response = self
            .get(
                context,
                url(
                    identity_uri,
                    &format!(
                        "/applications/{}/callendpointset/{}",
                        application_name, set_identifier
                    ),
                ),
            )
            .await?;
        read_json(response).await
    }
}

/// HTTP client for an application's authorization surface
pub struct HttpAuthorizationApi {
    client: reqwest::Client,
}

impl HttpAuthorizationApi {
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
        })
    }
}

#[async_trait]
impl AuthorizationApi for HttpAuthorizationApi {
    async fn get_permittable_endpoints(
        &self,
        context: &CallContext,
        application_uri: &str,
    ) -> Result<Vec<PermittableEndpoint>, ApiError> {
        let response = with_context(
            self.client.get(url(application_uri, "/permittableendpoints")),
            context,
        )
        .send()
        .await
        .map_err(|e| ApiError::Remote(e.to_string()))?;
        read_json(response).await
    }

    async fn create_signature_set(
        &self,
        context: &CallContext,
        application_uri: &str,
        key_timestamp: &str,
        identity_signature: &Signature,
    ) -> Result<SignatureSet, ApiError> {
        let target = url(application_uri, &format!("/signatureset/{}", key_timestamp));
        let response = with_context(self.client.post(target), context)
            .json(identity_signature)
            .send()
            .await
            .map_err(|e| ApiError::Remote(e.to_string()))?;
        read_json(response).await
    }

    async fn initialize_resources(
        &self,
        context: &CallContext,
        application_uri: &str,
    ) -> Result<(), ApiError> {
        let response = with_context(
            self.client.post(url(application_uri, "/initializeresources")),
            context,
        )
        .send()
        .await
        .map_err(|e| ApiError::Remote(e.to_string()))?;
        check(response).await.map(|_| ())
    }
}

/// HTTP client for an application's permission-requirements surface
pub struct HttpPermissionRequirementsApi {
    client: reqwest::Client,
}

impl HttpPermissionRequirementsApi {
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
        })
    }
}

#[async_trait]
impl PermissionRequirementsApi for HttpPermissionRequirementsApi {
    async fn get_required_permissions(
        &self,
        context: &CallContext,
        application_uri: &str,
    ) -> Result<Vec<ApplicationPermission>, ApiError> {
        let response = with_context(
            self.client.get(url(application_uri, "/requiredpermissions")),
            context,
        )
        .send()
        .await
        .map_err(|e| ApiError::Remote(e.to_string()))?;
        read_json(response).await
    }
}
