//! Call Contexts
//!
//! The security scope of one outbound call, as an explicit value. Every
//! client takes a `CallContext` parameter; nothing is ambient, so nothing
//! can leak across a task boundary.

use chrono::Duration;

use crate::config::SystemConfig;
use crate::token::{TokenError, TokenMinter};

/// Header carrying the tenant identifier on every outbound call
pub const TENANT_HEADER: &str = "X-Tenant-Identifier";

/// Header carrying the bearer token on authenticated calls
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Who a call executes as
#[derive(Clone, Debug)]
pub enum Caller {
    /// The platform itself, carrying a freshly minted system token
    System { token: String },
    /// Unauthenticated, usable only for publicly exposed discovery calls
    Guest,
}

/// The tenant plus identity one outbound call executes under
#[derive(Clone, Debug)]
pub struct CallContext {
    tenant_identifier: String,
    caller: Caller,
}

impl CallContext {
    /// Context executing as the platform, carrying an already-minted token
    pub fn system(tenant_identifier: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            tenant_identifier: tenant_identifier.into(),
            caller: Caller::System {
                token: token.into(),
            },
        }
    }

    /// Unauthenticated context for public discovery calls
    pub fn guest(tenant_identifier: impl Into<String>) -> Self {
        Self {
            tenant_identifier: tenant_identifier.into(),
            caller: Caller::Guest,
        }
    }

    pub fn tenant_identifier(&self) -> &str {
        &self.tenant_identifier
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// The bearer token for this call, absent for guest contexts
    pub fn bearer_token(&self) -> Option<&str> {
        match &self.caller {
            Caller::System { token } => Some(token),
            Caller::Guest => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self.caller, Caller::Guest)
    }
}

/// Source of call contexts, the seam the provisioning clients depend on
pub trait ContextMinter: Send + Sync {
    /// Context for a call executed as the platform against one application
    fn system_context(
        &self,
        tenant_identifier: &str,
        audience_application: &str,
    ) -> Result<CallContext, TokenError>;

    /// Context for an unauthenticated discovery call
    fn guest_context(&self, tenant_identifier: &str) -> CallContext;
}

/// Builds call contexts; one minted token per context, never reused across
/// tenants or audiences
pub struct CallContextProvider {
    minter: TokenMinter,
    token_ttl: Duration,
}

impl CallContextProvider {
    pub fn new(config: &SystemConfig) -> Result<Self, TokenError> {
        Ok(Self {
            minter: TokenMinter::from_config(config)?,
            token_ttl: Duration::seconds(config.token_ttl_seconds as i64),
        })
    }
}

impl ContextMinter for CallContextProvider {
    fn system_context(
        &self,
        tenant_identifier: &str,
        audience_application: &str,
    ) -> Result<CallContext, TokenError> {
        let minted =
            self.minter
                .mint_system_token(tenant_identifier, audience_application, self.token_ttl)?;

        Ok(CallContext::system(tenant_identifier, minted.token))
    }

    fn guest_context(&self, tenant_identifier: &str) -> CallContext {
        CallContext::guest(tenant_identifier)
    }
}
