//! System Token Minting and Call Contexts
//!
//! The provisioner calls into independently-deployed services as the
//! platform itself. This crate mints the short-lived RSA-signed assertions
//! backing those calls, builds the explicit per-call security context
//! threaded through every client, and derives the salted iterated password
//! hash handed to a tenant's identity manager at initialization.

pub mod config;
pub mod context;
pub mod hash;
pub mod token;

pub use config::{ConfigError, SystemConfig};
pub use context::{
    CallContext, CallContextProvider, Caller, ContextMinter, AUTHORIZATION_HEADER, TENANT_HEADER,
};
pub use token::{SystemToken, SystemTokenClaims, TokenError, TokenMinter, SYSTEM_ADMIN_ROLE};
