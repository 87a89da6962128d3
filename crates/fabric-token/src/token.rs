//! System Token Minting

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SystemConfig;

/// Role claim carried by every system token
pub const SYSTEM_ADMIN_ROLE: &str = "system_admin";

/// Issuer claim carried by every system token
pub const SYSTEM_ISSUER: &str = "system";

/// Claims of an RSA-signed system assertion scoping one outbound call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemTokenClaims {
    /// Always [`SYSTEM_ISSUER`]
    pub iss: String,
    /// The tenant the call acts on
    pub sub: String,
    /// The application the call is addressed to
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub role: String,
    /// Epoch of the signing key, so receivers can pick the right public key
    #[serde(rename = "keyTimestamp")]
    pub key_timestamp: String,
}

/// A minted token together with its expiry
#[derive(Clone, Debug)]
pub struct SystemToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("could not read RSA signing key: {0}")]
    InvalidKey(String),
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Mints time-limited system tokens under the provisioner's own private key
pub struct TokenMinter {
    key_timestamp: String,
    encoding_key: EncodingKey,
    header: Header,
}

impl TokenMinter {
    pub fn from_config(config: &SystemConfig) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        Ok(Self {
            key_timestamp: config.key_timestamp.clone(),
            encoding_key,
            header: Header::new(Algorithm::RS512),
        })
    }

    /// Build a signed assertion scoped to (tenant, audience application,
    /// system-admin role), valid for `ttl`.
    pub fn mint_system_token(
        &self,
        tenant_identifier: &str,
        audience_application: &str,
        ttl: Duration,
    ) -> Result<SystemToken, TokenError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + ttl;

        let claims = SystemTokenClaims {
            iss: SYSTEM_ISSUER.to_string(),
            sub: tenant_identifier.to_string(),
            aud: audience_application.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            role: SYSTEM_ADMIN_ROLE.to_string(),
            key_timestamp: self.key_timestamp.clone(),
        };

        let token = encode(&self.header, &claims, &self.encoding_key)?;

        Ok(SystemToken { token, expires_at })
    }

    pub fn key_timestamp(&self) -> &str {
        &self.key_timestamp
    }
}
