//! Admin Password Hashing
//!
//! The hash handed to a tenant's identity manager at initialization.
//! Salted with a tenant+domain-derived value and iterated so the identity
//! manager can store it as-is.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fixed initial admin password; callers must change it immediately.
/// Returned to the caller exactly once, on first initialization.
pub const INITIAL_ADMIN_PASSWORD: &str = "ChangeThisPassword";

/// Iterations of the password hash
pub const ITERATION_COUNT: u32 = 4096;

/// Bit length of the derived hash
pub const HASH_LENGTH: usize = 256;

const SALT_PREFIX: &str = "antony";

/// Salt for one tenant's admin password: base64 over a fixed prefix, the
/// tenant identifier and the platform domain
pub fn admin_password_salt(tenant_identifier: &str, domain: &str) -> Vec<u8> {
    STANDARD
        .encode(format!("{}{}{}", SALT_PREFIX, tenant_identifier, domain))
        .into_bytes()
}

/// Derive the base64 admin password hash sent to the identity manager.
///
/// The password itself is base64-encoded before hashing and the derived
/// bytes are base64-encoded after, matching what the identity manager
/// verifies against.
pub fn hash_admin_password(tenant_identifier: &str, domain: &str) -> String {
    let salt = admin_password_salt(tenant_identifier, domain);
    let encoded_password = STANDARD.encode(INITIAL_ADMIN_PASSWORD);

    let hash = pbkdf2_sha256(
        encoded_password.as_bytes(),
        &salt,
        ITERATION_COUNT,
        HASH_LENGTH / 8,
    );

    STANDARD.encode(hash)
}

/// PBKDF2 with HMAC-SHA256
pub fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32, derived_len: usize) -> Vec<u8> {
    let mut derived = Vec::with_capacity(derived_len);
    let mut block_index: u32 = 1;

    while derived.len() < derived_len {
        let mut mac = HmacSha256::new_from_slice(password).expect("HMAC accepts keys of any length");
        mac.update(salt);
        mac.update(&block_index.to_be_bytes());
        let mut round = mac.finalize().into_bytes();
        let mut block = round.clone();

        for _ in 1..iterations {
            let mut mac =
                HmacSha256::new_from_slice(password).expect("HMAC accepts keys of any length");
            mac.update(&round);
            round = mac.finalize().into_bytes();
            for (block_byte, round_byte) in block.iter_mut().zip(round.iter()) {
                *block_byte ^= round_byte;
            }
        }

        derived.extend_from_slice(&block);
        block_index += 1;
    }

    derived.truncate(derived_len);
    derived
}
