//! Signature Vocabulary
//!
//! RSA public keys and the key-epoch signature sets exchanged between the
//! provisioner, the identity manager and tenant applications. Tokens signed
//! with the matching private keys are verified against these.

use serde::{Deserialize, Serialize};

/// An RSA public key, transported as base64url modulus and exponent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    pub public_key_mod: String,
    pub public_key_exp: String,
}

/// One key epoch for a subject: the subject's key plus the identity
/// manager's key, tagged with the epoch timestamp.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureSet {
    /// Key epoch, lexically ordered ISO-8601 timestamp
    pub timestamp: String,
    pub application_signature: Signature,
    pub identity_manager_signature: Signature,
}

impl SignatureSet {
    pub fn new(
        timestamp: impl Into<String>,
        application_signature: Signature,
        identity_manager_signature: Signature,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            application_signature,
            identity_manager_signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_set_round_trips_through_json() {
        let set = SignatureSet::new(
            "2026-01-01T00:00:00",
            Signature {
                public_key_mod: "AQAB".into(),
                public_key_exp: "Aw".into(),
            },
            Signature {
                public_key_mod: "AQCD".into(),
                public_key_exp: "AQAB".into(),
            },
        );

        let json = serde_json::to_string(&set).unwrap();
        let back: SignatureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }
}
