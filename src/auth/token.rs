//! BucketKV - Token Issuance
//! Produces HS256 bearer tokens accepted by the [`AccessGate`](super::AccessGate).

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use super::{Algorithm, Claims, Header, SigningKeys};
use crate::config::Secret;
use crate::error::{BucketKvError, Result};

/// Signs tokens with the shared secret.
pub struct TokenIssuer {
    keys: SigningKeys,
}

impl TokenIssuer {
    pub fn new(secret: &Secret) -> Result<Self> {
        Ok(Self {
            keys: SigningKeys::new(secret)?,
        })
    }

    /// Issue a token carrying `iat = issued_at` and `exp = issued_at + valid_for`.
    pub fn issue(&self, issued_at: i64, valid_for: Duration) -> Result<String> {
        let valid_for = i64::try_from(valid_for.as_secs())
            .map_err(|_| BucketKvError::Validation("token lifetime is too long".to_string()))?;
        let claims = Claims {
            exp: Some(issued_at.saturating_add(valid_for)),
            iat: Some(issued_at),
            ..Claims::default()
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims with HS256.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: Algorithm::Hs256.as_str().to_string(),
            typ: Some("JWT".to_string()),
        };
        let header = serde_json::to_vec(&header)
            .map_err(|e| BucketKvError::Serialization(e.to_string()))?;
        let payload = serde_json::to_vec(claims)
            .map_err(|e| BucketKvError::Serialization(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.keys.sign(Algorithm::Hs256, signing_input.as_bytes());
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }
}
