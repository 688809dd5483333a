//! BucketKV - Access Gate
//! Bearer-token verification, independent of the HTTP framework.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, base64url without
//! padding) signed with an HMAC over the shared secret. The gate is a plain value:
//! feed it the `Authorization` header and the current time, get a verdict.

pub mod duration;
pub mod token;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;

use crate::config::Secret;
use crate::error::{BucketKvError, Result};

pub use self::token::TokenIssuer;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
pub const LEEWAY_SECS: i64 = 5;

/// Why a credential was refused. Every reason maps to the same unauthorized outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingCredential,

    #[error("Invalid Authorization header format, expected 'Bearer <token>'")]
    MalformedCredential,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Token carries no expiration time")]
    MissingExpiry,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Outcome of consulting the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admitted,
    Denied(AuthError),
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// HMAC signing algorithms accepted in the token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl Algorithm {
    /// Parse the `alg` header value. Anything but HMAC (including `none`) is refused.
    pub fn from_header(alg: &str) -> std::result::Result<Self, AuthError> {
        match alg {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }
}

/// JOSE header of a token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Registered claims the gate understands. Other claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued-at time, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Not-before time, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// HMAC states keyed once with the shared secret; cloned per signature.
#[derive(Clone)]
pub(crate) struct SigningKeys {
    hs256: Hmac<Sha256>,
    hs384: Hmac<Sha384>,
    hs512: Hmac<Sha512>,
}

impl SigningKeys {
    pub(crate) fn new(secret: &Secret) -> Result<Self> {
        let invalid = |_| BucketKvError::Config("signing secret rejected by HMAC".to_string());
        Ok(Self {
            hs256: Hmac::<Sha256>::new_from_slice(secret.expose()).map_err(invalid)?,
            hs384: Hmac::<Sha384>::new_from_slice(secret.expose()).map_err(invalid)?,
            hs512: Hmac::<Sha512>::new_from_slice(secret.expose()).map_err(invalid)?,
        })
    }

    pub(crate) fn sign(&self, alg: Algorithm, message: &[u8]) -> Vec<u8> {
        match alg {
            Algorithm::Hs256 => {
                let mut mac = self.hs256.clone();
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::Hs384 => {
                let mut mac = self.hs384.clone();
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::Hs512 => {
                let mut mac = self.hs512.clone();
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    /// Constant-time signature check.
    pub(crate) fn verify(&self, alg: Algorithm, message: &[u8], signature: &[u8]) -> bool {
        match alg {
            Algorithm::Hs256 => {
                let mut mac = self.hs256.clone();
                mac.update(message);
                mac.verify_slice(signature).is_ok()
            }
            Algorithm::Hs384 => {
                let mut mac = self.hs384.clone();
                mac.update(message);
                mac.verify_slice(signature).is_ok()
            }
            Algorithm::Hs512 => {
                let mut mac = self.hs512.clone();
                mac.update(message);
                mac.verify_slice(signature).is_ok()
            }
        }
    }
}

/// Validates bearer credentials against the shared secret.
#[derive(Clone)]
pub struct AccessGate {
    keys: SigningKeys,
    leeway_secs: i64,
}

impl AccessGate {
    pub fn new(secret: &Secret) -> Result<Self> {
        Ok(Self {
            keys: SigningKeys::new(secret)?,
            leeway_secs: LEEWAY_SECS,
        })
    }

    /// Override the clock-skew tolerance.
    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Decide on a request given its `Authorization` header (if any) and the
    /// current Unix time in seconds.
    pub fn decide(&self, authorization: Option<&str>, now: i64) -> Verdict {
        match self.check(authorization, now) {
            Ok(_) => Verdict::Admitted,
            Err(reason) => Verdict::Denied(reason),
        }
    }

    /// Like [`decide`](Self::decide) but returns the verified claims.
    pub fn check(
        &self,
        authorization: Option<&str>,
        now: i64,
    ) -> std::result::Result<Claims, AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredential)?;
        if header.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let parts: Vec<&str> = header.split(' ').collect();
        let token = match parts.as_slice() {
            ["Bearer", token] if !token.is_empty() => *token,
            _ => return Err(AuthError::MalformedCredential),
        };

        let claims = self.verify_token(token)?;
        self.check_times(&claims, now)?;
        Ok(claims)
    }

    fn verify_token(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
            return Err(AuthError::MalformedCredential);
        };

        let header: Header = decode_segment(header_b64)?;
        let alg = Algorithm::from_header(&header.alg)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::MalformedCredential)?;
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        if !self.keys.verify(alg, signing_input.as_bytes(), &signature) {
            return Err(AuthError::InvalidSignature);
        }

        decode_segment(payload_b64)
    }

    fn check_times(&self, claims: &Claims, now: i64) -> std::result::Result<(), AuthError> {
        let exp = claims.exp.ok_or(AuthError::MissingExpiry)?;
        if now >= exp.saturating_add(self.leeway_secs) {
            return Err(AuthError::Expired);
        }
        if let Some(nbf) = claims.nbf {
            if now.saturating_add(self.leeway_secs) < nbf {
                return Err(AuthError::NotYetValid);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
) -> std::result::Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedCredential)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedCredential)
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
