//! HS256 bearer tokens.
//!
//! Validation runs in a fixed order: header algorithm and signature, then
//! expiry, then the shape of the remaining claims. Callers only ever see
//! [`AuthError`], and the HTTP layer collapses every variant into the same
//! 401 body.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde_json::Value;
use sha2::Sha256;

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    Malformed,
    AlgorithmMismatch,
    BadSignature,
    Expired,
    InvalidClaims,
    Signing(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::Malformed => write!(f, "token is not a well-formed JWT"),
            AuthError::AlgorithmMismatch => write!(f, "token uses an unexpected algorithm"),
            AuthError::BadSignature => write!(f, "token signature does not match"),
            AuthError::Expired => write!(f, "token has expired"),
            AuthError::InvalidClaims => write!(f, "token claims are incomplete"),
            AuthError::Signing(e) => write!(f, "could not sign token: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<jwt::Error> for AuthError {
    fn from(err: jwt::Error) -> AuthError {
        match err {
            jwt::Error::AlgorithmMismatch(_, _) => AuthError::AlgorithmMismatch,
            jwt::Error::InvalidSignature | jwt::Error::RustCryptoMac(_) => AuthError::BadSignature,
            jwt::Error::Json(_) => AuthError::InvalidClaims,
            _ => AuthError::Malformed,
        }
    }
}

/// Issues and validates tokens with a process-wide secret. Changing the
/// secret invalidates every token issued before.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Hmac<Sha256>,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, AuthError> {
        let key = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(TokenIssuer { key, ttl })
    }

    pub fn issue(&self, user_id: i32, email: &str, username: Option<&str>) -> Result<String, AuthError> {
        let now = Utc::now();
        self.issue_at(user_id, email, username, now, now + self.ttl)
    }

    pub fn issue_at(
        &self,
        user_id: i32,
        email: &str,
        username: Option<&str>,
        issued: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            user_id,
            email: email.to_string(),
            username: username.map(String::from),
            iat: issued.timestamp(),
            exp: expires.timestamp(),
        };
        claims
            .sign_with_key(&self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let raw: BTreeMap<String, Value> = token.verify_with_key(&self.key)?;

        let exp = raw
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(AuthError::InvalidClaims)?;
        if exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        let claims: Claims = serde_json::from_value(Value::Object(raw.into_iter().collect()))
            .map_err(|_| AuthError::InvalidClaims)?;
        if claims.email.is_empty() {
            return Err(AuthError::InvalidClaims);
        }
        Ok(claims)
    }
}
