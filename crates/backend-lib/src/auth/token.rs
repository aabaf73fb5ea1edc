// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
/** Access-token signing and refresh-token generation.
Access tokens are HMAC-signed JWTs. The configured [`SigningAlgorithm`] is the
only algorithm used to sign and the only one accepted when verifying.
Refresh tokens are opaque random strings with no embedded meaning. */
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::JwtSettings;

/// Claims carried by a token, keyed by claim name
pub type ClaimsMap = serde_json::Map<String, Value>;

/// Access token lifetime (15 minutes, fixed policy)
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Length of a refresh token in alphanumeric characters
pub const REFRESH_TOKEN_LENGTH: usize = 32;

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies signed access tokens
pub trait TokenIssuer: Send + Sync {
    /// Sign `claims`, overwriting `iat` and `exp` and adding a `jti` if absent
    fn generate(&self, claims: ClaimsMap) -> Result<String, TokenError>;

    /// Verify signature and expiry, returning the embedded claims unchanged
    fn validate(&self, token: &str) -> Result<ClaimsMap, TokenError>;

    /// Lifetime applied by `generate`
    fn lifetime(&self) -> Duration {
        ACCESS_TOKEN_TTL
    }
}

/// HMAC algorithm used for access tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Typed view of the access-token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    /// Random nonce distinguishing tokens issued in the same second
    pub jti: String,
}

impl AccessClaims {
    pub fn from_map(claims: &ClaimsMap) -> Result<Self, TokenError> {
        serde_json::from_value(Value::Object(claims.clone()))
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

/// Identity claims for a user, before `iat`/`exp`/`jti` are stamped on
pub fn identity_claims(user_id: &str, email: &str) -> ClaimsMap {
    let mut claims = ClaimsMap::new();
    claims.insert("sub".to_string(), json!(user_id));
    claims.insert("email".to_string(), json!(email));
    claims
}

/// JWT implementation of [`TokenIssuer`]
pub struct JwtIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIssuer {
    pub fn new(algorithm: SigningAlgorithm, secret: &[u8]) -> Self {
        let algorithm = Algorithm::from(algorithm);

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_settings(settings: &JwtSettings) -> Self {
        Self::new(settings.algorithm, settings.secret.as_bytes())
    }
}

impl TokenIssuer for JwtIssuer {
    fn generate(&self, mut claims: ClaimsMap) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        claims.insert("iat".to_string(), json!(now));
        claims.insert(
            "exp".to_string(),
            json!(now + ACCESS_TOKEN_TTL.as_secs() as i64),
        );
        claims
            .entry("jti")
            .or_insert_with(|| json!(uuid::Uuid::new_v4().to_string()));

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<ClaimsMap, TokenError> {
        decode::<ClaimsMap>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                // a token signed under another algorithm is a re-signed token
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

/** Generate a refresh token
Draws [`REFRESH_TOKEN_LENGTH`] characters from `[A-Za-z0-9]` using the
thread-local CSPRNG. */
pub fn generate_refresh_token() -> String {
    generate_refresh_token_with_len(REFRESH_TOKEN_LENGTH)
}

pub fn generate_refresh_token_with_len(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
