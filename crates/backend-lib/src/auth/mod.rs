// ============================
// gatekeeper-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod rate_limit;
pub mod redis_session;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use password::{
    validate_password_strength, Argon2Hasher, HashAlgorithm, PasswordError, PasswordHasher,
    PasswordRequirements, ScryptHasher, verify_phc, MIN_PASSWORD_LENGTH,
};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use redis_session::RedisSessionStore;
pub use service::AuthService;
pub use service_impl::{DefaultAuth, DEFAULT_BACKEND_TIMEOUT};
pub use session::{MemorySessionStore, Session, SessionStore, SessionStoreError, SESSION_TTL};
pub use token::{
    generate_refresh_token, identity_claims, AccessClaims, ClaimsMap, JwtIssuer,
    SigningAlgorithm, TokenError, TokenIssuer, ACCESS_TOKEN_TTL, REFRESH_TOKEN_LENGTH,
};
