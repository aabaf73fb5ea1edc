// ============================
// tests/unit/token_tests.rs
// ============================
//! Access-token issuing and verification
use chrono::Utc;
use gatekeeper_lib::auth::{
    identity_claims, AccessClaims, JwtIssuer, SigningAlgorithm, TokenError, TokenIssuer,
    ACCESS_TOKEN_TTL,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use crate::test_utils::TEST_SECRET;

fn issuer() -> JwtIssuer {
    JwtIssuer::new(SigningAlgorithm::HS256, TEST_SECRET.as_bytes())
}

#[test]
fn test_claims_survive_unchanged() {
    let issuer = issuer();
    let token = issuer.generate(identity_claims("u-1", "a@b.io")).unwrap();

    let claims = issuer.validate(&token).unwrap();
    let typed = AccessClaims::from_map(&claims).unwrap();
    assert_eq!(typed.sub, "u-1");
    assert_eq!(typed.email, "a@b.io");
    assert_eq!(typed.exp - typed.iat, ACCESS_TOKEN_TTL.as_secs() as i64);
    assert_eq!(issuer.lifetime(), ACCESS_TOKEN_TTL);
}

#[test]
fn test_expired_token_is_expiry_error() {
    let now = Utc::now().timestamp();
    let claims = json!({
        "sub": "u-1",
        "email": "a@b.io",
        "iat": now - 3600,
        "exp": now - 60,
        "jti": "nonce",
    });
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(matches!(issuer().validate(&token), Err(TokenError::Expired)));
}

#[test]
fn test_tampered_payload_is_signature_error() {
    let token = issuer().generate(identity_claims("u-1", "a@b.io")).unwrap();
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();

    // flip one character of the payload segment
    let payload = &mut parts[1];
    let first = if payload.starts_with('e') { "f" } else { "e" };
    payload.replace_range(0..1, first);
    let tampered = parts.join(".");

    assert!(matches!(
        issuer().validate(&tampered),
        Err(TokenError::InvalidSignature)
    ));
}

#[test]
fn test_resigned_token_is_signature_error() {
    let forged = JwtIssuer::new(SigningAlgorithm::HS256, b"attacker-controlled-secret-32-bytes!!")
        .generate(identity_claims("admin", "root@b.io"))
        .unwrap();

    assert!(matches!(
        issuer().validate(&forged),
        Err(TokenError::InvalidSignature)
    ));
}

#[test]
fn test_only_configured_algorithm_is_accepted() {
    let hs384 = JwtIssuer::new(SigningAlgorithm::HS384, TEST_SECRET.as_bytes());
    let token = hs384.generate(identity_claims("u-1", "a@b.io")).unwrap();

    assert!(hs384.validate(&token).is_ok());
    assert!(matches!(
        issuer().validate(&token),
        Err(TokenError::InvalidSignature)
    ));
}

#[test]
fn test_token_without_exp_is_rejected() {
    let token = encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "u-1", "email": "a@b.io" }),
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(matches!(
        issuer().validate(&token),
        Err(TokenError::Malformed(_))
    ));
}
