//! Integration test for session JWT validation.
//!
//! This test mints a JWT locally using the same HS256 secret that the server
//! would use, then validates it through the `validate_token` function.
//! No running server or database is needed.
//!
//! Run with: `cargo test --test auth_test`
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use sitework_backend::auth::jwt::{Claims, validate_token};

/// A fake secret for testing, never the real one.
const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

fn mint(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode test JWT")
}

fn claims_for(user_id: Uuid, role_id: Uuid, exp_offset: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: user_id.to_string(),
        role_id: role_id.to_string(),
        exp: (now + exp_offset) as usize,
        iat: Some(now as usize),
        iss: Some("https://auth.example.com".to_string()),
    }
}

#[test]
fn test_valid_token_decodes_correctly() {
    let user_id = Uuid::new_v4();
    let role_id = Uuid::new_v4();
    let token = mint(&claims_for(user_id, role_id, 3600), TEST_SECRET);

    let claims = validate_token(&token, TEST_SECRET).expect("Token should be valid");

    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(claims.role_id().unwrap(), role_id);
}

#[test]
fn test_expired_token_is_rejected() {
    // Expired 5 minutes ago, well past the 60s default leeway.
    let token = mint(&claims_for(Uuid::new_v4(), Uuid::new_v4(), -300), TEST_SECRET);

    let result = validate_token(&token, TEST_SECRET);
    assert!(result.is_err(), "Expired token should be rejected");
}

#[test]
fn test_wrong_secret_is_rejected() {
    let token = mint(
        &claims_for(Uuid::new_v4(), Uuid::new_v4(), 3600),
        "a-completely-different-secret-that-is-long-enough-xx",
    );

    let result = validate_token(&token, TEST_SECRET);
    assert!(result.is_err(), "Token signed with wrong secret should be rejected");
}

#[test]
fn test_malformed_token_is_rejected() {
    assert!(validate_token("not.a.jwt", TEST_SECRET).is_err());
    assert!(validate_token("", TEST_SECRET).is_err());
}

#[test]
fn test_invalid_role_id_claim() {
    let mut claims = claims_for(Uuid::new_v4(), Uuid::new_v4(), 3600);
    claims.role_id = "not-a-uuid".to_string();
    let token = mint(&claims, TEST_SECRET);

    let claims = validate_token(&token, TEST_SECRET).expect("Signature is still valid");
    assert!(claims.role_id().is_err());
}
