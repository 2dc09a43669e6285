use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: u8,
    employee_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    #[test]
    fn generated_token_verifies() {
        let token =
            generate_access_token(42, "ada@dayflow.test".to_string(), 2, Some(7), SECRET, 900)
                .expect("token generation should succeed");

        let claims = verify_token(&token, SECRET).expect("token validation should succeed");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "ada@dayflow.test");
        assert_eq!(claims.role, 2);
        assert_eq!(claims.employee_id, Some(7));
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn different_secret_fails() {
        let token = generate_access_token(1, "a@b.c".to_string(), 1, None, "secret-alpha", 900)
            .expect("token generation should succeed");
        assert!(verify_token(&token, "secret-bravo").is_err());
    }

    #[test]
    fn expired_token_fails() {
        // Well past the default 60-second leeway.
        let claims = Claims {
            user_id: 1,
            sub: "a@b.c".to_string(),
            role: 1,
            exp: now() - 300,
            jti: Uuid::new_v4().to_string(),
            employee_id: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(verify_token(&token, SECRET).is_err());
    }
}
