use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::types::{AuthContext, AuthError, Claims, User};

/// Service for issuing and verifying JWT access and refresh tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a new `JwtService` using the `JWT_SECRET` environment variable.
    pub fn new() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Generates a short-lived access token carrying the user's email and role.
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let expiration = (Utc::now() + Duration::hours(1)).timestamp() as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            exp: expiration,
            iat: Utc::now().timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Generates a long-lived refresh token. Email and role are left empty.
    pub fn generate_refresh_token(&self, user_id: &Uuid) -> Result<String, AuthError> {
        let expiration = (Utc::now() + Duration::days(30)).timestamp() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            email: String::new(),
            role: String::new(),
            exp: expiration,
            iat: Utc::now().timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verifies a token's signature and expiry, returning its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// Verifies a token and extracts the user ID from its subject.
    pub fn extract_user_id_from_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.verify_token(token)?;
        parse_subject(&claims.sub)
    }

    /// Verifies a token and builds the request identity from its claims.
    pub fn extract_auth_context(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = self.verify_token(token)?;
        let user_id = parse_subject(&claims.sub)?;

        Ok(AuthContext {
            user_id,
            role: claims.role,
        })
    }
}

fn parse_subject(sub: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(sub).map_err(|_| {
        AuthError::Jwt(jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidSubject,
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "camper@example.com".to_string(),
            name: "Camper".to_string(),
            phone: Some("+15558675309".to_string()),
            password_hash: "hash".to_string(),
            role: "admin".to_string(),
            email_verified: true,
            phone_verified: false,
            notification_preferences: serde_json::json!({"email": true, "sms": false}),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let service = JwtService::new();
        let user = sample_user();

        let token = service.generate_access_token(&user).unwrap();
        let context = service.extract_auth_context(&token).unwrap();

        assert_eq!(context.user_id, user.id);
        assert_eq!(context.role, "admin");
    }

    #[test]
    fn refresh_token_carries_only_the_subject() {
        let service = JwtService::new();
        let user_id = Uuid::new_v4();

        let token = service.generate_refresh_token(&user_id).unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.email.is_empty());
        assert!(claims.role.is_empty());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let service = JwtService::new();
        assert!(service.verify_token("not-a-token").is_err());
    }
}
