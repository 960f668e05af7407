use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: i64,
    pub iat: i64,
}

/// Verifies bearer tokens minted by the identity provider. This service only
/// consumes identities; sign-up and login flows live elsewhere.
pub struct JwtService;

impl JwtService {
    pub fn generate_access_token(user_id: &ObjectId) -> Result<String, jsonwebtoken::errors::Error> {
        Self::generate_with_expiry(user_id, crate::config::Config::jwt_expiry())
    }

    fn generate_with_expiry(
        user_id: &ObjectId,
        expiry: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            exp: now + expiry,
            iat: now,
        };

        let secret = crate::config::Config::jwt_secret();
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = crate::config::Config::jwt_secret();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_verify_round_trip() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_access_token(&user_id).unwrap();
        let claims = JwtService::verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_hex());
    }

    #[test]
    fn expired_token_is_rejected() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_with_expiry(&user_id, -3600).unwrap();
        assert!(JwtService::verify_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(JwtService::verify_token("not.a.token").is_err());
    }
}
