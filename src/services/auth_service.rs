use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Claims, UserRole};

/// Verifies access tokens issued by the backend auth service (HS256, signed
/// with the project JWT secret).
pub struct AuthService {
    key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Audience is "authenticated" for every signed-in user; it carries no role.
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// User id and effective role for a bearer token.
    pub fn authenticate(&self, token: &str) -> AppResult<(Uuid, UserRole)> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        Ok((user_id, claims.app_role()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token(secret: &str, sub: &str, exp: i64, role: &str) -> String {
        let claims = json!({
            "sub": sub,
            "exp": exp,
            "aud": "authenticated",
            "app_metadata": {"role": role},
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let id = Uuid::new_v4();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let service = AuthService::new(SECRET);

        let (user_id, role) = service
            .authenticate(&token(SECRET, &id.to_string(), exp, "admin"))
            .unwrap();
        assert_eq!(user_id, id);
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_rejected_tokens() {
        let id = Uuid::new_v4().to_string();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let expired = (Utc::now() - Duration::hours(1)).timestamp();
        let service = AuthService::new(SECRET);

        assert!(service.authenticate(&token("other", &id, exp, "admin")).is_err());
        assert!(service.authenticate(&token(SECRET, &id, expired, "admin")).is_err());
        assert!(matches!(
            service.authenticate(&token(SECRET, "not-a-uuid", exp, "admin")),
            Err(AppError::Unauthorized)
        ));
        assert!(service.authenticate("garbage").is_err());
    }
}
