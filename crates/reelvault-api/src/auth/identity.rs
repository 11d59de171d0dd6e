use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use reelvault_core::{AppError, Config};
use serde::{Deserialize, Serialize};

/// Authenticated caller, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Turns presented credentials into an [`Identity`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Identity, AppError>;
}

/// HS256 JWT verification with optional issuer and audience pinning.
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret(),
            config.jwt_issuer(),
            config.jwt_audience(),
        )
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            let message = match e.kind() {
                ErrorKind::ExpiredSignature => "Token has expired".to_string(),
                ErrorKind::InvalidIssuer => "Invalid token issuer".to_string(),
                ErrorKind::InvalidAudience => "Invalid token audience".to_string(),
                ErrorKind::ImmatureSignature => "Token is not yet valid (nbf)".to_string(),
                _ => format!("Invalid or expired token: {}", e),
            };
            AppError::Unauthorized(message)
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }

        Ok(Identity {
            subject_id: data.claims.sub,
            email: data.claims.email,
        })
    }
}
