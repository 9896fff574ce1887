//! Caller identity carried by bearer tokens
//!
//! Tokens are issued by the external auth service and signed with the shared
//! HS256 secret; this server only verifies them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Barber,
    Admin,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID (client ID for client accounts, barber ID for barber accounts)
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl UserClaims {
    /// Create a JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    // Authorization checks
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator rights required".to_string()))
        }
    }

    /// The caller is the given client, or an admin acting for them
    pub fn require_self_or_admin(&self, client_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || (self.role == Role::Client && self.sub == client_id) {
            Ok(())
        } else {
            Err(AppError::Authorization("Cannot act on behalf of another client".to_string()))
        }
    }

    /// The caller is the given barber, or an admin
    pub fn require_barber_or_admin(&self, barber_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || (self.role == Role::Barber && self.sub == barber_id) {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to read this barber's agenda".to_string()))
        }
    }
}
