// src/auth_models.rs
use serde::{Deserialize, Serialize};

/// Zawartość tokenu JWT. `sub` to numeryczny identyfikator użytkownika.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenClaims {
    pub sub: i64,
    pub exp: i64,
    pub iat: i64,
}
