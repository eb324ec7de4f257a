// src/auth.rs
pub use crate::auth_models::TokenClaims;
use crate::errors::AppError;
use jsonwebtoken::{DecodingKey, TokenData, Validation, decode};

// Funkcja do weryfikacji JWT
pub fn verify_jwt(token: &str, secret: &str) -> Result<TokenData<TokenClaims>, AppError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(), // Domyślna walidacja sprawdza m.in. 'exp'
    )
    .map_err(AppError::from)
}
