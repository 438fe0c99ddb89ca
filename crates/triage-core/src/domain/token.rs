//! Signed case token: claims and verification errors.
//!
//! The wire format is `header.payload.signature`, each part base64url
//! without padding. Signing lives in `impls::hmac_token`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token header. Only HS256 is issued or accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Case-scoped claims: which page row the bearer may edit, and until when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub row: u32,
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(row: u32, exp: i64) -> Self {
        Self { row, exp }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token required")]
    Missing,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token is for row {token_row}, not row {requested}")]
    RowMismatch { token_row: u32, requested: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_serialize_compactly() {
        let json = serde_json::to_string(&TokenClaims::new(3, 100)).unwrap();
        assert_eq!(json, r#"{"row":3,"exp":100}"#);
    }
}
