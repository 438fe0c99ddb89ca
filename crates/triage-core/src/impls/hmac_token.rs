//! TokenSigner - HMAC-SHA256 で署名したケーストークン
//!
//! 形式は `header.payload.signature`（各部 base64url, パディングなし）。
//! 署名検証は ring の定数時間比較に任せる。

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::hmac;
use serde::de::DeserializeOwned;

use crate::domain::ids::PageRow;
use crate::domain::token::{TokenClaims, TokenError, TokenHeader};

pub struct TokenSigner {
    key: hmac::Key,
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    pub fn issue(&self, claims: TokenClaims) -> String {
        let header = encode_json(&TokenHeader::default());
        let payload = encode_json(&claims);
        let signing_input = format!("{header}.{payload}");
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }

    /// Check structure, algorithm and signature. Expiry is not checked.
    pub fn decode_verified(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed("expected three segments".into()));
        };

        let header: TokenHeader = decode_json(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let tag = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| TokenError::Malformed(format!("signature: {e}")))?;
        let signing_input_len = token.len() - signature.len() - 1;
        hmac::verify(&self.key, &token.as_bytes()[..signing_input_len], &tag)
            .map_err(|_| TokenError::BadSignature)?;

        decode_json(payload)
    }

    /// Signature plus the row binding. Expiry is left to the caller.
    pub fn decode_for_row(&self, token: &str, row: PageRow) -> Result<TokenClaims, TokenError> {
        let claims = self.decode_verified(token)?;
        if claims.row != row.get() {
            return Err(TokenError::RowMismatch {
                token_row: claims.row,
                requested: row.get(),
            });
        }
        Ok(claims)
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> String {
    // Serializing these plain structs cannot fail.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_json<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(format!("json: {e}")))
}
