//! RS256 request signing
//!
//! The JSON request body becomes the JWT claims; the compact token is sent
//! as the request body (JPMorgan) instead of the plain JSON.

use crate::{Error, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;

/// RS256 signer built from a PEM private key
#[derive(Clone)]
pub struct JwtSigner {
    key: EncodingKey,
}

impl JwtSigner {
    /// Parse a PKCS#1 or PKCS#8 RSA private key
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| Error::Signing(format!("invalid RSA key: {}", e)))?;
        Ok(Self { key })
    }

    /// Sign a JSON object as the token claims
    pub fn sign(&self, claims: &Value) -> Result<String> {
        if !claims.is_object() {
            return Err(Error::Signing("claims must be a JSON object".to_string()));
        }

        Ok(encode(&Header::new(Algorithm::RS256), claims, &self.key)?)
    }
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSigner(RS256)")
    }
}
