use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::models::Claims;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    #[error("Token signing secret is not configured")]
    MissingSecret,
    #[error("Malformed token")]
    Malformed,
    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

fn mac(secret: &str) -> Result<HmacSha256, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::MissingSecret)
}

/// Signs `claims` as an HS256 JWT.
///
/// The server only verifies tokens. This is the signing half for the identity service that
/// shares `JWT_SECRET`, and for minting tokens in tests.
pub fn issue_token(secret: &str, claims: &Claims) -> anyhow::Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");

    let mut mac = mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Verifies signature and expiry of an HS256 JWT. `now` is seconds since the Unix epoch.
pub fn verify_token(secret: &str, token: &str, now: i64) -> Result<Claims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let header_json = URL_SAFE_NO_PAD.decode(header).map_err(|_| AuthError::Malformed)?;
    let header: Header = serde_json::from_slice(&header_json).map_err(|_| AuthError::Malformed)?;
    if header.alg != "HS256" {
        return Err(AuthError::UnsupportedAlgorithm);
    }

    let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| AuthError::Malformed)?;
    let mut mac = mac(secret)?;
    mac.update(signing_input(token).as_bytes());
    mac.verify_slice(&signature).map_err(|_| AuthError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| AuthError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
    if claims.exp <= now {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// The `header.payload` prefix the signature covers.
fn signing_input(token: &str) -> &str {
    token.rsplit_once('.').map_or(token, |(input, _)| input)
}
