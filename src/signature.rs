use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Which bytes the provider signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignedPayload {
    /// The exact request body as received.
    Raw,
    /// The sanitized body re-serialized with field order preserved.
    Sanitized,
}

impl SignedPayload {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Some(SignedPayload::Raw),
            "sanitized" => Some(SignedPayload::Sanitized),
            _ => None,
        }
    }
}

/// Returns the first non-empty signature found under any of `header_names`.
pub fn extract<'a>(headers: &'a HeaderMap, header_names: &[String]) -> Option<&'a str> {
    header_names.iter().find_map(|name| {
        headers
            .get(name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

pub fn sign(secret: &str, payload: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid webhook secret: {e}"))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature, optionally prefixed with `sha256=`.
pub fn verify(secret: &str, payload: &[u8], provided: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    let Ok(expected) = hex::decode(provided) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Local/test-only escape hatch: a known token in place of a real signature.
///
/// Only exists in builds with the `dev-bypass` feature, and even then only
/// when the runtime flag is on and the environment is local or test.
#[derive(Debug, Clone, Default)]
pub struct DevBypass {
    pub enabled: bool,
    pub token: String,
    pub app_env: String,
}

impl DevBypass {
    #[cfg(feature = "dev-bypass")]
    pub fn accepts(&self, provided: &str) -> bool {
        self.enabled
            && matches!(self.app_env.as_str(), "local" | "test")
            && !self.token.is_empty()
            && provided == self.token
    }

    #[cfg(not(feature = "dev-bypass"))]
    pub fn accepts(&self, _provided: &str) -> bool {
        false
    }
}
