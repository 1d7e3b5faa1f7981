use anyhow::{bail, Context, Result};
use choptym_payments::config::AppConfig;
use choptym_payments::sanitize::sanitize_object;
use choptym_payments::signature::{self, SignedPayload};
use std::io::Read;
use tracing_subscriber::EnvFilter;

/// Signs a webhook body the way the provider would and prints the header
/// line to send with it. Reads the file given as first argument, or stdin.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    if cfg.webhook_secret.is_empty() {
        bail!("WEBHOOK_SECRET must be set");
    }

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read(&path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let payload = match cfg.signed_payload {
        SignedPayload::Raw => raw,
        SignedPayload::Sanitized => {
            let value: serde_json::Value = serde_json::from_slice(&raw).context("payload is not JSON")?;
            let serde_json::Value::Object(map) = value else {
                bail!("payload must be a JSON object");
            };
            serde_json::to_vec(&sanitize_object(map))?
        }
    };

    let sig = signature::sign(&cfg.webhook_secret, &payload)?;
    let header = cfg
        .signature_headers
        .first()
        .map(String::as_str)
        .unwrap_or("x-fapshi-signature");
    tracing::debug!(mode = ?cfg.signed_payload, bytes = payload.len(), "signed payload");
    println!("{header}: {sig}");
    Ok(())
}
