//! Ed25519 request verification for inbound webhook requests.
//!
//! The platform signs `timestamp || raw_body` with the application's key pair
//! and sends the hex signature in `x-signature-ed25519`. Verification runs
//! before the body is parsed and before any side effect.

use anyhow::{Context, Result};
use ed25519_dalek::{Signature, VerifyingKey};

/// Verifies inbound request signatures against the application public key.
/// Built once at startup from the hex-encoded key.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Parse the hex-encoded Ed25519 public key. Fails at startup on a
    /// malformed key; never during request handling.
    pub fn from_hex(public_key_hex: &str) -> Result<Self> {
        let bytes = hex::decode(public_key_hex.trim())
            .context("application public key is not valid hex")?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .ok()
            .context("application public key must be 32 bytes")?;
        let key =
            VerifyingKey::from_bytes(&bytes).context("application public key is not a valid Ed25519 key")?;
        Ok(Self { key })
    }

    /// True iff `signature_hex` is a valid signature over `timestamp || body`
    /// under the configured key. Every failure mode (malformed hex, wrong
    /// length, verification failure) logs the reason and returns false.
    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &str) -> bool {
        let sig_bytes = match hex::decode(signature_hex.trim()) {
            Ok(b) => b,
            Err(e) => {
                log::debug!("request signature is not valid hex: {}", e);
                return false;
            }
        };
        let sig_bytes: [u8; 64] = match sig_bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => {
                log::debug!(
                    "request signature has wrong length: {} bytes",
                    sig_bytes.len()
                );
                return false;
            }
        };
        let signature = Signature::from_bytes(&sig_bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body.as_bytes());

        match self.key.verify_strict(&message, &signature) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("request signature verification failed: {}", e);
                false
            }
        }
    }
}
