//! SendGrid event webhook signature verification.
//!
//! SendGrid signs `timestamp || body` with ECDSA P-256 over SHA-256 and sends
//! the base64 signature and the decimal timestamp in request headers.
//! Reference: https://www.twilio.com/docs/sendgrid/for-developers/tracking-events/getting-started-event-webhook-security-features

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use p256::ecdsa::{signature::hazmat::PrehashVerifier, Signature, VerifyingKey};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::decode::{decode_signature, ParsedSignature};
use super::error::VerifyError;
use super::timestamp::{check_timestamp, now_unix};

/// Verifies deliveries against one configured P-256 public key.
///
/// The key is fixed at construction, so a verifier can be shared freely
/// between request handlers.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &VerifyingKey {
        &self.key
    }

    /// Verify a delivery against the current wall clock.
    pub fn verify(&self, payload: &[u8], signature: &str, timestamp: &str) -> Result<(), VerifyError> {
        self.verify_at(payload, signature, timestamp, now_unix())
    }

    /// Verify a delivery as if the current UNIX time were `now`.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: &str,
        timestamp: &str,
        now: i64,
    ) -> Result<(), VerifyError> {
        match self.check(payload, signature, timestamp, now) {
            Ok(()) => {
                debug!(timestamp = %timestamp, "sendgrid_signature_verified");
                Ok(())
            }
            Err(e) => {
                warn!(
                    kind = ?e.kind(),
                    reason = %e,
                    payload_length = payload.len(),
                    "sendgrid_signature_rejected"
                );
                Err(e)
            }
        }
    }

    fn check(
        &self,
        payload: &[u8],
        signature: &str,
        timestamp: &str,
        now: i64,
    ) -> Result<(), VerifyError> {
        if signature.is_empty() {
            return Err(VerifyError::EmptySignature);
        }
        if timestamp.is_empty() {
            return Err(VerifyError::EmptyTimestamp);
        }

        check_timestamp(timestamp, now)?;

        let sig_bytes = BASE64
            .decode(signature)
            .map_err(VerifyError::InvalidEncoding)?;

        let digest = signed_payload_digest(timestamp, payload);

        let scalars = decode_signature(&sig_bytes)?;
        let parsed = ParsedSignature::from_scalars(scalars)?;

        let signature =
            Signature::from_slice(&parsed.to_bytes()).map_err(|_| VerifyError::ExceedsCurveOrder)?;

        self.key
            .verify_prehash(&digest, &signature)
            .map_err(|_| VerifyError::Mismatch)
    }
}

/// SHA-256 of the timestamp header exactly as received, followed by the body.
pub fn signed_payload_digest(timestamp: &str, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(payload);
    hasher.finalize().into()
}
