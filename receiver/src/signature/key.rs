//! Loading the SendGrid verification key.
//!
//! SendGrid hands out the key as bare base64 DER `SubjectPublicKeyInfo`, but
//! a PEM `PUBLIC KEY` block is accepted too. Only EC keys on P-256 are usable.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use p256::ecdsa::VerifyingKey;
use p256::pkcs8::{AssociatedOid, DecodePublicKey, ObjectIdentifier, SubjectPublicKeyInfoRef};
use p256::NistP256;
use tracing::{info, warn};

use super::error::KeyError;
use super::verifier::SignatureVerifier;

const PEM_PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// id-ecPublicKey (RFC 5480).
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Parse a P-256 public key from PEM or bare base64 DER.
pub fn parse_public_key(input: &str) -> Result<VerifyingKey, KeyError> {
    let der = match pem::parse(input) {
        Ok(block) => {
            if block.tag() != PEM_PUBLIC_KEY_TAG {
                return Err(KeyError::PemLabel(block.tag().to_string()));
            }
            block.into_contents()
        }
        Err(_) => {
            let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            BASE64.decode(compact).map_err(KeyError::Encoding)?
        }
    };

    let spki = SubjectPublicKeyInfoRef::try_from(der.as_slice())
        .map_err(|e| KeyError::Spki(e.to_string()))?;

    if spki.algorithm.oid != EC_PUBLIC_KEY_OID {
        return Err(KeyError::NotEcdsa(spki.algorithm.oid.to_string()));
    }

    let curve = spki
        .algorithm
        .parameters_oid()
        .map_err(|_| KeyError::MissingCurve)?;
    if curve != NistP256::OID {
        return Err(KeyError::UnsupportedCurve(curve.to_string()));
    }

    VerifyingKey::from_public_key_der(&der).map_err(|e| KeyError::InvalidPoint(e.to_string()))
}

/// Build a verifier from the configured key, or `None` to run unverified.
///
/// A missing key and an unusable key both disable verification; each case
/// is logged at warn level so the degraded mode is visible to operators.
pub fn load_verifier(configured: Option<&str>) -> Option<SignatureVerifier> {
    let key = match configured.map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => {
            warn!(
                verification = "disabled",
                "sendgrid_public_key_not_configured"
            );
            return None;
        }
    };

    match parse_public_key(key) {
        Ok(key) => {
            info!(verification = "enabled", "sendgrid_public_key_loaded");
            Some(SignatureVerifier::new(key))
        }
        Err(e) => {
            warn!(
                error = %e,
                verification = "disabled",
                "sendgrid_public_key_invalid"
            );
            None
        }
    }
}
