//! Authentication of SendGrid event webhook deliveries.
//!
//! ```text
//! headers + body → SignatureVerifier::verify
//!                    ├─ check_timestamp   (replay window)
//!                    ├─ decode_signature  (raw r||s or DER)
//!                    ├─ ParsedSignature   (0 < r, s < n)
//!                    └─ ECDSA P-256 verify over SHA-256(timestamp || body)
//! ```
//!
//! A receiver without a configured key has no verifier at all; see
//! [`load_verifier`].

pub mod decode;
pub mod error;
pub mod key;
pub mod timestamp;
pub mod verifier;

pub use decode::{decode_signature, ParsedSignature, ScalarPair, CURVE_ORDER};
pub use error::{KeyError, RejectionKind, Scalar, SignatureFormatError, VerifyError};
pub use key::{load_verifier, parse_public_key};
pub use timestamp::{check_timestamp, now_unix, MAX_TIMESTAMP_AGE_SECS};
pub use verifier::{signed_payload_digest, SignatureVerifier};
