//! Rejection taxonomy for webhook signature verification.

use std::num::ParseIntError;

use thiserror::Error;

/// Which half of an ECDSA signature a structural error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    R,
    S,
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::R => f.write_str("r"),
            Scalar::S => f.write_str("s"),
        }
    }
}

/// Broad category of a rejected delivery.
///
/// Used for logging; the HTTP layer never forwards it to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    MissingCredential,
    MalformedTimestamp,
    StaleTimestamp,
    FutureTimestamp,
    MalformedEncoding,
    MalformedSignatureStructure,
    OutOfRangeScalar,
    CryptographicMismatch,
}

/// Structural problems found while decoding a raw or DER signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureFormatError {
    #[error("invalid signature length: expected 64 bytes for raw format, got {0}")]
    InvalidLength(usize),

    #[error("invalid signature: r and s must be positive")]
    RawNotPositive,

    #[error("signature too short: minimum 8 bytes required, got {0}")]
    DerTooShort(usize),

    #[error("invalid DER signature: expected SEQUENCE tag (0x30), got 0x{0:02x}")]
    ExpectedSequence(u8),

    #[error("DER long form length not supported (complex DER encoding)")]
    SequenceLongForm,

    #[error("invalid DER signature: sequence length {declared} exceeds buffer size {available}")]
    SequenceOverrun { declared: usize, available: usize },

    #[error("invalid DER signature: expected INTEGER tag for {scalar} at position {position}")]
    ExpectedInteger { scalar: Scalar, position: usize },

    #[error("invalid DER signature: unexpected end of data")]
    UnexpectedEnd,

    #[error("DER long form length not supported for {0}")]
    IntegerLongForm(Scalar),

    #[error("invalid DER signature: {0} length is zero")]
    ZeroLength(Scalar),

    #[error("invalid DER signature: {scalar} length {len} exceeds remaining buffer {remaining}")]
    IntegerOverrun {
        scalar: Scalar,
        len: usize,
        remaining: usize,
    },

    #[error("invalid DER signature: {0} must be positive")]
    NotPositive(Scalar),
}

impl SignatureFormatError {
    /// Non-positive scalars are range failures; everything else is shape.
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::RawNotPositive | Self::NotPositive(_) => RejectionKind::OutOfRangeScalar,
            _ => RejectionKind::MalformedSignatureStructure,
        }
    }
}

/// Why a delivery was rejected.
///
/// The `Display` text is safe to log in full but must not be returned to the
/// remote client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("empty signature")]
    EmptySignature,

    #[error("empty timestamp")]
    EmptyTimestamp,

    #[error("invalid timestamp format: {0}")]
    InvalidTimestamp(#[source] ParseIntError),

    #[error("timestamp too old: {age_secs}s (max {max_age_secs}s)")]
    TimestampTooOld { age_secs: i64, max_age_secs: i64 },

    #[error("timestamp is in the future")]
    TimestampInFuture { skew_secs: i64 },

    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),

    #[error("invalid signature format: {0}")]
    InvalidFormat(#[from] SignatureFormatError),

    #[error("invalid signature: r or s exceeds curve order")]
    ExceedsCurveOrder,

    #[error("invalid signature")]
    Mismatch,
}

impl VerifyError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::EmptySignature | Self::EmptyTimestamp => RejectionKind::MissingCredential,
            Self::InvalidTimestamp(_) => RejectionKind::MalformedTimestamp,
            Self::TimestampTooOld { .. } => RejectionKind::StaleTimestamp,
            Self::TimestampInFuture { .. } => RejectionKind::FutureTimestamp,
            Self::InvalidEncoding(_) => RejectionKind::MalformedEncoding,
            Self::InvalidFormat(e) => e.kind(),
            Self::ExceedsCurveOrder => RejectionKind::OutOfRangeScalar,
            Self::Mismatch => RejectionKind::CryptographicMismatch,
        }
    }
}

/// Reasons a configured public key could not be loaded.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to parse as PEM or base64 DER: {0}")]
    Encoding(#[source] base64::DecodeError),

    #[error("unexpected PEM label {0:?}, expected \"PUBLIC KEY\"")]
    PemLabel(String),

    #[error("failed to parse public key: {0}")]
    Spki(String),

    #[error("not an ECDSA public key (algorithm {0})")]
    NotEcdsa(String),

    #[error("EC public key is missing its curve parameters")]
    MissingCurve,

    #[error("unsupported curve {0}, expected P-256")]
    UnsupportedCurve(String),

    #[error("invalid P-256 public key: {0}")]
    InvalidPoint(String),
}
