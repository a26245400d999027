//! Signature decoding.
//!
//! SendGrid may deliver the ECDSA signature either as fixed-width raw `r || s`
//! (32 bytes each) or as a DER `SEQUENCE { INTEGER r, INTEGER s }`. The
//! leading byte decides which: `0x30` is the DER SEQUENCE tag, anything else
//! is treated as raw.
//!
//! The DER reader only understands that one shape, with short-form lengths.
//! P-256 signatures are at most 72 bytes so long-form lengths never occur in
//! practice and are rejected.

use super::error::{Scalar, SignatureFormatError, VerifyError};

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;
const LONG_FORM_BIT: u8 = 0x80;

/// Width of a P-256 scalar in bytes.
pub const SCALAR_LEN: usize = 32;

/// Length of a raw `r || s` signature.
pub const RAW_SIGNATURE_LEN: usize = 2 * SCALAR_LEN;

/// Smallest DER signature the parser will look at.
const DER_MIN_LEN: usize = 8;

/// P-256 group order n, big-endian.
pub const CURVE_ORDER: [u8; SCALAR_LEN] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

/// Big-endian magnitudes of `r` and `s` as found in the encoded signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarPair<'a> {
    pub r: &'a [u8],
    pub s: &'a [u8],
}

/// `r` and `s` normalised to 32-byte big-endian and checked to lie in `[1, n-1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignature {
    pub r: [u8; SCALAR_LEN],
    pub s: [u8; SCALAR_LEN],
}

impl ParsedSignature {
    /// Range-check a decoded pair against the curve order.
    pub fn from_scalars(pair: ScalarPair<'_>) -> Result<Self, VerifyError> {
        let r = to_field_bytes(pair.r).ok_or(VerifyError::ExceedsCurveOrder)?;
        let s = to_field_bytes(pair.s).ok_or(VerifyError::ExceedsCurveOrder)?;

        // Big-endian arrays of equal width compare the same as the integers.
        if r >= CURVE_ORDER || s >= CURVE_ORDER {
            return Err(VerifyError::ExceedsCurveOrder);
        }

        Ok(Self { r, s })
    }

    /// Raw `r || s` form, as accepted by `p256::ecdsa::Signature::from_slice`.
    pub fn to_bytes(&self) -> [u8; RAW_SIGNATURE_LEN] {
        let mut out = [0u8; RAW_SIGNATURE_LEN];
        out[..SCALAR_LEN].copy_from_slice(&self.r);
        out[SCALAR_LEN..].copy_from_slice(&self.s);
        out
    }
}

/// Decode either signature encoding into its two scalars.
pub fn decode_signature(sig: &[u8]) -> Result<ScalarPair<'_>, SignatureFormatError> {
    match sig.first() {
        Some(&SEQUENCE_TAG) => decode_der(sig),
        _ => decode_raw(sig),
    }
}

fn decode_raw(sig: &[u8]) -> Result<ScalarPair<'_>, SignatureFormatError> {
    if sig.len() != RAW_SIGNATURE_LEN {
        return Err(SignatureFormatError::InvalidLength(sig.len()));
    }

    let (r, s) = sig.split_at(SCALAR_LEN);
    if is_zero(r) || is_zero(s) {
        return Err(SignatureFormatError::RawNotPositive);
    }

    Ok(ScalarPair { r, s })
}

fn decode_der(sig: &[u8]) -> Result<ScalarPair<'_>, SignatureFormatError> {
    if sig.len() < DER_MIN_LEN {
        return Err(SignatureFormatError::DerTooShort(sig.len()));
    }

    if sig[0] != SEQUENCE_TAG {
        return Err(SignatureFormatError::ExpectedSequence(sig[0]));
    }

    let seq_len = sig[1];
    if seq_len & LONG_FORM_BIT != 0 {
        return Err(SignatureFormatError::SequenceLongForm);
    }
    let seq_len = usize::from(seq_len);
    if 2 + seq_len > sig.len() {
        return Err(SignatureFormatError::SequenceOverrun {
            declared: seq_len,
            available: sig.len() - 2,
        });
    }

    let mut reader = DerReader { buf: sig, pos: 2 };
    let r = reader.integer(Scalar::R)?;
    let s = reader.integer(Scalar::S)?;

    if is_zero(r) {
        return Err(SignatureFormatError::NotPositive(Scalar::R));
    }
    if is_zero(s) {
        return Err(SignatureFormatError::NotPositive(Scalar::S));
    }

    Ok(ScalarPair { r, s })
}

/// Cursor over a DER buffer. Every read is bounds-checked first.
struct DerReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn byte(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    /// Read one short-form INTEGER and return its content octets.
    fn integer(&mut self, scalar: Scalar) -> Result<&'a [u8], SignatureFormatError> {
        let position = self.pos;
        if self.byte() != Some(INTEGER_TAG) {
            return Err(SignatureFormatError::ExpectedInteger { scalar, position });
        }

        let len = self.byte().ok_or(SignatureFormatError::UnexpectedEnd)?;
        if len & LONG_FORM_BIT != 0 {
            return Err(SignatureFormatError::IntegerLongForm(scalar));
        }
        if len == 0 {
            return Err(SignatureFormatError::ZeroLength(scalar));
        }

        let len = usize::from(len);
        let remaining = self.buf.len() - self.pos;
        if len > remaining {
            return Err(SignatureFormatError::IntegerOverrun {
                scalar,
                len,
                remaining,
            });
        }

        let buf = self.buf;
        let content = &buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(content)
    }
}

fn is_zero(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

/// Left-pad a big-endian magnitude to 32 bytes. `None` if it does not fit.
///
/// Content octets are read as an unsigned magnitude: a leading byte with the
/// high bit set is not treated as a negative DER INTEGER.
fn to_field_bytes(magnitude: &[u8]) -> Option<[u8; SCALAR_LEN]> {
    let first = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());
    let significant = &magnitude[first..];
    if significant.len() > SCALAR_LEN {
        return None;
    }

    let mut out = [0u8; SCALAR_LEN];
    out[SCALAR_LEN - significant.len()..].copy_from_slice(significant);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn der(r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut out = vec![SEQUENCE_TAG, (4 + r.len() + s.len()) as u8];
        out.extend([INTEGER_TAG, r.len() as u8]);
        out.extend_from_slice(r);
        out.extend([INTEGER_TAG, s.len() as u8]);
        out.extend_from_slice(s);
        out
    }

    #[test]
    fn test_raw_signature() {
        let mut sig = [0u8; 64];
        sig[31] = 1;
        sig[63] = 2;

        let pair = decode_signature(&sig).unwrap();
        assert_eq!(pair.r, &sig[..32]);
        assert_eq!(pair.s, &sig[32..]);
    }

    #[test]
    fn test_raw_wrong_length() {
        assert_eq!(
            decode_signature(b"short"),
            Err(SignatureFormatError::InvalidLength(5))
        );
        assert_eq!(decode_signature(&[]), Err(SignatureFormatError::InvalidLength(0)));
        assert_eq!(
            decode_signature(&[1u8; 65]),
            Err(SignatureFormatError::InvalidLength(65))
        );
    }

    #[test]
    fn test_raw_zero_scalars() {
        let mut sig = [0u8; 64];
        sig[63] = 1;
        assert_eq!(decode_signature(&sig), Err(SignatureFormatError::RawNotPositive));

        let mut sig = [0u8; 64];
        sig[0] = 1;
        assert_eq!(decode_signature(&sig), Err(SignatureFormatError::RawNotPositive));
    }

    #[test]
    fn test_der_signature() {
        let r = [0x00, 0x80, 0x01, 0x02];
        let s = [0x05; 32];
        let sig = der(&r, &s);

        let pair = decode_signature(&sig).unwrap();
        assert_eq!(pair.r, &r);
        assert_eq!(pair.s, &s);
    }

    #[test]
    fn test_der_too_short() {
        assert_eq!(
            decode_signature(&[0x30, 0x04, 0x02, 0x01, 0x01]),
            Err(SignatureFormatError::DerTooShort(5))
        );
    }

    #[test]
    fn test_der_long_form_lengths() {
        let mut sig = der(&[1, 2], &[3, 4]);
        sig[1] = 0x81;
        assert_eq!(decode_signature(&sig), Err(SignatureFormatError::SequenceLongForm));

        let mut sig = der(&[1, 2], &[3, 4]);
        sig[3] = 0x81;
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::IntegerLongForm(Scalar::R))
        );

        let mut sig = der(&[1, 2], &[3, 4]);
        sig[7] = 0x80;
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::IntegerLongForm(Scalar::S))
        );
    }

    #[test]
    fn test_der_sequence_overrun() {
        let mut sig = der(&[1, 2], &[3, 4]);
        sig[1] = 0x40;
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::SequenceOverrun {
                declared: 0x40,
                available: 8
            })
        );
    }

    #[test]
    fn test_der_wrong_integer_tags() {
        let mut sig = der(&[1, 2], &[3, 4]);
        sig[2] = 0x04;
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::ExpectedInteger {
                scalar: Scalar::R,
                position: 2
            })
        );

        let mut sig = der(&[1, 2], &[3, 4]);
        sig[6] = 0x03;
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::ExpectedInteger {
                scalar: Scalar::S,
                position: 6
            })
        );
    }

    #[test]
    fn test_der_zero_lengths_are_distinguished() {
        // 30 06 02 00 02 02 03 04
        let sig = [0x30, 0x06, 0x02, 0x00, 0x02, 0x02, 0x03, 0x04];
        let err = decode_signature(&sig).unwrap_err();
        assert_eq!(err, SignatureFormatError::ZeroLength(Scalar::R));
        assert!(err.to_string().contains("r length is zero"));

        // 30 06 02 02 01 02 02 00
        let sig = [0x30, 0x06, 0x02, 0x02, 0x01, 0x02, 0x02, 0x00];
        let err = decode_signature(&sig).unwrap_err();
        assert_eq!(err, SignatureFormatError::ZeroLength(Scalar::S));
        assert!(err.to_string().contains("s length is zero"));
    }

    #[test]
    fn test_der_integer_overrun() {
        let sig = [0x30, 0x06, 0x02, 0x05, 0x01, 0x02, 0x02, 0x01];
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::IntegerOverrun {
                scalar: Scalar::R,
                len: 5,
                remaining: 4
            })
        );

        let sig = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x03, 0x01];
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::IntegerOverrun {
                scalar: Scalar::S,
                len: 3,
                remaining: 1
            })
        );
    }

    #[test]
    fn test_der_truncated_before_s_length() {
        // r consumes everything up to the s tag; the s length byte is missing.
        let sig = [0x30, 0x06, 0x02, 0x04, 0x01, 0x02, 0x03, 0x04, 0x02];
        assert_eq!(decode_signature(&sig), Err(SignatureFormatError::UnexpectedEnd));
    }

    #[test]
    fn test_der_zero_value_rejected() {
        let err = decode_signature(&der(&[0x00], &[0x01, 0x02])).unwrap_err();
        assert_eq!(err, SignatureFormatError::NotPositive(Scalar::R));
        assert!(err.to_string().contains("r must be positive"));

        let err = decode_signature(&der(&[0x01, 0x02], &[0x00, 0x00])).unwrap_err();
        assert_eq!(err, SignatureFormatError::NotPositive(Scalar::S));
    }

    #[test]
    fn test_range_check() {
        let one = [0x01];
        let pair = ScalarPair { r: &one, s: &CURVE_ORDER };
        assert_eq!(
            ParsedSignature::from_scalars(pair),
            Err(VerifyError::ExceedsCurveOrder)
        );

        let mut below = CURVE_ORDER;
        below[31] -= 1;
        let parsed = ParsedSignature::from_scalars(ScalarPair { r: &one, s: &below }).unwrap();
        assert_eq!(parsed.s, below);
        assert_eq!(parsed.r[31], 1);
        assert!(parsed.r[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_range_check_wide_values() {
        // 33 bytes with a zero pad still fits.
        let mut padded = vec![0x00];
        padded.extend_from_slice(&[0x7f; 32]);
        assert!(ParsedSignature::from_scalars(ScalarPair { r: &padded, s: &[1] }).is_ok());

        // 33 significant bytes cannot.
        let wide = [0x01; 33];
        assert_eq!(
            ParsedSignature::from_scalars(ScalarPair { r: &[1], s: &wide }),
            Err(VerifyError::ExceedsCurveOrder)
        );
    }

    #[test]
    fn test_raw_signature_starting_with_sequence_tag_goes_to_der() {
        // A raw r whose first byte is 0x30 is indistinguishable from a DER header.
        let mut sig = [0x11u8; 64];
        sig[0] = SEQUENCE_TAG;
        assert_eq!(
            decode_signature(&sig),
            Err(SignatureFormatError::ExpectedInteger {
                scalar: Scalar::R,
                position: 2
            })
        );
    }

    #[test]
    fn test_der_high_bit_read_as_unsigned() {
        // 0x80.. without the 0x00 pad is not canonical DER but is accepted as a magnitude.
        let r = [0x80; 32];
        let sig = der(&r, &[0x01]);
        let pair = decode_signature(&sig).unwrap();
        let parsed = ParsedSignature::from_scalars(pair).unwrap();
        assert_eq!(parsed.r, r);
    }
}
