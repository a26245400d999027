//! Replay-window check for the webhook timestamp header.

use std::time::{SystemTime, UNIX_EPOCH};

use super::error::VerifyError;

/// Maximum age of a signed delivery, in seconds.
pub const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Current UNIX time in whole seconds.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Validate a decimal UNIX timestamp against `now`.
///
/// An age of exactly [`MAX_TIMESTAMP_AGE_SECS`] is still accepted. Any
/// timestamp ahead of `now` is rejected, there is no skew allowance.
pub fn check_timestamp(timestamp: &str, now: i64) -> Result<i64, VerifyError> {
    let webhook_time: i64 = timestamp.parse().map_err(VerifyError::InvalidTimestamp)?;

    let age = now.saturating_sub(webhook_time);

    if age > MAX_TIMESTAMP_AGE_SECS {
        return Err(VerifyError::TimestampTooOld {
            age_secs: age,
            max_age_secs: MAX_TIMESTAMP_AGE_SECS,
        });
    }

    if age < 0 {
        return Err(VerifyError::TimestampInFuture {
            skew_secs: age.saturating_neg(),
        });
    }

    Ok(webhook_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_boundaries() {
        assert_eq!(check_timestamp(&NOW.to_string(), NOW), Ok(NOW));
        assert!(check_timestamp(&(NOW - 300).to_string(), NOW).is_ok());
        assert!(matches!(
            check_timestamp(&(NOW - 301).to_string(), NOW),
            Err(VerifyError::TimestampTooOld { age_secs: 301, .. })
        ));
        assert!(matches!(
            check_timestamp(&(NOW + 1).to_string(), NOW),
            Err(VerifyError::TimestampInFuture { skew_secs: 1 })
        ));
    }

    #[test]
    fn test_invalid_format() {
        for input in ["not-a-number", "12.5", " 1700000000", "0x10", ""] {
            let err = check_timestamp(input, NOW).unwrap_err();
            assert!(err.to_string().contains("invalid timestamp format"), "{input}");
        }
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        assert!(matches!(
            check_timestamp(&i64::MIN.to_string(), NOW),
            Err(VerifyError::TimestampTooOld { .. })
        ));
        assert!(matches!(
            check_timestamp(&i64::MAX.to_string(), NOW),
            Err(VerifyError::TimestampInFuture { .. })
        ));
    }

    #[test]
    fn test_old_timestamp_message() {
        let err = check_timestamp("946684800", NOW).unwrap_err();
        assert!(err.to_string().contains("timestamp too old"));
    }
}
