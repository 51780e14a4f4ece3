//! Expiration deadlines encoded as little-endian tick counts.
//!
//! The on-wire unit is the tick: 100 nanoseconds, counted from
//! 0001-01-01T00:00:00 UTC. Containers produced by earlier deployments use
//! this clock, so both directions of the conversion keep it.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::types::{EXPIRY_LEN, EncBoxError};

/// Ticks per second (one tick is 100 ns).
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Tick count at the Unix epoch (1970-01-01 relative to year 1).
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Largest representable tick count (end of year 9999).
const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

/// Window used by the presence heuristic: a decoded instant counts as a
/// plausible deadline only within this many days of the current time.
const PLAUSIBLE_WINDOW_DAYS: i64 = 36_525; // ~100 years

fn to_ticks(at: DateTime<Utc>) -> Option<i64> {
    let ticks = UNIX_EPOCH_TICKS
        .checked_add(at.timestamp().checked_mul(TICKS_PER_SECOND)?)?
        .checked_add(i64::from(at.timestamp_subsec_nanos()) / 100)?;
    (0..=MAX_TICKS).contains(&ticks).then_some(ticks)
}

fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    if !(0..=MAX_TICKS).contains(&ticks) {
        return None;
    }
    let unix_ticks = ticks - UNIX_EPOCH_TICKS;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

/// Encode an absolute UTC deadline into the 8-byte container field.
///
/// # Errors
///
/// Returns `EncBoxError::Invalid` unless the deadline is strictly in the
/// future at encode time and representable on the tick clock (year 9999 at
/// the latest).
pub fn encode_deadline(deadline: DateTime<Utc>) -> Result<[u8; EXPIRY_LEN], EncBoxError> {
    if deadline <= Utc::now() {
        return Err(EncBoxError::Invalid("expiration must be in the future"));
    }
    let ticks = to_ticks(deadline).ok_or(EncBoxError::Invalid(
        "expiration is beyond the representable range",
    ))?;
    Ok(ticks.to_le_bytes())
}

/// Decide whether 8 raw bytes look like an encoded deadline.
///
/// Used by the container codec to tell an expiration field apart from
/// ciphertext that merely starts at the same offset. Random bytes rarely
/// land within a century of now, but they can; the codec accepts that
/// misclassification risk for compatibility with the flagless layout.
pub fn looks_like_deadline(field: &[u8; EXPIRY_LEN]) -> bool {
    let ticks = i64::from_le_bytes(*field);
    let Some(at) = from_ticks(ticks) else {
        return false;
    };
    let window = TimeDelta::days(PLAUSIBLE_WINDOW_DAYS);
    let now = Utc::now();
    at > now - window && at < now + window
}

/// Check an optional expiration field against the current time.
///
/// No field means the container never expires. A field that does not decode
/// to a valid instant is treated the same way; the codec already screened it,
/// so this only happens for legacy containers written with out-of-range
/// clocks.
pub fn check_expired(field: Option<&[u8; EXPIRY_LEN]>) -> Result<(), EncBoxError> {
    let Some(field) = field else {
        return Ok(());
    };
    let ticks = i64::from_le_bytes(*field);
    if let Some(deadline) = from_ticks(ticks)
        && Utc::now() > deadline
    {
        return Err(EncBoxError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_trip_second_precision() {
        let at = Utc.with_ymd_and_hms(2031, 5, 17, 12, 0, 0).unwrap();
        let back = from_ticks(to_ticks(at).unwrap()).unwrap();
        assert_eq!(back, at);
    }

    #[test]
    fn unix_epoch_maps_to_known_tick_count() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(to_ticks(epoch), Some(UNIX_EPOCH_TICKS));
    }

    #[test]
    fn past_deadline_rejected_at_encode() {
        let yesterday = Utc::now() - TimeDelta::days(1);
        assert!(matches!(
            encode_deadline(yesterday),
            Err(EncBoxError::Invalid(_))
        ));
    }

    #[test]
    fn near_future_deadline_is_plausible() {
        let field = encode_deadline(Utc::now() + TimeDelta::hours(1)).unwrap();
        assert!(looks_like_deadline(&field));
    }

    #[test]
    fn extreme_tick_values_are_not_plausible() {
        assert!(!looks_like_deadline(&[0u8; EXPIRY_LEN]));
        assert!(!looks_like_deadline(&[0xFF; EXPIRY_LEN]));
    }

    #[test]
    fn expired_field_detected() {
        let past = to_ticks(Utc::now() - TimeDelta::minutes(5))
            .unwrap()
            .to_le_bytes();
        assert!(matches!(
            check_expired(Some(&past)),
            Err(EncBoxError::Expired)
        ));
    }

    #[test]
    fn missing_field_never_expires() {
        assert!(check_expired(None).is_ok());
    }
}
