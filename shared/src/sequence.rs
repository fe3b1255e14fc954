//! Wrapping sequence-number comparison.
//!
//! Input and tick sequence numbers wrap around a fixed-width integer, so
//! ordinary `<` comparison breaks near the wraparound point. These helpers
//! compare two sequence numbers under the assumption that they are never
//! more than half the numeric range apart (§4.6 "sequence numbers are large
//! enough that wrap is not practically reachable").

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("integer overflow comparing sequence numbers {a} and {b}; this should not happen")]
    IntegerOverflow { a: u16, b: u16 },
}

/// `sequence_greater_than(2, 1) == true`, `sequence_greater_than(1, 2) == false`.
pub fn sequence_greater_than(s1: u16, s2: u16) -> bool {
    ((s1 > s2) && (s1 - s2 <= 32768)) || ((s1 < s2) && (s2 - s1 > 32768))
}

/// `sequence_less_than(1, 2) == true`, `sequence_less_than(2, 1) == false`.
pub fn sequence_less_than(s1: u16, s2: u16) -> bool {
    sequence_greater_than(s2, s1)
}

/// Wrapping difference `b - a`, returning an error on the (practically
/// unreachable) overflow case instead of panicking.
///
/// ```
/// use venture_shared::sequence::try_wrapping_diff;
/// assert_eq!(try_wrapping_diff(1, 2).unwrap(), 1);
/// assert_eq!(try_wrapping_diff(2, 1).unwrap(), -1);
/// assert_eq!(try_wrapping_diff(65535, 0).unwrap(), 1);
/// ```
pub fn try_wrapping_diff(a: u16, b: u16) -> Result<i16, SequenceError> {
    const MAX: i32 = i16::MAX as i32;
    const MIN: i32 = i16::MIN as i32;
    const ADJUST: i32 = (u16::MAX as i32) + 1;

    let a_i32 = i32::from(a);
    let b_i32 = i32::from(b);

    let mut result = b_i32 - a_i32;
    if (MIN..=MAX).contains(&result) {
        return Ok(result as i16);
    }
    if b_i32 > a_i32 {
        result = b_i32 - (a_i32 + ADJUST);
    } else {
        result = (b_i32 + ADJUST) - a_i32;
    }
    if (MIN..=MAX).contains(&result) {
        Ok(result as i16)
    } else {
        Err(SequenceError::IntegerOverflow { a, b })
    }
}

/// Same as [`try_wrapping_diff`] but panics on the unreachable overflow case.
/// Only used where the caller has already bounded the inputs (tests, or
/// values derived from a local monotonic counter).
pub fn wrapping_diff(a: u16, b: u16) -> i16 {
    try_wrapping_diff(a, b).expect("integer overflow in wrapping_diff")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greater_is_greater() {
        assert!(sequence_greater_than(2, 1));
        assert!(!sequence_greater_than(1, 2));
        assert!(!sequence_greater_than(1, 1));
    }

    #[test]
    fn wraps_around() {
        assert!(sequence_greater_than(0, 65535));
        assert!(sequence_less_than(65535, 0));
    }

    #[test]
    fn diff_matches_subtraction_in_range() {
        assert_eq!(wrapping_diff(10, 15), 5);
        assert_eq!(wrapping_diff(15, 10), -5);
    }

    #[test]
    fn diff_wraps() {
        assert_eq!(wrapping_diff(65535, 0), 1);
        assert_eq!(wrapping_diff(0, 65535), -1);
    }
}
