//! Relative-duration descriptors and elapsed-time arithmetic.
//!
//! A [`Shift`] is a sparse record of signed quantities. Day-and-below fields
//! have a fixed millisecond equivalent; years and months do not (month and
//! year lengths vary), so converting a shift that carries them to an elapsed
//! duration yields `None` rather than a guess.

use serde::{Deserialize, Serialize};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 86_400_000;

/// A sparse relative-duration record used for shift arithmetic.
///
/// Absent fields are omitted from the serialized form. A field present with
/// value 0 counts the same as an absent field.
///
/// # Examples
///
/// ```
/// use tzmoment::Shift;
///
/// let shift = Shift {
///     days: Some(3),
///     hours: Some(4),
///     ..Default::default()
/// };
/// assert_eq!(shift.to_millis(), Some(3 * 86_400_000 + 4 * 3_600_000));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shift {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milliseconds: Option<i64>,
}

impl Shift {
    /// Whether the shift carries a non-zero calendar-scale field.
    ///
    /// Years and months are range-unsafe to convert to a fixed duration.
    pub fn has_calendar_units(&self) -> bool {
        self.years.unwrap_or(0) != 0 || self.months.unwrap_or(0) != 0
    }

    /// Fixed-duration equivalent in milliseconds.
    ///
    /// Returns `None` when [`has_calendar_units`](Self::has_calendar_units)
    /// holds. This is a speculative query, not an error.
    pub fn to_millis(&self) -> Option<i64> {
        if self.has_calendar_units() {
            return None;
        }
        Some(
            self.milliseconds.unwrap_or(0)
                + self.seconds.unwrap_or(0) * MS_PER_SECOND
                + self.minutes.unwrap_or(0) * MS_PER_MINUTE
                + self.hours.unwrap_or(0) * MS_PER_HOUR
                + self.days.unwrap_or(0) * MS_PER_DAY,
        )
    }

    /// Fixed-duration equivalent in seconds, fractional below one second.
    pub fn to_seconds(&self) -> Option<f64> {
        self.to_millis().map(|ms| ms as f64 / 1_000.0)
    }

    /// Decompose an elapsed duration in seconds into a shift.
    ///
    /// The input is assumed non-negative; the sub-second part is rounded to
    /// whole milliseconds before decomposing.
    pub fn from_seconds(seconds: f64) -> Shift {
        Shift::from_millis((seconds * 1_000.0).round() as i64)
    }

    /// Decompose an elapsed duration in milliseconds, largest unit first.
    ///
    /// Populates days through milliseconds; years and months stay absent.
    pub fn from_millis(ms: i64) -> Shift {
        let days = ms.div_euclid(MS_PER_DAY);
        let mut rem = ms.rem_euclid(MS_PER_DAY);
        let hours = rem / MS_PER_HOUR;
        rem %= MS_PER_HOUR;
        let minutes = rem / MS_PER_MINUTE;
        rem %= MS_PER_MINUTE;
        let seconds = rem / MS_PER_SECOND;
        let milliseconds = rem % MS_PER_SECOND;
        Shift {
            days: Some(days),
            hours: Some(hours),
            minutes: Some(minutes),
            seconds: Some(seconds),
            milliseconds: Some(milliseconds),
            ..Default::default()
        }
    }
}

/// Parse `hh:mm` clock text into seconds since midnight.
///
/// Hour must be 0-23 and minute 0-59, each written with one or two digits.
pub fn clock_hm_to_seconds(text: &str) -> Option<i64> {
    let (h, m) = text.split_once(':')?;
    let hour = parse_clock_field(h, 23)?;
    let minute = parse_clock_field(m, 59)?;
    Some(hour * 3_600 + minute * 60)
}

/// Parse `hh:mm:ss` clock text into seconds since midnight.
pub fn clock_hms_to_seconds(text: &str) -> Option<i64> {
    let (h, rest) = text.split_once(':')?;
    let (m, s) = rest.split_once(':')?;
    let hour = parse_clock_field(h, 23)?;
    let minute = parse_clock_field(m, 59)?;
    let second = parse_clock_field(s, 59)?;
    Some(hour * 3_600 + minute * 60 + second)
}

/// One or two ASCII digits, at most `max`.
fn parse_clock_field(s: &str, max: i64) -> Option<i64> {
    if !(1..=2).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = s.parse::<i64>().ok()?;
    (value <= max).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_shift() -> Shift {
        Shift {
            days: Some(3),
            hours: Some(4),
            minutes: Some(5),
            seconds: Some(6),
            milliseconds: Some(789),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_millis_sums_fixed_units() {
        assert_eq!(sample_shift().to_millis(), Some(273_906_789));
    }

    #[test]
    fn test_to_seconds_keeps_millisecond_fraction() {
        assert_eq!(sample_shift().to_seconds(), Some(273_906.789));
    }

    #[test]
    fn test_calendar_units_are_not_representable() {
        let years = Shift {
            years: Some(1),
            ..Default::default()
        };
        let months = Shift {
            months: Some(-2),
            days: Some(1),
            ..Default::default()
        };
        assert_eq!(years.to_millis(), None);
        assert_eq!(months.to_millis(), None);
        assert_eq!(months.to_seconds(), None);
    }

    #[test]
    fn test_zero_calendar_fields_count_as_absent() {
        let shift = Shift {
            years: Some(0),
            months: Some(0),
            hours: Some(2),
            ..Default::default()
        };
        assert_eq!(shift.to_millis(), Some(2 * 3_600_000));
    }

    #[test]
    fn test_negative_fields_sum_signed() {
        let shift = Shift {
            hours: Some(-2),
            minutes: Some(30),
            ..Default::default()
        };
        assert_eq!(shift.to_millis(), Some(-2 * 3_600_000 + 30 * 60_000));
    }

    #[test]
    fn test_empty_shift_is_zero() {
        assert_eq!(Shift::default().to_millis(), Some(0));
    }

    #[test]
    fn test_from_seconds_decomposes_largest_first() {
        let shift = Shift::from_seconds(273_906.789);
        assert_eq!(shift.days, Some(3));
        assert_eq!(shift.hours, Some(4));
        assert_eq!(shift.minutes, Some(5));
        assert_eq!(shift.seconds, Some(6));
        assert_eq!(shift.milliseconds, Some(789));
        assert_eq!(shift.years, None);
        assert_eq!(shift.months, None);
    }

    #[test]
    fn test_from_seconds_sub_day() {
        let shift = Shift::from_seconds(45.0);
        assert_eq!(shift.days, Some(0));
        assert_eq!(shift.seconds, Some(45));
        assert_eq!(shift.milliseconds, Some(0));
    }

    #[test]
    fn test_serde_sparse_representation() {
        let shift = Shift {
            days: Some(3),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&shift).unwrap(), r#"{"days":3}"#);

        let parsed: Shift = serde_json::from_str(r#"{"hours":4,"minutes":5}"#).unwrap();
        assert_eq!(parsed.hours, Some(4));
        assert_eq!(parsed.minutes, Some(5));
        assert_eq!(parsed.days, None);
    }

    #[test]
    fn test_clock_hm_to_seconds() {
        assert_eq!(clock_hm_to_seconds("09:30"), Some(34_200));
        assert_eq!(clock_hm_to_seconds("9:5"), Some(9 * 3_600 + 5 * 60));
        assert_eq!(clock_hm_to_seconds("00:00"), Some(0));
        assert_eq!(clock_hm_to_seconds("23:59"), Some(86_340));
    }

    #[test]
    fn test_clock_hm_rejects_out_of_range() {
        assert_eq!(clock_hm_to_seconds("24:00"), None);
        assert_eq!(clock_hm_to_seconds("12:60"), None);
        assert_eq!(clock_hm_to_seconds("12"), None);
        assert_eq!(clock_hm_to_seconds("12:34:56"), None);
        assert_eq!(clock_hm_to_seconds("ab:cd"), None);
    }

    #[test]
    fn test_clock_hms_to_seconds() {
        assert_eq!(clock_hms_to_seconds("07:45:30"), Some(27_930));
        assert_eq!(clock_hms_to_seconds("23:59:59"), Some(86_399));
        assert_eq!(clock_hms_to_seconds("24:00:00"), None);
        assert_eq!(clock_hms_to_seconds("12:00:60"), None);
        assert_eq!(clock_hms_to_seconds("12:00"), None);
    }

    proptest! {
        #[test]
        fn prop_elapsed_round_trips(ms in 0i64..=4_102_444_800_000) {
            prop_assert_eq!(Shift::from_millis(ms).to_millis(), Some(ms));
        }

        #[test]
        fn prop_from_seconds_matches_from_millis(ms in 0i64..=4_102_444_800_000) {
            prop_assert_eq!(Shift::from_seconds(ms as f64 / 1_000.0), Shift::from_millis(ms));
        }
    }
}
