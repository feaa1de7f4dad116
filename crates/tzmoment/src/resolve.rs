//! Construction-source resolution.
//!
//! Turns each accepted input shape into one canonical pair of
//! (absolute instant in epoch milliseconds, timezone label). The accepted
//! shapes form a closed set: dispatch is an exhaustive match over
//! [`Source`], never a runtime probe, and every branch either fully
//! succeeds or fails with [`MomentError::InvalidSource`].
//!
//! The process-wide clock-skew gap lives here too: it is read on exactly
//! one path (the [`Source::Now`] branch) and mutated only through
//! [`Moment::set_clock`](crate::Moment::set_clock) /
//! [`Moment::reset_clock`](crate::Moment::reset_clock).

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::warn;

use crate::error::{MomentError, Result};
use crate::moment::Moment;
use crate::offset::{format_offset, parse_fixed_offset, resolve_offset};
use crate::shift::Shift;

/// The accepted construction inputs, as a closed set.
///
/// Anything convertible into a `Source` can construct a
/// [`Moment`](crate::Moment) or stand on the right-hand side of a
/// comparison; conversions exist for epoch milliseconds, civil text,
/// existing values, shifts, and `chrono::DateTime<Utc>`.
#[derive(Debug, Clone)]
pub enum Source {
    /// No source: the current instant, with the clock-skew gap applied.
    Now,
    /// An absolute instant in epoch milliseconds.
    EpochMillis(i64),
    /// An ISO-like civil timestamp, optionally ending in a `±HH:MM` offset
    /// or `Z`.
    Text(String),
    /// An existing value.
    Value(Moment),
    /// A shift applied to the current instant.
    Relative(Shift),
}

impl From<i64> for Source {
    fn from(ms: i64) -> Self {
        Source::EpochMillis(ms)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Text(text.to_string())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Text(text)
    }
}

impl From<Shift> for Source {
    fn from(shift: Shift) -> Self {
        Source::Relative(shift)
    }
}

impl From<Moment> for Source {
    fn from(value: Moment) -> Self {
        Source::Value(value)
    }
}

impl From<&Moment> for Source {
    fn from(value: &Moment) -> Self {
        Source::Value(value.clone())
    }
}

impl From<DateTime<Utc>> for Source {
    fn from(dt: DateTime<Utc>) -> Self {
        Source::EpochMillis(dt.timestamp_millis())
    }
}

// ── Clock skew ──────────────────────────────────────────────────────────────

// "Read skew, then read real clock" must be observed as a consistent pair,
// so the gap is an atomic rather than an unsynchronized module variable.
static CLOCK_SKEW_MS: AtomicI64 = AtomicI64::new(0);

pub(crate) fn clock_skew_ms() -> i64 {
    CLOCK_SKEW_MS.load(Ordering::SeqCst)
}

pub(crate) fn set_clock_skew_ms(gap_ms: i64) {
    CLOCK_SKEW_MS.store(gap_ms, Ordering::SeqCst);
}

/// The host clock, unskewed. `set_clock` anchors the gap against this.
pub(crate) fn real_now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn skewed_now_ms() -> i64 {
    real_now_ms() + clock_skew_ms()
}

// ── Resolution ──────────────────────────────────────────────────────────────

/// Resolve a source and optional target timezone into the canonical
/// (instant, label) pair.
///
/// The label defaults to `UTC`; a supplied label that does not resolve
/// falls back to `UTC` with a `warn!` notice, so the returned label always
/// resolves.
pub(crate) fn resolve(source: Source, timezone: Option<&str>) -> Result<(i64, String)> {
    match source {
        Source::Now => {
            let instant = skewed_now_ms();
            Ok((instant, checked_label(timezone, instant)))
        }
        Source::EpochMillis(ms) => Ok((ms, checked_label(timezone, ms))),
        Source::Text(text) => resolve_text(&text, timezone),
        Source::Value(value) => {
            let instant = value.epoch_millis();
            match timezone {
                // Re-labeling is a view change; the instant never moves.
                Some(label) => Ok((instant, checked_label(Some(label), instant))),
                None => Ok((instant, value.timezone().to_string())),
            }
        }
        Source::Relative(shift) => {
            let delta = shift.to_millis().ok_or_else(|| {
                MomentError::UnrepresentableShift(
                    "years and months have no fixed duration".to_string(),
                )
            })?;
            let instant = skewed_now_ms() + delta;
            Ok((instant, checked_label(timezone, instant)))
        }
    }
}

pub(crate) fn checked_label(timezone: Option<&str>, at_ms: i64) -> String {
    match timezone {
        None => "UTC".to_string(),
        Some(label) => {
            if resolve_offset(label, at_ms).is_some() {
                label.to_string()
            } else {
                warn!("unrecognized timezone {label:?}; falling back to UTC");
                "UTC".to_string()
            }
        }
    }
}

fn resolve_text(text: &str, timezone: Option<&str>) -> Result<(i64, String)> {
    let trimmed = text.trim();

    if let Some((head, embedded)) = split_trailing_offset(trimmed) {
        let civil = parse_civil_ms(head).ok_or_else(|| invalid_source(text))?;
        // The embedded offset always anchors the instant (local = utc − offset).
        let instant = civil + i64::from(embedded) * 60_000;
        return match timezone {
            None => Ok((instant, format_offset(embedded))),
            Some(label) => {
                let label = checked_label(Some(label), instant);
                let resolved = resolve_offset(&label, instant).unwrap_or(0);
                if resolved != embedded {
                    warn!(
                        "adopting timezone {:?} over the {} offset embedded in {:?}; \
                         the instant keeps the embedded offset",
                        label,
                        format_offset(embedded),
                        text,
                    );
                }
                Ok((instant, label))
            }
        };
    }

    let civil = parse_civil_ms(trimmed).ok_or_else(|| invalid_source(text))?;
    // No embedded offset: the text is a civil reading in the target label's
    // offset. A named label is resolved against the civil reading taken
    // provisionally as UTC, since the true instant is not known until the
    // offset is.
    let label = checked_label(timezone, civil);
    let offset = resolve_offset(&label, civil).unwrap_or(0);
    Ok((civil + i64::from(offset) * 60_000, label))
}

fn invalid_source(text: &str) -> MomentError {
    MomentError::InvalidSource(format!("cannot parse {text:?} as a civil timestamp"))
}

/// Split a trailing `±H:M`-style offset or `Z` marker off a civil text.
fn split_trailing_offset(s: &str) -> Option<(&str, i32)> {
    if let Some(head) = s.strip_suffix(['Z', 'z']) {
        return Some((head, 0));
    }
    let idx = s.rfind(['+', '-'])?;
    if idx == 0 {
        return None;
    }
    let minutes = parse_fixed_offset(&s[idx..])?;
    Some((&s[..idx], minutes))
}

const CIVIL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse civil text (no offset) into milliseconds under a zero offset.
fn parse_civil_ms(s: &str) -> Option<i64> {
    for format in CIVIL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

#[cfg(test)]
pub(crate) static CLOCK_STATE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_clock() -> std::sync::MutexGuard<'static, ()> {
        CLOCK_STATE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rfc3339_ms(s: &str) -> i64 {
        DateTime::parse_from_rfc3339(s).unwrap().timestamp_millis()
    }

    #[test]
    fn test_number_is_the_absolute_instant() {
        let (instant, label) = resolve(Source::from(0), Some("Asia/Tokyo")).unwrap();
        assert_eq!(instant, 0);
        assert_eq!(label, "Asia/Tokyo");
    }

    #[test]
    fn test_number_defaults_to_utc_label() {
        let (instant, label) = resolve(Source::from(12_345), None).unwrap();
        assert_eq!(instant, 12_345);
        assert_eq!(label, "UTC");
    }

    #[test]
    fn test_text_with_embedded_offset_adopts_fixed_label() {
        let (instant, label) =
            resolve(Source::from("2024-06-01T22:55:30.123+09:00"), None).unwrap();
        assert_eq!(instant, rfc3339_ms("2024-06-01T22:55:30.123+09:00"));
        assert_eq!(label, "+09:00");
    }

    #[test]
    fn test_text_with_negative_embedded_offset() {
        let (instant, label) =
            resolve(Source::from("2000-01-01T18:04:05.678-09:00"), None).unwrap();
        assert_eq!(instant, rfc3339_ms("2000-01-01T18:04:05.678-09:00"));
        assert_eq!(label, "-09:00");
    }

    #[test]
    fn test_text_with_terminal_z_is_a_zero_offset() {
        let (instant, label) = resolve(Source::from("1970-01-01T00:00:00Z"), None).unwrap();
        assert_eq!(instant, 0);
        assert_eq!(label, "+00:00");
    }

    #[test]
    fn test_conflicting_label_wins_display_but_not_instant() {
        let (instant, label) = resolve(
            Source::from("1970-01-01T00:00:00+00:00"),
            Some("Pacific/Chatham"),
        )
        .unwrap();
        assert_eq!(instant, 0);
        assert_eq!(label, "Pacific/Chatham");
    }

    #[test]
    fn test_matching_label_and_embedded_offset_is_quiet() {
        let (instant, label) = resolve(
            Source::from("1970-01-01T09:00:00+09:00"),
            Some("Asia/Tokyo"),
        )
        .unwrap();
        assert_eq!(instant, 0);
        assert_eq!(label, "Asia/Tokyo");
    }

    #[test]
    fn test_text_without_offset_parses_in_label_offset() {
        let (instant, label) =
            resolve(Source::from("1970-01-01T09:00:00"), Some("Asia/Tokyo")).unwrap();
        assert_eq!(instant, 0);
        assert_eq!(label, "Asia/Tokyo");
    }

    #[test]
    fn test_text_without_offset_defaults_to_utc() {
        let (instant, label) = resolve(Source::from("1970-01-02T00:00:00"), None).unwrap();
        assert_eq!(instant, 86_400_000);
        assert_eq!(label, "UTC");
    }

    #[test]
    fn test_date_only_text_is_midnight() {
        let (instant, _) = resolve(Source::from("1970-01-02"), None).unwrap();
        assert_eq!(instant, 86_400_000);
    }

    #[test]
    fn test_unresolvable_label_falls_back_to_utc() {
        let (instant, label) =
            resolve(Source::from("1970-01-01T00:00:00"), Some("Nowhere/Special")).unwrap();
        assert_eq!(instant, 0);
        assert_eq!(label, "UTC");
    }

    #[test]
    fn test_unparseable_text_is_invalid_source() {
        let err = resolve(Source::from("gobbledygook"), None).unwrap_err();
        assert!(err.to_string().contains("Invalid source"), "got: {err}");

        let err = resolve(Source::from("2024-13-40T99:99:99"), None).unwrap_err();
        assert!(err.to_string().contains("Invalid source"), "got: {err}");
    }

    #[test]
    fn test_value_copies_instant_and_label() {
        let value = Moment::with_timezone(12_345, "Asia/Tokyo").unwrap();
        let (instant, label) = resolve(Source::from(&value), None).unwrap();
        assert_eq!(instant, 12_345);
        assert_eq!(label, "Asia/Tokyo");
    }

    #[test]
    fn test_value_with_target_label_keeps_instant() {
        let value = Moment::with_timezone(12_345, "Asia/Tokyo").unwrap();
        let (instant, label) = resolve(Source::from(&value), Some("Pacific/Gambier")).unwrap();
        assert_eq!(instant, 12_345);
        assert_eq!(label, "Pacific/Gambier");
    }

    #[test]
    fn test_datetime_utc_source_is_its_instant() {
        let dt = DateTime::from_timestamp_millis(946_782_245_678).unwrap();
        let (instant, label) = resolve(Source::from(dt), None).unwrap();
        assert_eq!(instant, 946_782_245_678);
        assert_eq!(label, "UTC");
    }

    #[test]
    fn test_now_tracks_the_host_clock() {
        let _guard = lock_clock();
        let (instant, label) = resolve(Source::Now, None).unwrap();
        assert!((instant - real_now_ms()).abs() < 2_000);
        assert_eq!(label, "UTC");
    }

    #[test]
    fn test_relative_shifts_the_current_instant() {
        let _guard = lock_clock();
        let shift = Shift {
            days: Some(-1),
            ..Default::default()
        };
        let (instant, _) = resolve(Source::from(shift), Some("Asia/Tokyo")).unwrap();
        assert!((instant - (real_now_ms() - 86_400_000)).abs() < 2_000);
    }

    #[test]
    fn test_relative_with_calendar_units_fails() {
        let shift = Shift {
            months: Some(1),
            ..Default::default()
        };
        let err = resolve(Source::from(shift), None).unwrap_err();
        assert!(err.to_string().contains("no fixed duration"), "got: {err}");
    }

    #[test]
    fn test_split_trailing_offset_ignores_date_dashes() {
        assert_eq!(split_trailing_offset("2024-06-01"), None);
        assert_eq!(split_trailing_offset("2024-06-01T10:00:00"), None);
        assert_eq!(
            split_trailing_offset("2024-06-01T10:00:00+09:00"),
            Some(("2024-06-01T10:00:00", -540))
        );
        assert_eq!(
            split_trailing_offset("2024-06-01T10:00:00-09:30"),
            Some(("2024-06-01T10:00:00", 570))
        );
        assert_eq!(
            split_trailing_offset("2024-06-01T10:00:00Z"),
            Some(("2024-06-01T10:00:00", 0))
        );
    }
}
