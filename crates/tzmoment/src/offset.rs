//! Offset notation codec.
//!
//! Converts a timezone notation (a fixed offset such as `+09:00`, a UTC
//! alias, or an IANA `Area/Location` name) to a signed offset in minutes,
//! and back.
//!
//! # Sign Convention
//!
//! The stored offset is the number of minutes to *subtract* from UTC to get
//! local time (`local = utc − offset`), which inverts everyday "UTC+9"
//! notation: Asia/Tokyo resolves to `-540` and renders as `+09:00`. Every
//! computation in this crate is built on that inversion, and an offset of
//! zero always renders as `+00:00`, never `-00:00`.

use chrono::{DateTime, Offset, TimeZone};
use chrono_tz::Tz;

/// Resolve a timezone notation to an offset in minutes.
///
/// `at_ms` is the reference instant (epoch milliseconds) for IANA names.
/// A named zone's offset is a property of (name, instant), not of the name
/// alone, because zones change offset across history (daylight saving,
/// legislation). Fixed-offset and UTC-alias notations ignore it.
///
/// Returns `None` when the notation is not recognized. `None` is a distinct
/// outcome from an offset of zero; callers decide whether to fall back to
/// UTC or surface it.
///
/// # Examples
///
/// ```
/// use tzmoment::resolve_offset;
///
/// assert_eq!(resolve_offset("+09:00", 0), Some(-540));
/// assert_eq!(resolve_offset("Asia/Tokyo", 0), Some(-540));
/// assert_eq!(resolve_offset("UTC", 0), Some(0));
/// assert_eq!(resolve_offset("not a zone", 0), None);
/// ```
pub fn resolve_offset(notation: &str, at_ms: i64) -> Option<i32> {
    let s = notation.trim();

    if let Some(minutes) = parse_fixed_offset(s) {
        return Some(minutes);
    }

    if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("gmt") {
        return Some(0);
    }

    // IANA lookup runs before the trailing-z alias: zone names can end in
    // 'z' (America/La_Paz) and must reach the database.
    if let Some(minutes) = named_zone_offset(s, at_ms) {
        return Some(minutes);
    }

    if s.ends_with('z') || s.ends_with('Z') {
        return Some(0);
    }

    None
}

/// Format an offset in minutes as `±HH:MM`.
///
/// Renders `+` for non-positive offsets and `-` for positive ones (the
/// inverse of the stored sign, per the convention above), so `-540`
/// (Asia/Tokyo) renders as `+09:00` and `0` renders as `+00:00`.
pub fn format_offset(offset: i32) -> String {
    let sign = if offset > 0 { '-' } else { '+' };
    let abs = offset.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

/// Parse a fixed-offset notation `[+-]H{1,2}:M{1,2}` into minutes.
///
/// The whole input must be the notation. A `-00:00` input parses to plain
/// zero; the sign inversion happens here (`+` notation → negative minutes).
pub(crate) fn parse_fixed_offset(s: &str) -> Option<i32> {
    let sign = match s.as_bytes().first()? {
        b'+' => -1,
        b'-' => 1,
        _ => return None,
    };
    let (hour, rest) = take_digits(&s[1..])?;
    let (minute, rest) = take_digits(rest.strip_prefix(':')?)?;
    if !rest.is_empty() {
        return None;
    }
    Some(sign * (hour * 60 + minute))
}

/// Take one or two leading ASCII digits as a number.
fn take_digits(s: &str) -> Option<(i32, &str)> {
    let n = s.bytes().take_while(u8::is_ascii_digit).count();
    if !(1..=2).contains(&n) {
        return None;
    }
    let value = s[..n].parse::<i32>().ok()?;
    Some((value, &s[n..]))
}

/// Offset of an IANA zone at a reference instant, in inverted minutes.
fn named_zone_offset(name: &str, at_ms: i64) -> Option<i32> {
    let tz: Tz = name.parse().ok()?;
    let at = DateTime::from_timestamp_millis(at_ms)?;
    let east_seconds = tz
        .offset_from_utc_datetime(&at.naive_utc())
        .fix()
        .local_minus_utc();
    Some(-east_seconds / 60)
}
