//! Token-template rendering of civil calendar fields.
//!
//! Templates are a small token language: `y m d h i s l` render zero-padded
//! calendar fields and `z` renders the resolved offset of the timezone
//! label; every other character passes through unchanged. Substitution is a
//! single pass over the template, so rendered text is never re-matched.

use chrono::NaiveDate;
use log::warn;

use crate::offset::{format_offset, resolve_offset};

/// Default template: full ISO-like form with milliseconds and offset.
pub const TEMPLATE_FULL: &str = "y-m-dTh:i:s.lz";

/// Alternate template omitting the milliseconds.
pub const TEMPLATE_NO_MILLIS: &str = "y-m-dTh:i:sz";

/// The civil reading of an instant: human calendar fields under some offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilFields {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

/// Render civil fields and a timezone label through a token template.
///
/// | Token | Rendering |
/// |-------|-----------|
/// | `y`   | year, 4 digits |
/// | `m`   | month, 2 digits |
/// | `d`   | day, 2 digits |
/// | `h`   | hour, 2 digits |
/// | `i`   | minute, 2 digits |
/// | `s`   | second, 2 digits |
/// | `l`   | millisecond, 3 digits |
/// | `z`   | offset of `label`, `±HH:MM` |
///
/// For a named zone the `z` token is resolved against the instant the
/// fields imply (taken provisionally as a UTC reading); fixed-offset and
/// UTC labels have no instant dependence. A label that cannot be resolved
/// renders as `+00:00` with a `warn!` notice.
pub fn render(fields: &CivilFields, label: &str, template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    for ch in template.chars() {
        match ch {
            'y' => out.push_str(&format!("{:04}", fields.year)),
            'm' => out.push_str(&format!("{:02}", fields.month)),
            'd' => out.push_str(&format!("{:02}", fields.day)),
            'h' => out.push_str(&format!("{:02}", fields.hour)),
            'i' => out.push_str(&format!("{:02}", fields.minute)),
            's' => out.push_str(&format!("{:02}", fields.second)),
            'l' => out.push_str(&format!("{:03}", fields.millisecond)),
            'z' => out.push_str(&offset_token(fields, label)),
            other => out.push(other),
        }
    }
    out
}

fn offset_token(fields: &CivilFields, label: &str) -> String {
    match resolve_offset(label, provisional_instant_ms(fields)) {
        Some(minutes) => format_offset(minutes),
        None => {
            warn!("cannot resolve timezone {label:?}; rendering its offset as UTC");
            format_offset(0)
        }
    }
}

/// The instant the fields imply, reading them provisionally as UTC.
fn provisional_instant_ms(fields: &CivilFields) -> i64 {
    NaiveDate::from_ymd_opt(fields.year, fields.month, fields.day)
        .and_then(|date| {
            date.and_hms_milli_opt(
                fields.hour,
                fields.minute,
                fields.second,
                fields.millisecond,
            )
        })
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}
