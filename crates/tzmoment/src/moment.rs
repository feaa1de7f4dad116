//! The timezone-aware point-in-time value type.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

use crate::error::{MomentError, Result};
use crate::format::{render, CivilFields, TEMPLATE_NO_MILLIS};
use crate::offset::{format_offset, resolve_offset};
use crate::resolve::{self, Source};
use crate::shift::Shift;

/// An immutable pair of one absolute instant (epoch milliseconds) and one
/// timezone label.
///
/// The instant is epoch-correct regardless of the label; the label only
/// affects the *view* (the civil calendar fields, the rendered offset),
/// never the instant itself. Two moments are the same moment iff their
/// instants are equal, independent of label; equality and ordering compare
/// the instant alone.
///
/// Every operation returns a new value; nothing mutates in place.
///
/// # Examples
///
/// ```
/// use tzmoment::Moment;
///
/// let epoch = Moment::with_timezone(0, "Asia/Tokyo")?;
/// assert_eq!(epoch.to_string(), "1970-01-01T09:00:00+09:00");
/// assert_eq!(epoch.offset(), -540);
/// assert_eq!(epoch.epoch_millis(), 0);
///
/// let gambier = epoch.to_timezone("Pacific/Gambier");
/// assert_eq!(gambier.to_string(), "1969-12-31T15:00:00-09:00");
/// assert_eq!(gambier.epoch_millis(), 0);
/// # Ok::<(), tzmoment::MomentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Moment {
    instant_ms: i64,
    label: String,
}

impl Moment {
    /// Construct from any accepted source, labeled `UTC` unless the source
    /// carries its own label (an existing value, or text with an embedded
    /// offset).
    ///
    /// # Errors
    ///
    /// [`MomentError::InvalidSource`] for unparseable text and
    /// [`MomentError::UnrepresentableShift`] for a relative source with
    /// years or months.
    pub fn new(source: impl Into<Source>) -> Result<Self> {
        let (instant_ms, label) = resolve::resolve(source.into(), None)?;
        Ok(Moment { instant_ms, label })
    }

    /// Construct from any accepted source with an explicit target timezone.
    ///
    /// A label that does not resolve falls back to `UTC` with a `warn!`
    /// notice. When the source text embeds a conflicting offset, the label
    /// wins for display while the embedded offset anchors the instant.
    pub fn with_timezone(source: impl Into<Source>, timezone: &str) -> Result<Self> {
        let (instant_ms, label) = resolve::resolve(source.into(), Some(timezone))?;
        Ok(Moment { instant_ms, label })
    }

    /// The current instant (clock-skew override applied), labeled `UTC`.
    pub fn now() -> Self {
        Moment {
            instant_ms: resolve::skewed_now_ms(),
            label: "UTC".to_string(),
        }
    }

    /// The current instant (clock-skew override applied) under a timezone.
    pub fn now_in(timezone: &str) -> Self {
        let instant_ms = resolve::skewed_now_ms();
        let label = resolve::checked_label(Some(timezone), instant_ms);
        Moment { instant_ms, label }
    }

    // ── Views ───────────────────────────────────────────────────────────

    /// The absolute instant in epoch milliseconds.
    pub fn epoch_millis(&self) -> i64 {
        self.instant_ms
    }

    /// The absolute instant in whole epoch seconds, floored.
    pub fn unix_seconds(&self) -> i64 {
        self.instant_ms.div_euclid(1_000)
    }

    /// The timezone label this value displays under.
    pub fn timezone(&self) -> &str {
        &self.label
    }

    /// Resolved offset minutes of the label at this value's instant
    /// (`local = utc − offset`; Asia/Tokyo yields `-540`).
    pub fn offset(&self) -> i32 {
        resolve_offset(&self.label, self.instant_ms).unwrap_or(0)
    }

    /// The resolved offset rendered as `±HH:MM`.
    pub fn offset_string(&self) -> String {
        format_offset(self.offset())
    }

    /// The civil reading: the instant adjusted by the label's resolved
    /// offset, decomposed in the proleptic Gregorian calendar.
    fn civil(&self) -> NaiveDateTime {
        let civil_ms = self.instant_ms - i64::from(self.offset()) * 60_000;
        DateTime::from_timestamp_millis(civil_ms)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }

    pub fn year(&self) -> i32 {
        self.civil().year()
    }

    /// 1-based month of the civil reading.
    pub fn month(&self) -> u32 {
        self.civil().month()
    }

    /// 0-based month of the civil reading.
    pub fn month0(&self) -> u32 {
        self.civil().month0()
    }

    pub fn day(&self) -> u32 {
        self.civil().day()
    }

    pub fn hours(&self) -> u32 {
        self.civil().hour()
    }

    pub fn minutes(&self) -> u32 {
        self.civil().minute()
    }

    pub fn seconds(&self) -> u32 {
        self.civil().second()
    }

    pub fn milliseconds(&self) -> u32 {
        self.civil().nanosecond() / 1_000_000
    }

    /// The instant as a `chrono::DateTime<Utc>`.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.instant_ms).unwrap_or_default()
    }

    // ── Conversion and arithmetic ───────────────────────────────────────

    /// Re-anchor the display to another timezone. The instant is unchanged;
    /// only the view moves.
    pub fn to_timezone(&self, timezone: &str) -> Self {
        Moment {
            instant_ms: self.instant_ms,
            label: resolve::checked_label(Some(timezone), self.instant_ms),
        }
    }

    /// Apply a shift as a fixed elapsed duration, keeping the label.
    ///
    /// # Errors
    ///
    /// [`MomentError::UnrepresentableShift`] when the shift carries years
    /// or months: calendar-scale fields have no fixed duration, and this
    /// engine does not mutate calendar fields.
    pub fn shift(&self, shift: Shift) -> Result<Self> {
        let delta = shift.to_millis().ok_or_else(|| {
            MomentError::UnrepresentableShift("years and months have no fixed duration".to_string())
        })?;
        Ok(Moment {
            instant_ms: self.instant_ms + delta,
            label: self.label.clone(),
        })
    }

    // ── Comparison ──────────────────────────────────────────────────────

    /// Whether this instant is strictly after the other source's instant.
    ///
    /// The other side goes through the full construction resolver, so bare
    /// epoch numbers and civil text compare directly.
    pub fn is_after(&self, other: impl Into<Source>) -> Result<bool> {
        let (instant, _) = resolve::resolve(other.into(), None)?;
        Ok(self.instant_ms > instant)
    }

    /// Whether this instant is strictly before the other source's instant.
    pub fn is_before(&self, other: impl Into<Source>) -> Result<bool> {
        let (instant, _) = resolve::resolve(other.into(), None)?;
        Ok(self.instant_ms < instant)
    }

    /// Whether two values denote the same instant, labels aside.
    pub fn same_moment(&self, other: &Moment) -> bool {
        self.instant_ms == other.instant_ms
    }

    // ── Formatting ──────────────────────────────────────────────────────

    /// Render through a token template (see [`crate::format::render`]).
    pub fn format(&self, template: &str) -> String {
        let civil = self.civil();
        let fields = CivilFields {
            year: civil.year(),
            month: civil.month(),
            day: civil.day(),
            hour: civil.hour(),
            minute: civil.minute(),
            second: civil.second(),
            millisecond: civil.nanosecond() / 1_000_000,
        };
        render(&fields, &self.label, template)
    }

    /// Canonical no-milliseconds form, e.g. `1970-01-01T09:00:00+09:00`.
    pub fn to_iso8601(&self) -> String {
        self.format(TEMPLATE_NO_MILLIS)
    }

    // ── Clock override ──────────────────────────────────────────────────

    /// Override the process-wide clock for `now`-based construction.
    ///
    /// The skew becomes (instant of constructing `source`) − (real now) and
    /// applies to every subsequent no-source construction until
    /// [`reset_clock`](Self::reset_clock). Deliberately global: it exists
    /// to make `now` deterministic in tests.
    pub fn set_clock(source: impl Into<Source>) -> Result<()> {
        let (instant, _) = resolve::resolve(source.into(), None)?;
        resolve::set_clock_skew_ms(instant - resolve::real_now_ms());
        Ok(())
    }

    /// Zero the clock-skew override.
    pub fn reset_clock() {
        resolve::set_clock_skew_ms(0);
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl PartialEq for Moment {
    fn eq(&self, other: &Self) -> bool {
        self.instant_ms == other.instant_ms
    }
}

impl Eq for Moment {}

impl PartialOrd for Moment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Moment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.instant_ms.cmp(&other.instant_ms)
    }
}
