//! # tzmoment
//!
//! Timezone-aware point-in-time values: one absolute instant (epoch
//! milliseconds), many civil views. A [`Moment`] pairs the instant with a
//! timezone label (a fixed offset such as `+09:00`, a UTC alias, or an
//! IANA `Area/Location` name), and every conversion, comparison, and
//! formatting operation keeps that single instant consistent across views.
//!
//! The offset sign convention is inverted relative to everyday notation
//! (`local = utc − offset`, so Asia/Tokyo is stored as `-540` and rendered
//! as `+09:00`); see [`offset`] for why that matters.
//!
//! ## Modules
//!
//! - [`moment`] — the public value type: getters, conversion, shift
//!   arithmetic, comparison, clock override
//! - [`resolve`] — construction-source resolution (epoch numbers, civil
//!   text, existing values, relative shifts, "now")
//! - [`offset`] — timezone notation ↔ signed offset minutes
//! - [`format`] — token-template rendering of civil fields
//! - [`shift`] — sparse relative-duration records and elapsed-time
//!   decomposition
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```
//! use tzmoment::{Moment, Shift};
//!
//! let epoch = Moment::with_timezone(0, "Asia/Tokyo")?;
//! assert_eq!(epoch.to_string(), "1970-01-01T09:00:00+09:00");
//!
//! let later = epoch.shift(Shift {
//!     days: Some(3),
//!     hours: Some(4),
//!     ..Default::default()
//! })?;
//! assert_eq!(later.epoch_millis(), 3 * 86_400_000 + 4 * 3_600_000);
//! assert!(later.is_after(&epoch)?);
//!
//! let gambier = later.to_timezone("Pacific/Gambier");
//! assert!(gambier.same_moment(&later));
//! # Ok::<(), tzmoment::MomentError>(())
//! ```

pub mod error;
pub mod format;
pub mod moment;
pub mod offset;
pub mod resolve;
pub mod shift;

pub use error::MomentError;
pub use format::{render, CivilFields, TEMPLATE_FULL, TEMPLATE_NO_MILLIS};
pub use moment::Moment;
pub use offset::{format_offset, resolve_offset};
pub use resolve::Source;
pub use shift::{clock_hm_to_seconds, clock_hms_to_seconds, Shift};
