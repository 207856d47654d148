//! # Ink Calendar Core Library
//!
//! This library turns calendar events, weather and battery status into the two
//! 1-bit planes (black ink and red ink) a bichromatic e-ink panel consumes.
//!
//! ## Render Pipeline
//!
//! Each stage only depends on the stages before it:
//!
//! 1. **Layout** ([`layout`]): bucket events into a 6×7 month grid and emit
//!    markup fragments keyed by template placeholder
//! 2. **Template** ([`template`]): substitute the fragments into the page
//!    template, blanking any placeholder that has no fragment
//! 3. **Composite** ([`compositor`]): screenshot the page with a headless
//!    browser at the exact panel resolution
//! 4. **Separate** ([`planes`]): split the capture into black-ink and red-ink
//!    images by pixel color
//! 5. **Transform** ([`transform`]): rotate each plane for the panel's mounting
//!    orientation and threshold it to 1 bit
//!
//! [`pipeline::Pipeline`] runs the whole pass. Nothing is cached between
//! passes: every pass owns its temporary page file and raster buffers.
//!
//! ## Core Types
//!
//! - [`CalendarEvent`]: one event as delivered by the calendar collaborator
//! - [`RenderRequest`]: everything a single pass needs
//! - [`weather::WeatherSnapshot`]: provider-independent weather readings

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod compositor;
pub mod config;
pub mod error;
pub mod glyphs;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod planes;
pub mod template;
pub mod transform;
pub mod weather;

pub use config::{BatteryDisplayMode, Config, DisplayConfig};
pub use error::{RenderError, Result};
pub use weather::WeatherSnapshot;

/// Number of day cells in the six-week grid.
pub const GRID_CELLS: usize = 6 * 7;

/// A single calendar event.
///
/// Times are local wall-clock times; the calendar collaborator is expected to
/// have converted them already.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use ink_calendar_lib::CalendarEvent;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(9, 30, 0).unwrap();
/// let event = CalendarEvent::timed("Dentist", start, start + chrono::Duration::hours(1));
/// assert!(!event.all_day);
/// assert!(!event.is_multiday);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub is_multiday: bool,
    /// Recently changed; drawn in red ink
    #[serde(default)]
    pub is_updated: bool,
}

impl CalendarEvent {
    pub fn timed(summary: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            summary: summary.to_string(),
            start_datetime: start,
            end_datetime: end,
            all_day: false,
            is_multiday: start.date() != end.date(),
            is_updated: false,
        }
    }

    /// All-day event covering `start..=end`.
    pub fn all_day(summary: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            summary: summary.to_string(),
            start_datetime: start.and_time(chrono::NaiveTime::MIN),
            end_datetime: end.and_time(chrono::NaiveTime::MIN),
            all_day: true,
            is_multiday: start != end,
            is_updated: false,
        }
    }
}

/// Everything one render pass needs.
///
/// The calendar section of the configuration travels with the request so the
/// layout stage never reads configuration on its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Required; an empty list is a month without events
    pub events: Vec<CalendarEvent>,
    /// First visible day; may precede the first of the month
    pub calendar_start_date: NaiveDate,
    pub today: NaiveDate,
    /// Charge in percent; `None` when no reading is available
    #[serde(default)]
    pub battery_level: Option<u8>,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    /// Shown in the page footer
    #[serde(default)]
    pub last_refresh: Option<NaiveDateTime>,
    #[serde(default)]
    pub config: DisplayConfig,
}

impl RenderRequest {
    /// Aligned grid start for `today`: the last `week_start_day` on or before
    /// the first of the month.
    pub fn grid_start_for(today: NaiveDate, week_start_day: u32) -> NaiveDate {
        let first = today.with_day(1).unwrap_or(today);
        let offset = (first.weekday().num_days_from_monday() + 7 - week_start_day % 7) % 7;
        first - Duration::days(offset as i64)
    }

    /// Date shown in grid cell `index`.
    pub fn cell_date(&self, index: usize) -> NaiveDate {
        self.calendar_start_date + Duration::days(index as i64)
    }

    /// Check the request before anything is rendered.
    ///
    /// Calendar-critical fields must be well formed; battery and weather are
    /// left to degrade gracefully.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        let start = self.calendar_start_date;
        let week_start = self.config.week_start_day;
        if start.weekday().num_days_from_monday() != week_start {
            return Err(RenderError::data(format!(
                "calendar start {} does not fall on week start day {}",
                start, week_start
            )));
        }

        let month_start = self
            .today
            .with_day(1)
            .ok_or_else(|| RenderError::data("today has no first of month"))?;
        if start > month_start {
            return Err(RenderError::data(format!(
                "calendar start {} is after month start {}",
                start, month_start
            )));
        }

        let month_end = next_month_start(month_start) - Duration::days(1);
        let grid_end = self.cell_date(GRID_CELLS - 1);
        if grid_end < month_end {
            return Err(RenderError::data(format!(
                "grid from {} ends {} before month end {}",
                start, grid_end, month_end
            )));
        }

        for event in &self.events {
            if event.end_datetime < event.start_datetime {
                return Err(RenderError::data(format!(
                    "event '{}' ends before it starts",
                    event.summary
                )));
            }
        }

        Ok(())
    }
}

fn next_month_start(month_start: NaiveDate) -> NaiveDate {
    let (year, month) = if month_start.month() == 12 {
        (month_start.year() + 1, 1)
    } else {
        (month_start.year(), month_start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(month_start + Duration::days(31))
}
