//! # Month Grid Layout
//!
//! The layout stage maps a [`RenderRequest`] onto the fixed 6×7 grid and
//! produces the markup fragments the page template expects.
//!
//! ## Grid Bucketing
//! Cell `i` shows `calendar_start_date + i` days. An event lands in the cell
//! of its start date. A multiday event is placed a second time in the cell of
//! its end date; intermediate days stay empty so the grid never fills up
//! with long vacations. Dates outside the 42 visible days are dropped.
//!
//! ## Fragments
//! | Placeholder      | Content                                      |
//! |------------------|----------------------------------------------|
//! | `month`          | month title for `today`                      |
//! | `battText`       | battery icon CSS class                       |
//! | `dayOfWeek`      | weekday header `<li>` row                    |
//! | `events`         | six `<ol>` week rows of day cells            |
//! | `weather`        | weather block, empty without a snapshot      |
//! | `lastUpdateTime` | short time of the last data refresh          |
//! | `precipitation`  | JSON hourly series, only when available      |

use crate::config::{BatteryDisplayMode, DisplayConfig};
use crate::error::Result;
use crate::glyphs;
use crate::logging::Logger;
use crate::template::{escape_html, Fragments};
use crate::{CalendarEvent, RenderRequest, GRID_CELLS};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt::Write;

/// Template placeholder names produced by the layout stage.
pub mod placeholder {
    pub const MONTH: &str = "month";
    pub const BATTERY: &str = "battText";
    pub const DAY_OF_WEEK: &str = "dayOfWeek";
    pub const EVENTS: &str = "events";
    pub const WEATHER: &str = "weather";
    pub const LAST_UPDATE: &str = "lastUpdateTime";
    pub const PRECIPITATION: &str = "precipitation";
}

/// One of the 42 day slots.
#[derive(Clone, Debug)]
pub struct GridCell {
    pub index: usize,
    pub date: NaiveDate,
    /// Events assigned to this day, in request order
    pub events: Vec<CalendarEvent>,
}

/// Result of one layout pass.
#[derive(Clone, Debug)]
pub struct GridMarkup {
    pub cells: Vec<GridCell>,
    pub fragments: Fragments,
}

/// Builds grid markup from render requests.
pub struct LayoutBuilder {
    logger: Logger,
}

/// Battery icon class for a display mode and charge level.
pub fn battery_class(mode: BatteryDisplayMode, level: u8) -> &'static str {
    match mode {
        BatteryDisplayMode::Hidden => "batteryHide",
        BatteryDisplayMode::Always => match level {
            80..=u8::MAX => "battery80",
            60..=79 => "battery60",
            40..=59 => "battery40",
            20..=39 => "battery20",
            _ => "battery0",
        },
        BatteryDisplayMode::LowOnly if level < 20 => "battery0",
        BatteryDisplayMode::LowOnly => "batteryHide",
    }
}

/// Compact time label: `14:05` on a 24-hour clock, `2.05pm` otherwise.
pub fn short_time(time: NaiveDateTime, use_24_hour_clock: bool) -> String {
    let (hour, minute) = (time.hour(), time.minute());
    if use_24_hour_clock {
        return format!("{}:{:02}", hour, minute);
    }

    let minutes = if minute > 0 {
        format!(".{:02}", minute)
    } else {
        String::new()
    };
    match hour {
        0 => format!("12{}am", minutes),
        12 => format!("12{}pm", minutes),
        h if h > 12 => format!("{}{}pm", h % 12, minutes),
        h => format!("{}{}am", h, minutes),
    }
}

/// Whole days from `start` to `date` (negative when `date` is earlier).
pub fn days_between(start: NaiveDate, date: NaiveDate) -> i64 {
    (date - start).num_days()
}

impl LayoutBuilder {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Lay out `request`; fails with a data error before producing any markup.
    pub fn build(&self, request: &RenderRequest) -> Result<GridMarkup> {
        request.validate()?;
        let config = &request.config;

        let cells = self.bucket_events(request);
        let placed: usize = cells.iter().map(|c| c.events.len()).sum();
        self.logger.debug(format_args!(
            "placed {} event entries from {} events into {} cells",
            placed,
            request.events.len(),
            cells.len()
        ));

        let mut fragments = Fragments::new();
        fragments.insert(
            placeholder::MONTH,
            config.month_labels[request.today.month0() as usize].clone(),
        );
        let battery = match request.battery_level {
            Some(level) => battery_class(config.battery_display_mode, level.min(100)),
            None => {
                self.logger.info(format_args!("no battery reading, battery icon hidden"));
                "batteryHide"
            }
        };
        fragments.insert(placeholder::BATTERY, battery);
        fragments.insert(placeholder::DAY_OF_WEEK, self.weekday_header(config));
        fragments.insert(placeholder::EVENTS, self.events_markup(&cells, request));

        let weather = request
            .weather
            .as_ref()
            .map(|w| w.to_markup())
            .unwrap_or_default();
        if weather.is_empty() {
            self.logger.info(format_args!("no weather snapshot, weather block left empty"));
        }
        fragments.insert(placeholder::WEATHER, weather);

        if let Some(series) = request.weather.as_ref().and_then(|w| w.precipitation_series()) {
            fragments.insert(placeholder::PRECIPITATION, series);
        }
        if let Some(refreshed) = request.last_refresh {
            fragments.insert(
                placeholder::LAST_UPDATE,
                short_time(refreshed, config.use_24_hour_clock),
            );
        }

        self.logger.info(format_args!("layout generated"));
        Ok(GridMarkup { cells, fragments })
    }

    fn bucket_events(&self, request: &RenderRequest) -> Vec<GridCell> {
        let mut cells: Vec<GridCell> = (0..GRID_CELLS)
            .map(|index| GridCell {
                index,
                date: request.cell_date(index),
                events: Vec::new(),
            })
            .collect();

        let slot = |date: NaiveDate| {
            let idx = days_between(request.calendar_start_date, date);
            (0..GRID_CELLS as i64).contains(&idx).then_some(idx as usize)
        };

        for event in &request.events {
            let start = slot(event.start_datetime.date());
            if let Some(idx) = start {
                cells[idx].events.push(event.clone());
            }
            if event.is_multiday {
                let end = slot(event.end_datetime.date());
                if let Some(idx) = end.filter(|idx| Some(*idx) != start) {
                    cells[idx].events.push(event.clone());
                }
            }
        }
        cells
    }

    fn weekday_header(&self, config: &DisplayConfig) -> String {
        (0..7)
            .map(|i| {
                format!(
                    "<li class=\"font-weight-bold text-uppercase\">{}</li>\n",
                    config.day_of_week_labels[(i + config.week_start_day as usize) % 7]
                )
            })
            .collect()
    }

    fn events_markup(&self, cells: &[GridCell], request: &RenderRequest) -> String {
        let mut html = String::new();
        for week in cells.chunks(7) {
            html.push_str("<ol class=\"days list-unstyled\">\n");
            for cell in week {
                html.push_str(&self.cell_markup(cell, request));
            }
            html.push_str("</ol>\n");
        }
        html
    }

    fn cell_markup(&self, cell: &GridCell, request: &RenderRequest) -> String {
        let config = &request.config;
        let in_month = cell.date.month() == request.today.month();
        let mut html = String::new();

        let date_class = if cell.date == request.today {
            "datecircle"
        } else if !in_month {
            "date text-muted"
        } else {
            "date"
        };
        let _ = writeln!(html, "<li><div class=\"{}\">{}</div>", date_class, cell.date.day());

        let max = config.max_events_per_day as usize;
        for event in cell.events.iter().take(max) {
            let mut class = String::from("event");
            if event.is_updated {
                class.push_str(" text-danger");
            } else if !in_month {
                class.push_str(" text-muted");
            }
            let _ = writeln!(
                html,
                "<div class=\"{}\">{}</div>",
                class,
                self.event_body(event, cell.date, config)
            );
        }

        let hidden = cell.events.len().saturating_sub(max);
        if hidden > 0 {
            let _ = writeln!(html, "<div class=\"event text-muted\">{} more</div>", hidden);
        }

        html.push_str("</li>\n");
        html
    }

    fn event_body(&self, event: &CalendarEvent, date: NaiveDate, config: &DisplayConfig) -> String {
        let summary = glyphs::apply_glyph_rules(&event.summary, &config.glyph_rules);

        if event.is_multiday {
            let arrow = if event.start_datetime.date() == date {
                '►'
            } else {
                '◄'
            };
            return format!("{}{}", arrow, escape_html(&summary));
        }

        if event.all_day {
            return match glyphs::find_category(&summary, &config.all_day_categories) {
                Some(category) => format!(" {}", escape_html(&category.decorate(&summary))),
                None => format!(" - {}", escape_html(&summary)),
            };
        }

        format!(
            "<div> - {} {}</div>",
            short_time(event.start_datetime, config.use_24_hour_clock),
            escape_html(&summary)
        )
    }
}
