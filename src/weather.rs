//! # Weather Snapshot and Weather Block Markup
//!
//! The weather collaborator (whatever provider it talks to) hands the render
//! pipeline a [`WeatherSnapshot`]. This shape is the only thing the layout
//! stage knows about weather, so provider response formats never leak into
//! the renderer.
//!
//! Precipitation annotations are chosen by [`PRECIPITATION_RULES`], an ordered
//! table: the first rule whose requirements hold wins.

use crate::template::escape_html;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Current and forecast readings for every configured location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub locations: Vec<LocationWeather>,
}

/// Readings for a single location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationWeather {
    pub city: String,
    /// Current temperature in °C
    pub current_temp: f32,
    pub days: Vec<DailyForecast>,
}

/// One forecast day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Short day name shown above the first location's forecast
    pub label: String,
    /// Provider icon code, e.g. `"10d"`
    pub icon: String,
    pub temp_max: f32,
    pub temp_min: f32,
    /// m/s
    #[serde(default)]
    pub wind_speed: Option<f32>,
    /// mm
    #[serde(default)]
    pub rain: Option<f32>,
    /// mm
    #[serde(default)]
    pub snow: Option<f32>,
    /// Hourly precipitation in mm, for the page chart
    #[serde(default)]
    pub hourly_precipitation: Vec<f32>,
}

/// Icon image URL prefix; `<icon>@2x.png` is appended.
pub const ICON_BASE_URL: &str = "http://openweathermap.org/img/wn/";

/// One row of the precipitation precedence table.
pub struct PrecipitationRule {
    pub needs_rain: bool,
    pub needs_snow: bool,
    pub render: fn(rain: f32, snow: f32) -> String,
}

/// Mutually exclusive precipitation annotations, highest precedence first.
pub const PRECIPITATION_RULES: &[PrecipitationRule] = &[
    PrecipitationRule {
        needs_rain: true,
        needs_snow: true,
        render: |rain, snow| {
            format!(
                "<div class=\"snow\">💧/❄️ {} / {}mm</div>\n",
                whole(rain),
                whole(snow)
            )
        },
    },
    PrecipitationRule {
        needs_rain: false,
        needs_snow: true,
        render: |_, snow| format!("<div>❄️ {}mm</div>\n", whole(snow)),
    },
    PrecipitationRule {
        needs_rain: true,
        needs_snow: false,
        render: |rain, _| format!("<div>💧 {}mm</div>\n", whole(rain)),
    },
    PrecipitationRule {
        needs_rain: false,
        needs_snow: false,
        render: |_, _| "<div class=\"no_rain\"></div>\n".to_string(),
    },
];

/// Rounded half to even for display, never printing `-0`.
fn whole(value: f32) -> f32 {
    value.round_ties_even() + 0.0
}

fn nonzero(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0)
}

impl DailyForecast {
    /// Annotation from the first matching precipitation rule.
    pub fn precipitation_markup(&self) -> String {
        let rain = nonzero(self.rain);
        let snow = nonzero(self.snow);
        PRECIPITATION_RULES
            .iter()
            .find(|r| (!r.needs_rain || rain.is_some()) && (!r.needs_snow || snow.is_some()))
            .map(|r| (r.render)(rain.unwrap_or(0.0), snow.unwrap_or(0.0)))
            .unwrap_or_default()
    }
}

impl WeatherSnapshot {
    /// Weather block for the page; empty for a snapshot without locations.
    pub fn to_markup(&self) -> String {
        let mut html = String::new();
        for (i, location) in self.locations.iter().enumerate() {
            html.push_str("<div class=\"weather_container\">\n");
            let _ = writeln!(
                html,
                "<div><div class=\"city\">{}</div><div class=\"now align-items-center\">{}°C</div></div>",
                escape_html(&location.city),
                whole(location.current_temp)
            );
            html.push_str("<div class=\"weather_days align-items-center\">");
            for day in &location.days {
                html.push_str("<div class=\"weather_day text-center\">\n");
                // Only the top row carries day names
                if i == 0 {
                    let _ = writeln!(
                        html,
                        "<p class=\"weather_day_name\">{}</p>",
                        escape_html(&day.label)
                    );
                }
                let _ = writeln!(
                    html,
                    "<img class=\"icon\" src=\"{}{}@2x.png\"></img>",
                    ICON_BASE_URL,
                    escape_html(&day.icon)
                );
                let _ = writeln!(
                    html,
                    "<div>{}°C / {}°C </div>",
                    whole(day.temp_max),
                    whole(day.temp_min)
                );
                if let Some(wind) = nonzero(day.wind_speed) {
                    let _ = writeln!(html, "<div>🍃 {}m/s</div>", whole(wind));
                }
                html.push_str(&day.precipitation_markup());
                html.push_str("</div>\n");
            }
            html.push_str("</div>\n</div>\n");
        }
        html
    }

    /// Hourly precipitation of the first location, one array per day, as JSON.
    /// `None` when no location carries hourly data.
    pub fn precipitation_series(&self) -> Option<String> {
        let first = self.locations.first()?;
        let series: Vec<&Vec<f32>> = first.days.iter().map(|d| &d.hourly_precipitation).collect();
        if series.iter().all(|s| s.is_empty()) {
            return None;
        }
        serde_json::to_string(&series).ok()
    }
}
