//! # End-to-End Render Scenarios
//!
//! These tests drive the library the way the binary does: a request and a
//! config go in, a page or a pair of planes comes out. Compositing runs
//! against a shell-script stand-in for the browser so no real browser is
//! required.

use chrono::NaiveDate;
use ink_calendar_lib::config::{BatteryDisplayMode, Config};
use ink_calendar_lib::layout::{placeholder, LayoutBuilder};
use ink_calendar_lib::logging::Logger;
use ink_calendar_lib::pipeline::Pipeline;
use ink_calendar_lib::template::Template;
use ink_calendar_lib::{CalendarEvent, RenderRequest};

const DEMO_REQUEST: &str = include_str!("../../demos/request.json");

fn logger() -> Logger {
    Logger::global("ink_calendar::tests")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Markup of the `<li>` holding the in-month day label `day`.
fn day_cell(events_html: &str, day: u32) -> String {
    let label = format!("<div class=\"date\">{}</div>", day);
    events_html
        .split("<li>")
        .find(|cell| cell.contains(&label))
        .unwrap_or_else(|| panic!("no cell for day {}", day))
        .to_string()
}

/// Monday-start grid for May 2024, one event on the 10th, battery at 45%.
#[test]
fn single_event_month_scenario() {
    let today = date(2024, 5, 20);
    let start = RenderRequest::grid_start_for(today, 0);
    assert_eq!(start, date(2024, 4, 29)); // Monday on/before May 1st

    let tenth = date(2024, 5, 10);
    let mut request = RenderRequest {
        events: vec![CalendarEvent::timed(
            "Quarterly review",
            tenth.and_hms_opt(11, 0, 0).unwrap(),
            tenth.and_hms_opt(12, 0, 0).unwrap(),
        )],
        calendar_start_date: start,
        today,
        battery_level: Some(45),
        weather: None,
        last_refresh: None,
        config: Config::default().calendar,
    };
    request.config.week_start_day = 0;
    request.config.max_events_per_day = 3;
    request.config.battery_display_mode = BatteryDisplayMode::Always;

    let grid = LayoutBuilder::new(logger()).build(&request).unwrap();

    let with_events: Vec<_> = grid.cells.iter().filter(|c| !c.events.is_empty()).collect();
    assert_eq!(with_events.len(), 1);
    assert_eq!(with_events[0].date, tenth);
    assert_eq!(with_events[0].index, 11);

    let events_html = grid.fragments.get(placeholder::EVENTS).unwrap();
    let cell = day_cell(events_html, 10);
    assert_eq!(cell.matches("class=\"event").count(), 1);
    assert!(cell.contains("11am Quarterly review"));
    assert!(!events_html.contains(" more</div>"));

    assert_eq!(grid.fragments.get(placeholder::BATTERY), Some("battery40"));
    assert_eq!(grid.fragments.get(placeholder::MONTH), Some("May"));
}

#[test]
fn demo_request_renders_complete_page() {
    let mut request: RenderRequest = serde_json::from_str(DEMO_REQUEST).unwrap();
    let config = Config::default();
    request.config = config.calendar.clone();

    let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();
    let page = pipeline.render_page(&request).unwrap();

    assert!(page.contains("<div class=\"month\">March</div>"));
    assert!(page.contains("<div class=\"updated\">6.30am</div>"));
    assert!(page.contains("battery40"));
    assert!(page.contains("<div class=\"datecircle\">15</div>"));
    assert!(page.contains("🎾 con Ana"));
    assert!(page.contains("text-danger"));
    assert!(page.contains(" 🎁 Ana"));
    assert!(page.contains("►Vacaciones Semana Santa"));
    assert!(page.contains("◄Vacaciones Semana Santa"));
    assert!(page.contains("<div class=\"city\">Navacerrada</div>"));
    assert!(page.contains("💧/❄️ 1 / 2mm"));
    assert!(page.contains("var series = [[[0.0,"));

    for name in ["$month", "${battText}", "$dayOfWeek", "$events", "$weather", "${precipitation}"] {
        assert!(!page.contains(name), "unresolved placeholder {}", name);
    }
}

#[test]
fn page_without_weather_degrades_cleanly() {
    let mut request: RenderRequest = serde_json::from_str(DEMO_REQUEST).unwrap();
    request.weather = None;
    request.last_refresh = None;
    let config = Config::default();
    request.config = config.calendar.clone();

    let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();
    let page = pipeline.render_page(&request).unwrap();

    assert!(!page.contains("<div class=\"weather_container\">"));
    assert!(!page.contains("class=\"city\""));
    assert!(page.contains("var series = [][0] || [];"));
    assert!(page.contains("<div class=\"updated\"></div>"));
}

#[test]
fn page_generation_is_deterministic() {
    let mut request: RenderRequest = serde_json::from_str(DEMO_REQUEST).unwrap();
    let config = Config::default();
    request.config = config.calendar.clone();

    let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();
    let first = pipeline.render_page(&request).unwrap();
    let second = pipeline.render_page(&request).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn sample_config_loads_as_written() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("calendar-config.toml");
    std::fs::write(&path, include_str!("../../calendar-config.toml")).unwrap();

    let config = Config::load_from_path(&path, &logger()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.calendar.month_labels[2], "Marzo");
    assert!(config.calendar.use_24_hour_clock);
}

#[test]
fn malformed_config_is_an_error_not_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("calendar-config.toml");
    let sample = include_str!("../../calendar-config.toml");
    let broken = sample.replace("week_start_day = 0", "week_start_day = \"monday\"");
    std::fs::write(&path, broken).unwrap();

    assert!(matches!(
        Config::load_from_path(&path, &logger()),
        Err(ink_calendar_lib::RenderError::Data(_))
    ));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = Config::default();
    config.calendar.month_labels.truncate(11);
    assert!(Pipeline::new(&config, Template::builtin(), logger()).is_err());
}

#[cfg(unix)]
mod with_fake_browser {
    use super::*;
    use image::{Rgb, RgbImage};
    use ink_calendar_lib::compositor::Compositor;
    use ink_calendar_lib::config::EngineConfig;
    use ink_calendar_lib::RenderError;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    const WIDTH: u32 = 40;
    const HEIGHT: u32 = 20;

    /// Left quarter black, a red bar across the top right, the rest white.
    fn write_capture(path: &Path) {
        let img = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
            if x < 10 {
                Rgb([0, 0, 0])
            } else if y < 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        img.save(path).unwrap();
    }

    fn engine(dir: &TempDir, body: &str) -> EngineConfig {
        let script = dir.path().join("browser.sh");
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        EngineConfig {
            program: "sh".to_string(),
            timeout_secs: 10,
            settle_delay_ms: 0,
            extra_args: vec![script.display().to_string()],
        }
    }

    fn copying_engine(dir: &TempDir) -> EngineConfig {
        let fixture = dir.path().join("capture-fixture.png");
        write_capture(&fixture);
        engine(
            dir,
            &format!(
                r#"for arg in "$@"; do
  case "$arg" in
    --screenshot=*) out="${{arg#--screenshot=}}" ;;
  esac
done
cp "{}" "$out""#,
                fixture.display()
            ),
        )
    }

    fn config(dir: &TempDir, rotation: i32) -> Config {
        let mut config = Config::default();
        config.display.width = WIDTH;
        config.display.height = HEIGHT;
        config.display.rotation = rotation;
        config.engine = copying_engine(dir);
        config
    }

    fn demo_request(config: &Config) -> RenderRequest {
        let mut request: RenderRequest = serde_json::from_str(DEMO_REQUEST).unwrap();
        request.config = config.calendar.clone();
        request
    }

    #[tokio::test]
    async fn full_pass_produces_rotated_planes() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, 90);
        let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();

        let planes = pipeline.render(&demo_request(&config)).await.unwrap();
        assert_eq!(planes.black.dimensions(), (HEIGHT, WIDTH));
        assert_eq!(planes.red.dimensions(), (HEIGHT, WIDTH));
        assert_eq!(planes.black.ink_count(), (10 * HEIGHT) as usize);
        assert_eq!(planes.red.ink_count(), (2 * (WIDTH - 10)) as usize);

        // Rotated 90° counter-clockwise: the black left strip becomes the bottom rows
        assert!(planes.black.is_ink(0, WIDTH - 1));
        assert!(!planes.black.is_ink(0, 0));
        for y in 0..WIDTH {
            for x in 0..HEIGHT {
                assert!(!(planes.black.is_ink(x, y) && planes.red.is_ink(x, y)));
            }
        }
    }

    #[tokio::test]
    async fn planes_are_saved_for_the_panel_driver() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, 0);
        let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();

        let planes = pipeline.render(&demo_request(&config)).await.unwrap();
        let out = dir.path().join("out");
        let saved = planes.save(&out).unwrap();

        let black = image::open(&saved.black_png).unwrap().to_luma8();
        assert_eq!(black.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(black.get_pixel(0, 0).0, [0]);
        assert_eq!(black.get_pixel(WIDTH - 1, HEIGHT - 1).0, [255]);

        let expected_len = (WIDTH.div_ceil(8) * HEIGHT) as usize;
        assert_eq!(fs::read(&saved.black_bin).unwrap().len(), expected_len);
        assert_eq!(fs::read(&saved.red_bin).unwrap().len(), expected_len);
    }

    #[tokio::test]
    async fn back_to_back_passes_are_independent() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, 0);
        let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();
        let request = demo_request(&config);

        let first = pipeline.render(&request).await.unwrap();
        let second = pipeline.render(&request).await.unwrap();
        assert_eq!(first.black, second.black);
        assert_eq!(first.red, second.red);
    }

    #[tokio::test]
    async fn engine_timeout_reaches_the_caller() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, 0);
        config.engine = engine(&dir, "exec sleep 30");
        let compositor = Compositor::new(config.engine.clone(), logger())
            .with_timeout(Duration::from_millis(300));
        let pipeline = Pipeline::new(&config, Template::builtin(), logger())
            .unwrap()
            .with_compositor(compositor);

        match pipeline.render(&demo_request(&config)).await {
            Err(err @ RenderError::RenderTimeout(_)) => assert!(err.is_transient()),
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn bad_request_never_launches_the_browser() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("launched");
        let mut config = config(&dir, 0);
        config.engine = engine(&dir, &format!("touch \"{}\"", marker.display()));
        let pipeline = Pipeline::new(&config, Template::builtin(), logger()).unwrap();

        let mut request = demo_request(&config);
        request.calendar_start_date = date(2024, 2, 27); // not a Monday
        assert!(matches!(
            pipeline.render(&request).await,
            Err(RenderError::Data(_))
        ));
        assert!(!marker.exists());
    }
}
