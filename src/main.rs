//! # Ink Calendar Application Entry Point
//!
//! Reads a render request (JSON produced by the calendar/weather collaborators),
//! runs one render pass and writes the black and red planes for the panel
//! driver. `--html-only` stops after the page is generated, which is handy for
//! tweaking the template in a desktop browser.
//!
//! ```text
//! ink-calendar <request.json> [--config <file>] [--output <dir>] [--html-only]
//! ```

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use ink_calendar_lib::config::{Config, CONFIG_FILE};
use ink_calendar_lib::logging::Logger;
use ink_calendar_lib::pipeline::Pipeline;
use ink_calendar_lib::template::Template;
use ink_calendar_lib::RenderRequest;
use log::{error, info};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Parsed command line.
#[derive(Debug, PartialEq)]
struct Args {
    request: PathBuf,
    config: PathBuf,
    output: Option<PathBuf>,
    html_only: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut request = None;
    let mut config = PathBuf::from(CONFIG_FILE);
    let mut output = None;
    let mut html_only = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = args.next().context("--config needs a path")?.into();
            }
            "--output" => {
                output = Some(args.next().context("--output needs a directory")?.into());
            }
            "--html-only" => html_only = true,
            flag if flag.starts_with("--") => bail!("unknown flag {}", flag),
            path => {
                if request.replace(PathBuf::from(path)).is_some() {
                    bail!("only one request file may be given");
                }
            }
        }
    }

    Ok(Args {
        request: request.context("usage: ink-calendar <request.json> [--config <file>] [--output <dir>] [--html-only]")?,
        config,
        output,
        html_only,
    })
}

fn run(args: Args) -> anyhow::Result<()> {
    let logger = Logger::global("ink_calendar");
    let config = Config::load_from_path(&args.config, &logger.child("ink_calendar::config"))
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let output_dir = args.output.unwrap_or_else(|| config.output.directory.clone());

    let raw = fs::read_to_string(&args.request)
        .with_context(|| format!("reading request {}", args.request.display()))?;
    let mut request: RenderRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing request {}", args.request.display()))?;
    // Layout settings always come from the config file
    request.config = config.calendar.clone();

    let template = Template::load(config.output.template.as_deref())
        .context("loading page template")?;
    let pipeline = Pipeline::new(&config, template, logger)?;

    if args.html_only {
        let page = pipeline.render_page(&request)?;
        fs::create_dir_all(&output_dir)?;
        let path = output_dir.join("calendar.html");
        fs::write(&path, page)?;
        info!("Page written to {}", path.display());
        return Ok(());
    }

    // Single-threaded runtime: the pipeline is strictly sequential
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let planes = rt.block_on(pipeline.render(&request))?;
    let saved = planes.save(&output_dir)?;
    info!(
        "Planes written: {} and {}",
        saved.black_png.display(),
        saved.red_png.display()
    );
    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(env::args().skip(1))?;
    if let Err(e) = run(args) {
        error!("Render failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
