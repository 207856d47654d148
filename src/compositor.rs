//! # Headless Browser Compositing
//!
//! The populated page is rendered by an external headless browser and
//! captured at exactly the panel resolution. The browser is treated as an
//! unreliable collaborator:
//!
//! - **Isolation**: each capture gets its own temporary directory holding the
//!   page and the screenshot, removed when the capture finishes
//! - **Timeout**: the child process runs under a hard wall-clock budget and
//!   is killed when the budget runs out
//! - **Verification**: the screenshot must decode and match the requested
//!   size exactly; nothing is cropped or scaled to make it fit
//!
//! No retries happen here. A caller that wants to retry a timeout can check
//! [`RenderError::is_transient`].

use crate::config::EngineConfig;
use crate::error::{RenderError, Result};
use crate::logging::Logger;
use image::{GenericImageView, RgbImage};
use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Screenshots pages with a headless browser.
pub struct Compositor {
    engine: EngineConfig,
    timeout: Duration,
    logger: Logger,
}

impl Compositor {
    pub fn new(engine: EngineConfig, logger: Logger) -> Self {
        let timeout = engine.timeout();
        Self {
            engine,
            timeout,
            logger,
        }
    }

    /// Override the configured wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Browser arguments for one capture: configured extra args first, then
    /// the capture flags, then the page URL.
    pub fn engine_args(&self, page: &Path, capture: &Path, width: u32, height: u32) -> Vec<String> {
        let mut args = self.engine.extra_args.clone();
        args.extend([
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            "--force-device-scale-factor=1".to_string(),
            "--allow-file-access-from-files".to_string(),
            format!("--window-size={},{}", width, height),
            format!("--virtual-time-budget={}", self.engine.settle_delay_ms),
            format!("--screenshot={}", capture.display()),
            format!("file://{}", page.display()),
        ]);
        args
    }

    /// Render `page` at exactly `width × height` and return the capture.
    pub async fn composite(&self, page: &str, width: u32, height: u32) -> Result<RgbImage> {
        let workdir = tempfile::Builder::new()
            .prefix("ink-calendar-")
            .tempdir()?;
        let page_path = workdir.path().join("calendar.html");
        let capture_path = workdir.path().join("capture.png");
        fs::write(&page_path, page)?;

        let args = self.engine_args(&page_path, &capture_path, width, height);
        self.logger.debug(format_args!(
            "running {} {}",
            self.engine.program,
            args.join(" ")
        ));

        let child = Command::new(&self.engine.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::RenderEngineFailure {
                status: "not started".to_string(),
                stderr: format!("{}: {}", self.engine.program, e),
            })?;

        // Dropping the pending wait on timeout drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                self.logger.warn(format_args!(
                    "render engine exceeded {:?}, killed",
                    self.timeout
                ));
                return Err(RenderError::RenderTimeout(self.timeout));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(RenderError::RenderEngineFailure {
                status: output.status.to_string(),
                stderr,
            });
        }

        let capture = image::open(&capture_path).map_err(|e| RenderError::RenderEngineFailure {
            status: output.status.to_string(),
            stderr: format!("no usable capture ({}): {}", e, stderr),
        })?;

        let actual = capture.dimensions();
        if actual != (width, height) {
            return Err(RenderError::GeometryMismatch {
                expected: (width, height),
                actual,
            });
        }

        self.logger.info(format_args!(
            "screenshot captured at {}x{}",
            width, height
        ));
        Ok(capture.to_rgb8())
    }
}
