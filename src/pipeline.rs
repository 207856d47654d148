//! # Render Pass
//!
//! Wires the stages together for one request:
//!
//! ```text
//! RenderRequest → layout → template → compositor → planes → transform → (black, red)
//! ```
//!
//! A [`Pipeline`] holds configuration and stage objects only; every call to
//! [`Pipeline::render`] allocates its own page file and buffers, so passes can
//! run back to back without any cleanup in between.

use crate::compositor::Compositor;
use crate::config::Config;
use crate::error::Result;
use crate::layout::LayoutBuilder;
use crate::logging::Logger;
use crate::planes::PlaneSeparator;
use crate::template::{Template, TemplateRenderer};
use crate::transform::{Bitmap, Transformer};
use crate::RenderRequest;
use std::fs;
use std::path::{Path, PathBuf};

/// Final planes of one pass, already rotated for the panel.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub black: Bitmap,
    pub red: Bitmap,
}

/// Files written by [`RenderOutput::save`].
#[derive(Clone, Debug)]
pub struct SavedPlanes {
    pub black_png: PathBuf,
    pub red_png: PathBuf,
    pub black_bin: PathBuf,
    pub red_bin: PathBuf,
}

impl RenderOutput {
    /// Write `black.png`, `red.png` and the packed `black.bin`, `red.bin`.
    pub fn save(&self, dir: &Path) -> Result<SavedPlanes> {
        fs::create_dir_all(dir)?;
        let saved = SavedPlanes {
            black_png: dir.join("black.png"),
            red_png: dir.join("red.png"),
            black_bin: dir.join("black.bin"),
            red_bin: dir.join("red.bin"),
        };
        self.black.to_gray_image().save(&saved.black_png)?;
        self.red.to_gray_image().save(&saved.red_png)?;
        fs::write(&saved.black_bin, self.black.as_bytes())?;
        fs::write(&saved.red_bin, self.red.as_bytes())?;
        Ok(saved)
    }
}

/// One configured render pipeline.
pub struct Pipeline {
    width: u32,
    height: u32,
    template: Template,
    layout: LayoutBuilder,
    renderer: TemplateRenderer,
    compositor: Compositor,
    separator: PlaneSeparator,
    transformer: Transformer,
    logger: Logger,
}

impl Pipeline {
    /// Validate `config` and build every stage, each with its own log target.
    pub fn new(config: &Config, template: Template, logger: Logger) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            width: config.display.width,
            height: config.display.height,
            template,
            layout: LayoutBuilder::new(logger.child("ink_calendar::layout")),
            renderer: TemplateRenderer::new(),
            compositor: Compositor::new(
                config.engine.clone(),
                logger.child("ink_calendar::compositor"),
            ),
            separator: PlaneSeparator::new(logger.child("ink_calendar::planes")),
            transformer: Transformer::new(
                config.display.rotation,
                config.display.threshold,
                logger.child("ink_calendar::transform"),
            )?,
            logger,
        })
    }

    /// Replace the compositor, e.g. to shorten its timeout.
    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Layout and template only: the page the browser would load.
    pub fn render_page(&self, request: &RenderRequest) -> Result<String> {
        let grid = self.layout.build(request)?;
        let page = self.renderer.render(&self.template, &grid.fragments);
        self.logger.info(format_args!("page generated ({} bytes)", page.len()));
        Ok(page)
    }

    /// Full pass: request in, two 1-bit planes out.
    pub async fn render(&self, request: &RenderRequest) -> Result<RenderOutput> {
        let page = self.render_page(request)?;
        let composite = self
            .compositor
            .composite(&page, self.width, self.height)
            .await?;
        let (black, red) = self.separator.separate(&composite);
        let output = RenderOutput {
            black: self.transformer.transform(&black)?,
            red: self.transformer.transform(&red)?,
        };
        self.logger.info(format_args!(
            "planes ready at {}x{}",
            output.black.width(),
            output.black.height()
        ));
        Ok(output)
    }
}
