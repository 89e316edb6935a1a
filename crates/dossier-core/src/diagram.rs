//! Staleness-aware caching of rendered diagrams.
//!
//! A diagram source `x.mmd` renders to the sibling `x.svg`. The image is
//! fresh when it exists and its mtime is not older than the source's; only a
//! stale or missing image invokes the renderer.

use crate::error::{Result, SiteError};
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// Converts one diagram source into a vector image at `output`.
pub trait DiagramRenderer {
    fn render(&self, source: &Path, output: &Path) -> Result<()>;
}

/// Sibling image path for a diagram source.
pub fn image_path(source: &Path) -> PathBuf {
    source.with_extension("svg")
}

/// `image` is fresh when it exists and is not older than `source`.
pub fn is_fresh(source: &Path, image: &Path) -> bool {
    match (crate::io::modified(source), crate::io::modified(image)) {
        (Some(src), Some(img)) => img >= src,
        _ => false,
    }
}

pub struct DiagramCache<'a> {
    renderer: &'a dyn DiagramRenderer,
    hits: Cell<usize>,
    renders: Cell<usize>,
}

impl<'a> DiagramCache<'a> {
    pub fn new(renderer: &'a dyn DiagramRenderer) -> Self {
        Self {
            renderer,
            hits: Cell::new(0),
            renders: Cell::new(0),
        }
    }

    /// Return the image for `source`, rendering it first when stale.
    ///
    /// A renderer failure is fatal: the source exists and was asked for.
    pub fn ensure_rendered(&self, source: &Path) -> Result<PathBuf> {
        let image = image_path(source);
        if is_fresh(source, &image) {
            tracing::debug!(source = %source.display(), "diagram cache hit");
            self.hits.set(self.hits.get() + 1);
            return Ok(image);
        }

        tracing::info!(source = %source.display(), "rendering diagram");
        self.renderer
            .render(source, &image)
            .map_err(|e| match e {
                SiteError::DiagramRender { .. } => e,
                other => SiteError::DiagramRender {
                    source_path: source.to_path_buf(),
                    detail: other.to_string(),
                },
            })?;
        if !image.is_file() {
            return Err(SiteError::DiagramRender {
                source_path: source.to_path_buf(),
                detail: format!("renderer reported success but {} is missing", image.display()),
            });
        }
        self.renders.set(self.renders.get() + 1);
        Ok(image)
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn renders(&self) -> usize {
        self.renders.get()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
