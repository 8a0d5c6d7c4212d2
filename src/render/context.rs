use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::{FbfError, FbfResult};

/// How to build a [`RenderContext`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderContextOpts {
    /// Load the platform's installed fonts.
    pub load_system_fonts: bool,
    /// Extra directories scanned (non-recursively) for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
    /// Base directory for relative `href`s to images and fonts.
    pub resources_dir: Option<PathBuf>,
}

impl Default for RenderContextOpts {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
            resources_dir: None,
        }
    }
}

/// Font database and SVG parsing options shared by every render call.
///
/// Built once by the host and passed by reference; nothing here is process-global.
pub struct RenderContext {
    options: usvg::Options<'static>,
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("fonts", &self.options.fontdb.len())
            .field("resources_dir", &self.options.resources_dir)
            .finish()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(&RenderContextOpts::default())
    }
}

impl RenderContext {
    /// Build the font database and parsing options.
    #[tracing::instrument(skip(opts))]
    pub fn new(opts: &RenderContextOpts) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if opts.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &opts.font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        if let Some(dir) = &opts.resources_dir {
            load_fonts_from_dir(&mut db, &dir.join("fonts"));
        }
        tracing::debug!(fonts = db.len(), "render context font database ready");

        let options = usvg::Options {
            resources_dir: opts.resources_dir.clone(),
            fontdb: Arc::new(db),
            ..Default::default()
        };
        Self { options }
    }

    /// Parsing options handed to `usvg`.
    pub fn usvg_options(&self) -> &usvg::Options<'static> {
        &self.options
    }

    /// Number of font faces available to text rendering.
    pub fn font_count(&self) -> usize {
        self.options.fontdb.len()
    }

    /// Parse markup into a render tree.
    pub fn parse(&self, markup: &str) -> FbfResult<usvg::Tree> {
        usvg::Tree::from_str(markup, &self.options)
            .context("parse svg tree")
            .map_err(|e| FbfError::render(format!("{e:#}")))
    }

    /// Logical canvas size of `markup`.
    pub fn canvas_of(&self, markup: &str) -> FbfResult<Canvas> {
        let tree = self.parse(markup)?;
        Ok(canvas_of_tree(&tree))
    }
}

pub(crate) fn canvas_of_tree(tree: &usvg::Tree) -> Canvas {
    let size = tree.size();
    Canvas {
        width: size.width(),
        height: size.height(),
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_font = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
        if is_font && let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %err, "skipping unreadable font");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/context.rs"]
mod tests;
