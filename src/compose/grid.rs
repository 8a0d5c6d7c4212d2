use rayon::prelude::*;

use crate::compose::prefix::{extract_full_view_box, extract_svg_content, prefix_svg_ids};
use crate::foundation::error::{FbfError, FbfResult};
use crate::foundation::markup::escape_xml;

/// Size used for a cell whose own size is unknown.
const DEFAULT_CELL_SIZE: f32 = 100.0;

/// One document placed in the grid.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorCell {
    /// Complete SVG markup. Empty cells keep their slot but draw nothing.
    pub svg_content: String,
    /// Caption drawn below the cell when the grid reserves label space.
    pub label: String,
    /// Document width; `<= 0` falls back to 100.
    pub original_width: f32,
    /// Document height; `<= 0` falls back to 100.
    pub original_height: f32,
    /// Source `viewBox` origin and size. A zero size means `0 0 width height`.
    pub view_box: [f32; 4],
}

impl CompositorCell {
    /// Cell for `svg`, sized from its root `viewBox` (or `width`/`height`).
    pub fn from_svg(svg: impl Into<String>, label: impl Into<String>) -> Self {
        let svg_content = svg.into();
        let view_box = extract_full_view_box(&svg_content).unwrap_or_default();
        Self {
            original_width: view_box[2],
            original_height: view_box[3],
            view_box,
            label: label.into(),
            svg_content,
        }
    }
}

/// Grid geometry and styling.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per row.
    pub columns: usize,
    /// Rows; `0` derives the count from the number of cells.
    pub rows: usize,
    /// Output width.
    pub container_width: f32,
    /// Output height.
    pub container_height: f32,
    /// Gap around and between cells.
    pub cell_margin: f32,
    /// Space reserved below each row for labels; `0` disables labels.
    pub label_height: f32,
    /// Label font size.
    pub label_font_size: f32,
    /// Background fill.
    pub bg_color: String,
    /// Scale uniformly and center (`true`) or stretch to fill the cell.
    pub preserve_aspect_ratio: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            rows: 3,
            container_width: 1920.0,
            container_height: 1080.0,
            cell_margin: 20.0,
            label_height: 0.0,
            label_font_size: 14.0,
            bg_color: "#1a1a2e".to_owned(),
            preserve_aspect_ratio: true,
        }
    }
}

impl GridConfig {
    /// Reject layouts that cannot produce positive cells.
    pub fn validate(&self) -> FbfResult<()> {
        if self.columns == 0 {
            return Err(FbfError::config("grid columns must be >= 1"));
        }
        if !(self.container_width > 0.0 && self.container_height > 0.0) {
            return Err(FbfError::config("grid container size must be positive"));
        }
        if self.cell_margin < 0.0 || self.label_height < 0.0 {
            return Err(FbfError::config(
                "grid cell_margin and label_height must be >= 0",
            ));
        }
        Ok(())
    }
}

/// Composed document.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct GridResult {
    /// Complete SVG markup.
    pub svg_content: String,
    /// Output width.
    pub total_width: f32,
    /// Output height.
    pub total_height: f32,
    /// Number of cells passed in (empty ones included).
    pub cell_count: usize,
}

/// Size of every cell after margins and label rows are taken out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLayout {
    /// Cell width.
    pub cell_width: f32,
    /// Cell height.
    pub cell_height: f32,
    /// Rows actually used.
    pub rows: usize,
}

/// Lays several SVG documents out in one grid document.
///
/// Each cell's ids are prefixed `c{index}_` (background ids `bg_`) so documents cannot collide.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridCompositor;

impl GridCompositor {
    /// Grid over a flat background of `config.bg_color`.
    ///
    /// Fails on an invalid `config` or when margins and labels leave no room for the cells.
    #[tracing::instrument(skip(cells, config), fields(cells = cells.len()))]
    pub fn compose(cells: &[CompositorCell], config: &GridConfig) -> FbfResult<GridResult> {
        config.validate()?;
        let (w, h) = (config.container_width, config.container_height);
        let mut out = svg_open(w, h, !cells.is_empty());
        out.push_str(&format!(
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            escape_xml(&config.bg_color)
        ));
        if !cells.is_empty() {
            write_cells(&mut out, cells, config)?;
        }
        out.push_str("</svg>");

        Ok(GridResult {
            svg_content: out,
            total_width: w,
            total_height: h,
            cell_count: cells.len(),
        })
    }

    /// Grid drawn over another SVG document, whose size (when known) becomes the output size.
    ///
    /// Fails like [`GridCompositor::compose`].
    #[tracing::instrument(skip(cells, config, background_svg), fields(cells = cells.len()))]
    pub fn compose_with_background(
        cells: &[CompositorCell],
        config: &GridConfig,
        background_svg: &str,
    ) -> FbfResult<GridResult> {
        config.validate()?;
        let (w, h) = extract_full_view_box(background_svg)
            .map(|[_, _, w, h]| (w, h))
            .unwrap_or((config.container_width, config.container_height));

        let prefixed = prefix_svg_ids(background_svg, "bg_");
        let mut out = svg_open(w, h, true);
        out.push_str(extract_svg_content(&prefixed));
        if !cells.is_empty() {
            write_cells(&mut out, cells, config)?;
        }
        out.push_str("</svg>");

        Ok(GridResult {
            svg_content: out,
            total_width: w,
            total_height: h,
            cell_count: cells.len(),
        })
    }

    /// Cell size for `cell_count` cells under `config`.
    pub fn calculate_cell_layout(config: &GridConfig, cell_count: usize) -> CellLayout {
        let columns = config.columns.max(1);
        let rows = if config.rows > 0 {
            config.rows
        } else {
            cell_count.div_ceil(columns).max(1)
        };
        let available_w = config.container_width - config.cell_margin * (columns as f32 + 1.0);
        let available_h = config.container_height
            - config.cell_margin * (rows as f32 + 1.0)
            - config.label_height * rows as f32;
        CellLayout {
            cell_width: available_w / columns as f32,
            cell_height: available_h / rows as f32,
            rows,
        }
    }

    /// Transform fitting an `svg_w x svg_h` document into the cell at `(x, y)`.
    ///
    /// Aspect-preserving layouts scale uniformly by the smaller factor and center the result.
    pub fn cell_transform(
        x: f32,
        y: f32,
        cell_w: f32,
        cell_h: f32,
        svg_w: f32,
        svg_h: f32,
        preserve_aspect_ratio: bool,
    ) -> String {
        let sx = cell_w / svg_w;
        let sy = cell_h / svg_h;
        if preserve_aspect_ratio {
            let s = sx.min(sy);
            let ox = x + (cell_w - svg_w * s) / 2.0;
            let oy = y + (cell_h - svg_h * s) / 2.0;
            format!("translate({},{}) scale({})", num(ox), num(oy), num(s))
        } else {
            format!(
                "translate({},{}) scale({},{})",
                num(x),
                num(y),
                num(sx),
                num(sy)
            )
        }
    }

    /// Centered caption below a cell.
    pub fn label(text: &str, x: f32, cell_w: f32, y: f32, font_size: f32) -> String {
        format!(
            r##"<text x="{}" y="{}" text-anchor="middle" fill="#cccccc" font-family="sans-serif" font-size="{}">{}</text>"##,
            num(x + cell_w / 2.0),
            num(y),
            num(font_size),
            escape_xml(text)
        )
    }
}

fn svg_open(w: f32, h: f32, with_xlink: bool) -> String {
    let xlink = if with_xlink {
        r#" xmlns:xlink="http://www.w3.org/1999/xlink""#
    } else {
        ""
    };
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg"{xlink} width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(w),
        h = num(h)
    )
}

fn write_cells(out: &mut String, cells: &[CompositorCell], config: &GridConfig) -> FbfResult<()> {
    let layout = GridCompositor::calculate_cell_layout(config, cells.len());
    if !(layout.cell_width > 0.0 && layout.cell_height > 0.0) {
        return Err(FbfError::config(format!(
            "grid leaves no room for {} cells ({}x{} each)",
            cells.len(),
            layout.cell_width,
            layout.cell_height
        )));
    }
    let columns = config.columns.max(1);

    let bodies: Vec<Option<String>> = cells
        .par_iter()
        .enumerate()
        .map(|(i, cell)| {
            if cell.svg_content.is_empty() {
                return None;
            }
            let prefixed = prefix_svg_ids(&cell.svg_content, &format!("c{i}_"));
            Some(extract_svg_content(&prefixed).to_owned())
        })
        .collect();

    for (i, (cell, body)) in cells.iter().zip(bodies).enumerate() {
        let Some(body) = body else {
            continue;
        };
        let col = (i % columns) as f32;
        let row = (i / columns) as f32;
        let x = config.cell_margin + col * (layout.cell_width + config.cell_margin);
        let y = config.cell_margin
            + row * (layout.cell_height + config.cell_margin + config.label_height);

        let svg_w = positive_or_default(cell.original_width);
        let svg_h = positive_or_default(cell.original_height);
        let [vx, vy, vw, vh] = cell.view_box;
        let view_box = if vw > 0.0 && vh > 0.0 {
            format!("{} {} {} {}", num(vx), num(vy), num(vw), num(vh))
        } else {
            format!("0 0 {} {}", num(svg_w), num(svg_h))
        };

        let transform = GridCompositor::cell_transform(
            x,
            y,
            layout.cell_width,
            layout.cell_height,
            svg_w,
            svg_h,
            config.preserve_aspect_ratio,
        );
        out.push_str(&format!(
            r#"<g transform="{transform}"><svg width="{}" height="{}" viewBox="{view_box}">{body}</svg></g>"#,
            num(svg_w),
            num(svg_h)
        ));

        if config.label_height > 0.0 && !cell.label.is_empty() {
            let label_y = y + layout.cell_height + config.label_height * 0.7;
            out.push_str(&GridCompositor::label(
                &cell.label,
                x,
                layout.cell_width,
                label_y,
                config.label_font_size,
            ));
        }
    }
    Ok(())
}

fn positive_or_default(v: f32) -> f32 {
    if v > 0.0 { v } else { DEFAULT_CELL_SIZE }
}

/// Compact number formatting for generated markup (at most 4 decimals, no trailing zeros).
fn num(v: f32) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/grid.rs"]
mod tests;
