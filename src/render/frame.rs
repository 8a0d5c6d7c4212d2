use resvg::tiny_skia::{BlendMode, Color, Pixmap, PixmapPaint, Transform};

use crate::animation::smil::AnimationState;
use crate::compose::prefix::root_tag;
use crate::dirty::bounds::parse_view_box;
use crate::foundation::core::{Canvas, DirtyRect, FrameRGBA, Rect, ViewBox};
use crate::foundation::error::{FbfError, FbfResult};
use crate::foundation::markup::{extract_attribute, set_attribute};
use crate::render::context::RenderContext;

/// Largest frame edge, in pixels, a renderer will allocate.
const MAX_DIM: u32 = 16_384;

/// Write each state's value into `markup`, returning the document for the current frame.
///
/// States whose target id is missing from `markup` are skipped.
pub fn apply_animation_states(markup: &str, states: &[AnimationState]) -> String {
    let mut out = markup.to_owned();
    for state in states {
        if !set_attribute(&mut out, &state.target_id, &state.attribute_name, &state.value) {
            tracing::trace!(target_id = %state.target_id, "animation target not in markup");
        }
    }
    out
}

/// Root `viewBox` of `markup` placed on `canvas`, identity when the root has none.
pub fn document_view_box(markup: &str, canvas: Canvas) -> ViewBox {
    let Some(root) = root_tag(markup) else {
        return ViewBox::identity(canvas);
    };
    match extract_attribute(root, "viewBox").and_then(parse_view_box) {
        Some(view_box) => {
            ViewBox::fit(view_box, canvas, extract_attribute(root, "preserveAspectRatio"))
        }
        None => ViewBox::identity(canvas),
    }
}

/// Pixel size of `canvas` rendered at `scale`.
pub fn pixel_size(canvas: Canvas, scale: f32) -> FbfResult<(u32, u32)> {
    fn to_px(v: f32) -> FbfResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(FbfError::render("frame has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    if !scale.is_finite() || scale <= 0.0 {
        return Err(FbfError::config("render scale must be positive"));
    }
    let w = to_px(canvas.width * scale)?;
    let h = to_px(canvas.height * scale)?;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(FbfError::render(format!(
            "frame size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((w, h))
}

/// Persistent frame buffer that can be repainted whole or one region at a time.
///
/// Pixels outside a partial render keep their previous contents, so the buffer must have seen a
/// full render before the first partial one.
pub struct FrameRenderer {
    pixmap: Pixmap,
    canvas: Canvas,
    scale: f32,
    background: [u8; 4],
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("scale", &self.scale)
            .field("background", &self.background)
            .finish()
    }
}

impl FrameRenderer {
    /// Frame buffer for `canvas` at `scale`, cleared to `background_rgba` (straight alpha).
    pub fn new(canvas: Canvas, scale: f32, background_rgba: [u8; 4]) -> FbfResult<Self> {
        let (w, h) = pixel_size(canvas, scale)?;
        let mut pixmap = Pixmap::new(w, h)
            .ok_or_else(|| FbfError::render("failed to allocate frame pixmap"))?;
        let [r, g, b, a] = background_rgba;
        pixmap.fill(Color::from_rgba8(r, g, b, a));
        Ok(Self {
            pixmap,
            canvas,
            scale,
            background: background_rgba,
        })
    }

    /// Logical canvas the buffer covers.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Pixels per user unit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Repaint the whole buffer from `markup`.
    #[tracing::instrument(skip(self, ctx, markup))]
    pub fn render_full(&mut self, ctx: &RenderContext, markup: &str) -> FbfResult<()> {
        let tree = ctx.parse(markup)?;
        self.pixmap.fill(self.background_color());
        resvg::render(
            &tree,
            Transform::from_scale(self.scale, self.scale),
            &mut self.pixmap.as_mut(),
        );
        Ok(())
    }

    /// Repaint only `dirty` (canvas units), leaving the rest of the buffer as it was.
    ///
    /// The region is snapped outward to whole pixels. Returns the repainted pixel rectangle, or
    /// `None` when `dirty` misses the buffer entirely.
    #[tracing::instrument(skip(self, ctx, markup))]
    pub fn render_partial(
        &mut self,
        ctx: &RenderContext,
        markup: &str,
        dirty: DirtyRect,
    ) -> FbfResult<Option<DirtyRect>> {
        let Some(px) = self.pixel_region(dirty) else {
            return Ok(None);
        };
        let tree = ctx.parse(markup)?;

        let (x0, y0) = (px.x0 as i32, px.y0 as i32);
        let mut sub = Pixmap::new(px.width() as u32, px.height() as u32)
            .ok_or_else(|| FbfError::render("failed to allocate region pixmap"))?;
        sub.fill(self.background_color());
        let s = self.scale;
        resvg::render(
            &tree,
            Transform::from_row(s, 0.0, 0.0, s, -(x0 as f32), -(y0 as f32)),
            &mut sub.as_mut(),
        );

        let paint = PixmapPaint {
            blend_mode: BlendMode::Source,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(x0, y0, sub.as_ref(), &paint, Transform::identity(), None);
        Ok(Some(DirtyRect::from(px)))
    }

    /// Copy of the current buffer (premultiplied RGBA8).
    pub fn frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            data: self.pixmap.data().to_vec(),
            premultiplied: true,
        }
    }

    /// Premultiplied RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.pixmap.pixel(x, y)?;
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    fn background_color(&self) -> Color {
        let [r, g, b, a] = self.background;
        Color::from_rgba8(r, g, b, a)
    }

    fn pixel_region(&self, dirty: DirtyRect) -> Option<Rect> {
        if dirty.is_empty() {
            return None;
        }
        let bounds = Rect::new(
            0.0,
            0.0,
            f64::from(self.pixmap.width()),
            f64::from(self.pixmap.height()),
        );
        let px = Rect::from(dirty)
            .scale_from_origin(f64::from(self.scale))
            .expand()
            .intersect(bounds);
        (px.width() >= 1.0 && px.height() >= 1.0).then_some(px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
