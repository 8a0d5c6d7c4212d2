pub use kurbo::Rect;

/// Axis-aligned rectangle in SVG user space, used for dirty-region bookkeeping.
///
/// A rectangle with `width <= 0` or `height <= 0` is empty; every combinator below treats empty
/// rectangles as the identity (merge) or as non-overlapping (intersects/contains).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DirtyRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width, `<= 0` means empty.
    pub width: f32,
    /// Height, `<= 0` means empty.
    pub height: f32,
}

impl DirtyRect {
    /// Build a rectangle from its origin and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The canonical empty rectangle.
    pub const fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// True when the rectangle has zero or negative area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Area in square user units (meaningless for empty rectangles).
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when both rectangles are non-empty and overlap with positive area.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(other.x >= self.right()
            || other.right() <= self.x
            || other.y >= self.bottom()
            || other.bottom() <= self.y)
    }

    /// True when `other` lies entirely inside `self` (edges may touch).
    pub fn contains(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// Bounding-box union; an empty operand yields the other one unchanged.
    pub fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// Grow by `margin` on every side. Empty rectangles stay as they are.
    pub fn expand(&self, margin: f32) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Clip to `[0, canvas_width] x [0, canvas_height]`; collapses to [`DirtyRect::empty`] when
    /// nothing remains.
    pub fn clamp(&self, canvas_width: f32, canvas_height: f32) -> Self {
        if self.is_empty() {
            return *self;
        }

        let x = self.x.max(0.0);
        let y = self.y.max(0.0);
        let right = self.right().min(canvas_width);
        let bottom = self.bottom().min(canvas_height);
        if right <= x || bottom <= y {
            return Self::empty();
        }
        Self::new(x, y, right - x, bottom - y)
    }
}

impl From<DirtyRect> for Rect {
    fn from(r: DirtyRect) -> Self {
        Rect::new(
            f64::from(r.x),
            f64::from(r.y),
            f64::from(r.right()),
            f64::from(r.bottom()),
        )
    }
}

impl From<Rect> for DirtyRect {
    fn from(r: Rect) -> Self {
        let r = r.abs();
        DirtyRect::new(r.x0 as f32, r.y0 as f32, r.width() as f32, r.height() as f32)
    }
}

/// Rendered size of a loaded document: the root `width`/`height`, before any render scale.
///
/// This is the space frame buffers are sized in. Animation bounds live in the root `viewBox`
/// space instead; [`ViewBox`] maps between the two.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in canvas units.
    pub width: f32,
    /// Height in canvas units.
    pub height: f32,
}

impl Canvas {
    /// Canvas area, `0` for degenerate sizes.
    pub fn area(self) -> f32 {
        if self.width <= 0.0 || self.height <= 0.0 {
            return 0.0;
        }
        self.width * self.height
    }
}

/// Root `viewBox` of a document and the transform that places it on its [`Canvas`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ViewBox {
    /// Origin and size in user units.
    pub rect: DirtyRect,
    /// Horizontal user-to-canvas scale.
    pub scale_x: f32,
    /// Vertical user-to-canvas scale.
    pub scale_y: f32,
    /// Canvas x of user-space x = 0.
    pub offset_x: f32,
    /// Canvas y of user-space y = 0.
    pub offset_y: f32,
}

impl ViewBox {
    /// User space equal to canvas space.
    pub fn identity(canvas: Canvas) -> Self {
        Self {
            rect: DirtyRect::new(0.0, 0.0, canvas.width, canvas.height),
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Fit `[min_x, min_y, width, height]` onto `canvas` following a `preserveAspectRatio` value
    /// (`None` is the SVG default, `xMidYMid meet`).
    ///
    /// Degenerate boxes and canvases fall back to [`ViewBox::identity`].
    pub fn fit(view_box: [f32; 4], canvas: Canvas, preserve_aspect_ratio: Option<&str>) -> Self {
        let [vx, vy, vw, vh] = view_box;
        if !(vw > 0.0 && vh > 0.0 && canvas.width > 0.0 && canvas.height > 0.0) {
            return Self::identity(canvas);
        }

        let mut parts = preserve_aspect_ratio.unwrap_or("").split_whitespace();
        let align = match parts.next() {
            Some("defer") => parts.next(),
            other => other,
        }
        .unwrap_or("xMidYMid");
        let slice = parts.next() == Some("slice");

        let (sx, sy) = (canvas.width / vw, canvas.height / vh);
        let (scale_x, scale_y) = if align == "none" {
            (sx, sy)
        } else {
            let s = if slice { sx.max(sy) } else { sx.min(sy) };
            (s, s)
        };

        let free_x = canvas.width - vw * scale_x;
        let free_y = canvas.height - vh * scale_y;
        let place = |min: &str, max: &str| {
            if align.contains(min) {
                0.0
            } else if align.contains(max) {
                1.0
            } else {
                0.5
            }
        };
        let (fx, fy) = if align == "none" {
            (0.0, 0.0)
        } else {
            (place("xMin", "xMax"), place("YMin", "YMax"))
        };

        Self {
            rect: DirtyRect::new(vx, vy, vw, vh),
            scale_x,
            scale_y,
            offset_x: free_x * fx - vx * scale_x,
            offset_y: free_y * fy - vy * scale_y,
        }
    }

    /// Map a user-space rectangle into canvas units.
    pub fn to_canvas(&self, r: DirtyRect) -> DirtyRect {
        if r.is_empty() {
            return r;
        }
        DirtyRect::new(
            self.offset_x + r.x * self.scale_x,
            self.offset_y + r.y * self.scale_y,
            r.width * self.scale_x,
            r.height * self.scale_y,
        )
    }
}

/// Rendered frame pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8, row-major, tightly packed.
    pub data: Vec<u8>,
    /// True when `data` holds premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Convert premultiplied pixels to straight alpha (no-op when already straight).
    pub fn into_straight(mut self) -> Self {
        if !self.premultiplied {
            return self;
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        self.premultiplied = false;
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
