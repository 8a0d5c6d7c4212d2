use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use crate::animation::controller::{AnimationController, ControllerOpts};
use crate::dirty::bounds::extract_animation_bounds;
use crate::dirty::tracker::{DirtyRegionTracker, DirtyTrackerOpts};
use crate::foundation::core::{Canvas, DirtyRect, FrameRGBA, ViewBox};
use crate::foundation::error::{FbfError, FbfResult};
use crate::render::context::RenderContext;
use crate::render::frame::{FrameRenderer, apply_animation_states, document_view_box};

/// Everything a [`Player`] needs besides the document and the render context.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Timeline controller tunables.
    pub controller: ControllerOpts,
    /// Dirty-region thresholds.
    pub tracker: DirtyTrackerOpts,
    /// Pixels per canvas unit (the root `width`/`height`).
    pub render_scale: f32,
    /// Clear color, straight-alpha RGBA8.
    pub background_rgba: [u8; 4],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            controller: ControllerOpts::default(),
            tracker: DirtyTrackerOpts::default(),
            render_scale: 1.0,
            background_rgba: [0, 0, 0, 0],
        }
    }
}

impl PlayerConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> FbfResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> FbfResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))
            .map_err(FbfError::from)?;
        Self::from_json_str(&text)
    }

    /// Validate every nested option block.
    pub fn validate(&self) -> FbfResult<()> {
        self.controller.validate()?;
        self.tracker.validate()?;
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(FbfError::config("render_scale must be positive"));
        }
        Ok(())
    }
}

/// How a tick produced its frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum RenderPath {
    /// Nothing visible changed; the previous frame is still current.
    Skipped,
    /// The whole canvas was rasterized.
    Full,
    /// Only this region (canvas units, clipped to the canvas) was rasterized.
    Partial(DirtyRect),
}

/// Outcome of one [`Player::tick`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FrameReport {
    /// Some animated value differs from the previous tick.
    pub changed: bool,
    /// Render path taken.
    pub path: RenderPath,
    /// Wall time spent rasterizing, `0` when skipped.
    pub render_time_ms: f64,
}

/// Decision counts collected by [`Player::simulate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct SimulationSummary {
    /// Ticks simulated.
    pub frames: u64,
    /// Ticks where the controller reported a change.
    pub changed_frames: u64,
    /// Ticks that needed no render.
    pub skipped: u64,
    /// Ticks rendered in full.
    pub full: u64,
    /// Ticks rendered partially.
    pub partial: u64,
    /// Mean canvas fraction covered by partial renders (`0` without any).
    pub mean_partial_coverage: f32,
}

/// Controller, dirty tracker and frame buffer driven together, one tick per displayed frame.
///
/// Each tick runs `update`, marks changed targets dirty, picks full or partial rendering,
/// rasterizes, then clears the dirty flags.
pub struct Player {
    controller: AnimationController,
    tracker: DirtyRegionTracker,
    renderer: FrameRenderer,
    markup: String,
    canvas: Canvas,
    view_box: ViewBox,
    config: PlayerConfig,
    needs_full: bool,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("canvas", &self.canvas)
            .field("animations", &self.tracker.animation_count())
            .field("state", &self.controller.playback_state())
            .field("needs_full", &self.needs_full)
            .finish()
    }
}

impl Player {
    /// Load `svg`, measure its canvas and seed the tracker with every target's bounds.
    ///
    /// Bounds stay in the root `viewBox` space; dirty regions are mapped onto the canvas only when
    /// they are rendered.
    ///
    /// The player starts stopped at time zero; the first tick always renders in full.
    #[tracing::instrument(skip(ctx, svg, config), fields(bytes = svg.len()))]
    pub fn load(ctx: &RenderContext, svg: &str, config: PlayerConfig) -> FbfResult<Self> {
        config.validate()?;

        let controller = AnimationController::with_opts(config.controller.clone());
        controller.load_from_content(svg)?;
        let markup = controller.processed_content();
        let canvas = ctx.canvas_of(&markup)?;
        let view_box = document_view_box(&markup, canvas);

        let animations = controller.animations();
        let bounds = extract_animation_bounds(&markup, &animations);
        let mut tracker = DirtyRegionTracker::with_opts(config.tracker.clone());
        tracker.initialize(animations.len());
        for (target_id, rect) in &bounds {
            tracker.set_animation_bounds(target_id, *rect);
        }
        tracing::debug!(
            targets = bounds.len(),
            animations = animations.len(),
            "player dirty tracker seeded"
        );

        let renderer = FrameRenderer::new(canvas, config.render_scale, config.background_rgba)?;
        Ok(Self {
            controller,
            tracker,
            renderer,
            markup,
            canvas,
            view_box,
            config,
            needs_full: true,
        })
    }

    /// Read `path` and [`Player::load`] it.
    pub fn load_from_file(
        ctx: &RenderContext,
        path: impl AsRef<Path>,
        config: PlayerConfig,
    ) -> FbfResult<Self> {
        let path = path.as_ref();
        let svg = std::fs::read_to_string(path)
            .with_context(|| format!("read svg '{}'", path.display()))
            .map_err(FbfError::from)?;
        Self::load(ctx, &svg, config)
    }

    /// Playback controls and timeline queries.
    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    /// Dirty-region state of the last tick.
    pub fn tracker(&self) -> &DirtyRegionTracker {
        &self.tracker
    }

    /// Document size in canvas units.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Root `viewBox` and its placement on the canvas.
    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    /// Configuration the player was loaded with.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Force the next tick to render in full (after a resize or an external buffer change).
    ///
    /// Seeks and steps need no invalidation; the next tick picks them up.
    pub fn invalidate(&mut self) {
        self.needs_full = true;
    }

    /// Markup for the current timeline position.
    pub fn current_markup(&self) -> String {
        apply_animation_states(&self.markup, &self.controller.current_animation_states())
    }

    /// The frame buffer as of the last tick.
    pub fn frame(&self) -> FrameRGBA {
        self.renderer.frame()
    }

    /// Advance by `delta_seconds` and bring the frame buffer up to date.
    ///
    /// Seeks, steps and scrubs made while paused or stopped are drawn by the next tick. On error
    /// the next tick renders in full again.
    pub fn tick(&mut self, ctx: &RenderContext, delta_seconds: f64) -> FbfResult<FrameReport> {
        let changed = self.advance(delta_seconds);
        let path = self.plan();

        let started = Instant::now();
        if let Err(err) = self.render(ctx, path) {
            self.needs_full = true;
            return Err(err);
        }
        let render_time_ms = if path == RenderPath::Skipped {
            0.0
        } else {
            let ms = started.elapsed().as_secs_f64() * 1000.0;
            self.controller.update_render_time(ms);
            ms
        };

        self.finish_tick();
        Ok(FrameReport {
            changed,
            path,
            render_time_ms,
        })
    }

    /// Run `frames` ticks of `delta_seconds` through the render decision without rasterizing.
    #[tracing::instrument(skip(self))]
    pub fn simulate(&mut self, delta_seconds: f64, frames: u32) -> SimulationSummary {
        let mut summary = SimulationSummary::default();
        let mut coverage = 0.0f32;

        for _ in 0..frames {
            if self.advance(delta_seconds) {
                summary.changed_frames += 1;
            }
            match self.plan() {
                RenderPath::Skipped => summary.skipped += 1,
                RenderPath::Full => summary.full += 1,
                RenderPath::Partial(region) => {
                    summary.partial += 1;
                    coverage += region.area() / self.canvas.area().max(f32::MIN_POSITIVE);
                }
            }
            summary.frames += 1;
            self.finish_tick();
        }

        if summary.partial > 0 {
            summary.mean_partial_coverage = coverage / summary.partial as f32;
        }
        summary
    }

    /// Run the clock; when it did not move, diff the frames at the current time instead so
    /// seeks made outside playback still reach the tracker.
    fn advance(&mut self, delta_seconds: f64) -> bool {
        if self.controller.update(delta_seconds) {
            return true;
        }
        self.controller
            .update_frame_tracking(self.controller.current_time());
        !self.controller.frame_changes().is_empty()
    }

    fn plan(&mut self) -> RenderPath {
        for change in self.controller.frame_changes() {
            self.tracker
                .mark_dirty(&change.target_id, change.current_frame);
        }

        if self.needs_full {
            return RenderPath::Full;
        }
        if self.tracker.dirty_count() == 0 {
            return RenderPath::Skipped;
        }

        let user = self.view_box.rect;
        if self.tracker.should_use_full_render(user.width, user.height) {
            return RenderPath::Full;
        }
        let region = self
            .view_box
            .to_canvas(self.tracker.union_dirty_rect())
            .clamp(self.canvas.width, self.canvas.height);
        if region.is_empty() {
            RenderPath::Skipped
        } else {
            RenderPath::Partial(region)
        }
    }

    fn render(&mut self, ctx: &RenderContext, path: RenderPath) -> FbfResult<()> {
        match path {
            RenderPath::Skipped => Ok(()),
            RenderPath::Full => {
                let markup = self.current_markup();
                self.renderer.render_full(ctx, &markup)
            }
            RenderPath::Partial(region) => {
                let markup = self.current_markup();
                self.renderer
                    .render_partial(ctx, &markup, region)
                    .map(|_| ())
            }
        }
    }

    fn finish_tick(&mut self) {
        self.tracker.clear_dirty_flags();
        self.needs_full = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/player.rs"]
mod tests;
