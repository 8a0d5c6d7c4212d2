use std::cell::OnceCell;
use std::collections::BTreeMap;

use crate::foundation::core::DirtyRect;
use crate::foundation::error::{FbfError, FbfResult};

/// Thresholds for the full-versus-partial render decision.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DirtyTrackerOpts {
    /// Dirty area fraction of the canvas above which a full render is preferred.
    pub full_render_threshold: f32,
    /// Upper bound on separate dirty rectangles after merging.
    pub max_dirty_rects: usize,
    /// Anti-aliasing slop added around each dirty element, in user units.
    pub dirty_rect_margin: f32,
    /// Coverage above which a lone dirty target is redrawn in full.
    pub single_target_coverage: f32,
}

impl Default for DirtyTrackerOpts {
    fn default() -> Self {
        Self {
            full_render_threshold: 0.5,
            max_dirty_rects: 8,
            dirty_rect_margin: 1.0,
            single_target_coverage: 0.9,
        }
    }
}

impl DirtyTrackerOpts {
    /// Reject thresholds outside `[0, 1]`, a zero rectangle budget or a negative margin.
    pub fn validate(&self) -> FbfResult<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.full_render_threshold) {
            return Err(FbfError::config(
                "tracker full_render_threshold must be within [0, 1]",
            ));
        }
        if !unit.contains(&self.single_target_coverage) {
            return Err(FbfError::config(
                "tracker single_target_coverage must be within [0, 1]",
            ));
        }
        if self.max_dirty_rects == 0 {
            return Err(FbfError::config("tracker max_dirty_rects must be >= 1"));
        }
        if !(self.dirty_rect_margin >= 0.0 && self.dirty_rect_margin.is_finite()) {
            return Err(FbfError::config(
                "tracker dirty_rect_margin must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Per-target bookkeeping. One entry per distinct target, regardless of how long playback runs.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct AnimationDirtyState {
    /// Element id.
    pub target_id: String,
    /// Frame index before the last change.
    pub previous_frame_index: usize,
    /// Frame index currently shown.
    pub current_frame_index: usize,
    /// Element bounds in user space (meaningful when `bounds_valid`).
    pub cached_bounds: DirtyRect,
    /// False when the element's geometry is unknown; forces a full render while dirty.
    pub bounds_valid: bool,
    /// Changed since the last `clear_dirty_flags`.
    pub is_dirty: bool,
}

/// Tracks which animated elements changed this frame and decides whether a partial redraw pays
/// off.
///
/// Driven once per frame from the render thread in the order
/// `mark_dirty* -> should_use_full_render -> render -> clear_dirty_flags`.
#[derive(Debug, Default)]
pub struct DirtyRegionTracker {
    opts: DirtyTrackerOpts,
    states: BTreeMap<String, AnimationDirtyState>,
    cache: OnceCell<Vec<DirtyRect>>,
    generation: u64,
}

impl DirtyRegionTracker {
    /// Empty tracker with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty tracker with explicit thresholds.
    pub fn with_opts(opts: DirtyTrackerOpts) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    /// Thresholds in use.
    pub fn opts(&self) -> &DirtyTrackerOpts {
        &self.opts
    }

    fn invalidate(&mut self) {
        self.cache.take();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Capacity hint only; the ordered map does not preallocate, so this just starts a new
    /// generation.
    pub fn initialize(&mut self, expected_count: usize) {
        tracing::trace!(expected_count, "dirty tracker initialized");
        self.invalidate();
    }

    /// Forget every target.
    pub fn reset(&mut self) {
        self.states.clear();
        self.invalidate();
    }

    /// Record bounds for a target without touching its dirty or frame tracking. Empty bounds mark
    /// the geometry as unknown.
    pub fn set_animation_bounds(&mut self, target_id: &str, bounds: DirtyRect) {
        let state = self.entry(target_id);
        state.cached_bounds = bounds;
        state.bounds_valid = !bounds.is_empty();
        self.invalidate();
    }

    /// True when the target is tracked with usable bounds.
    pub fn has_cached_bounds(&self, target_id: &str) -> bool {
        self.states.get(target_id).is_some_and(|s| s.bounds_valid)
    }

    /// Note that `target_id` now shows `new_frame_index`.
    ///
    /// Unknown targets are created dirty with unknown bounds. Known targets only become dirty when
    /// the index actually changes.
    pub fn mark_dirty(&mut self, target_id: &str, new_frame_index: usize) {
        match self.states.get_mut(target_id) {
            Some(state) => {
                if state.current_frame_index != new_frame_index {
                    state.previous_frame_index = state.current_frame_index;
                    state.current_frame_index = new_frame_index;
                    state.is_dirty = true;
                }
            }
            None => {
                self.states.insert(
                    target_id.to_owned(),
                    AnimationDirtyState {
                        target_id: target_id.to_owned(),
                        current_frame_index: new_frame_index,
                        is_dirty: true,
                        ..AnimationDirtyState::default()
                    },
                );
            }
        }
        self.invalidate();
    }

    fn entry(&mut self, target_id: &str) -> &mut AnimationDirtyState {
        self.states
            .entry(target_id.to_owned())
            .or_insert_with(|| AnimationDirtyState {
                target_id: target_id.to_owned(),
                ..AnimationDirtyState::default()
            })
    }

    fn rects(&self) -> &[DirtyRect] {
        self.cache.get_or_init(|| self.build_rects())
    }

    fn build_rects(&self) -> Vec<DirtyRect> {
        let mut rects: Vec<DirtyRect> = self
            .states
            .values()
            .filter(|s| s.is_dirty && s.bounds_valid)
            .map(|s| s.cached_bounds.expand(self.opts.dirty_rect_margin))
            .collect();

        while rects.len() > self.opts.max_dirty_rects && merge_one_overlap(&mut rects) {}
        rects
    }

    /// Dirty rectangles (margin applied, overlaps merged while over budget).
    pub fn dirty_rects(&self) -> Vec<DirtyRect> {
        self.rects().to_vec()
    }

    /// Bounding box of all dirty rectangles, empty when nothing is dirty.
    pub fn union_dirty_rect(&self) -> DirtyRect {
        self.rects()
            .iter()
            .fold(DirtyRect::empty(), |acc, r| acc.merge(r))
    }

    /// Union dirty rect clipped to the canvas, as a fraction of the canvas area.
    pub fn dirty_area_ratio(&self, canvas_width: f32, canvas_height: f32) -> f32 {
        if canvas_width <= 0.0 || canvas_height <= 0.0 {
            return 0.0;
        }
        let union = self.union_dirty_rect();
        if union.is_empty() {
            return 0.0;
        }
        let clamped = union.clamp(canvas_width, canvas_height);
        if clamped.is_empty() {
            return 0.0;
        }
        clamped.area() / (canvas_width * canvas_height)
    }

    /// Whether the next frame should be rasterized in full.
    ///
    /// True with nothing tracked, nothing dirty (the caller may skip rendering instead), a dirty
    /// target without bounds, too many rectangles, too much dirty area, or the only tracked target
    /// dirty and covering most of the canvas.
    pub fn should_use_full_render(&self, canvas_width: f32, canvas_height: f32) -> bool {
        if self.states.is_empty() {
            return true;
        }

        let mut dirty = 0usize;
        for state in self.states.values().filter(|s| s.is_dirty) {
            if !state.bounds_valid {
                return true;
            }
            dirty += 1;
        }
        if dirty == 0 {
            return true;
        }

        if self.rects().len() > self.opts.max_dirty_rects {
            return true;
        }

        let ratio = self.dirty_area_ratio(canvas_width, canvas_height);
        if ratio > self.opts.full_render_threshold {
            return true;
        }
        self.states.len() == 1 && dirty == 1 && ratio > self.opts.single_target_coverage
    }

    /// Mark every target clean. Call after the renderer consumed this frame's dirty info.
    pub fn clear_dirty_flags(&mut self) {
        for state in self.states.values_mut() {
            state.is_dirty = false;
        }
        self.invalidate();
    }

    /// Targets currently dirty.
    pub fn dirty_count(&self) -> usize {
        self.states.values().filter(|s| s.is_dirty).count()
    }

    /// Targets tracked.
    pub fn animation_count(&self) -> usize {
        self.states.len()
    }

    /// True once at least one target is tracked.
    pub fn is_enabled(&self) -> bool {
        !self.states.is_empty()
    }

    /// Snapshot of one target's bookkeeping.
    pub fn state(&self, target_id: &str) -> Option<&AnimationDirtyState> {
        self.states.get(target_id)
    }

    /// Monotonic mutation counter; changes whenever cached rectangles may be stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Merge the first intersecting pair in place. Returns false at a fixed point.
fn merge_one_overlap(rects: &mut Vec<DirtyRect>) -> bool {
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].intersects(&rects[j]) {
                rects[i] = rects[i].merge(&rects[j]);
                rects.swap_remove(j);
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
#[path = "../../tests/unit/dirty/tracker.rs"]
mod tests;
