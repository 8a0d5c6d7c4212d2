/// One `<animate>` element: a list of discrete values cycled over `duration` seconds.
///
/// Immutable after parsing. Only discrete calc mode is evaluated; `calc_mode` is carried for
/// diagnostics, linear/spline modes fall back to discrete slicing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SmilAnimation {
    /// Id of the element this animation drives.
    pub target_id: String,
    /// Attribute to mutate (for frame-by-frame files usually `xlink:href`).
    pub attribute_name: String,
    /// Values in playback order.
    pub values: Vec<String>,
    /// Cycle length in seconds; `<= 0` makes the animation static.
    pub duration: f64,
    /// Whether this animation loops on its own clock.
    pub repeat: bool,
    /// Interpolation mode tag as written in the markup.
    pub calc_mode: String,
}

impl SmilAnimation {
    /// Number of values (frames) in this animation.
    pub fn frame_count(&self) -> usize {
        self.values.len()
    }

    /// Value shown at `elapsed_seconds`, `""` when there are no values.
    pub fn current_value(&self, elapsed_seconds: f64) -> &str {
        if self.values.is_empty() {
            return "";
        }
        &self.values[self.current_frame_index(elapsed_seconds)]
    }

    /// Index into `values` for `elapsed_seconds`; always `< values.len()` (or `0` when empty).
    pub fn current_frame_index(&self, elapsed_seconds: f64) -> usize {
        let count = self.values.len();
        if count == 0 || self.duration <= 0.0 || elapsed_seconds.is_nan() {
            return 0;
        }

        let t = if self.repeat {
            let mut t = elapsed_seconds % self.duration;
            if t < 0.0 {
                t += self.duration;
            }
            t
        } else if elapsed_seconds >= self.duration {
            return count - 1;
        } else if elapsed_seconds < 0.0 {
            return 0;
        } else {
            elapsed_seconds
        };

        let slice = self.duration / count as f64;
        let index = (t / slice).floor();
        if !index.is_finite() || index < 0.0 {
            return 0;
        }
        (index as usize).min(count - 1)
    }

    /// Frames per second implied by this animation alone, if it has a positive duration.
    pub fn implied_fps(&self) -> Option<f64> {
        (self.duration > 0.0 && !self.values.is_empty())
            .then(|| self.values.len() as f64 / self.duration)
    }
}

/// Attribute mutation for the current time: set `attribute_name` on `target_id` to `value`.
///
/// Recomputed on every query, never stored by the controller.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AnimationState {
    /// Element id to update.
    pub target_id: String,
    /// Attribute to modify.
    pub attribute_name: String,
    /// Value to assign.
    pub value: String,
}

/// Per-animation frame transition observed by the last timeline update.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AnimationFrameChange {
    /// Element id whose frame changed.
    pub target_id: String,
    /// Frame index before the update.
    pub previous_frame: usize,
    /// Frame index after the update.
    pub current_frame: usize,
}

/// Timeline playback state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlaybackState {
    /// Not advancing; reached via `stop()` or at the end of a finite run.
    #[default]
    Stopped,
    /// Advancing on every `update()`.
    Playing,
    /// Frozen at the current position.
    Paused,
}

/// Behavior at the timeline boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RepeatMode {
    /// Play once and stop at the end.
    None,
    /// Wrap back to the start.
    #[default]
    Loop,
    /// Ping-pong: flip direction at each end.
    Reverse,
    /// Wrap a fixed number of times, then stop.
    Count,
}

#[cfg(test)]
#[path = "../../tests/unit/animation/smil.rs"]
mod tests;
