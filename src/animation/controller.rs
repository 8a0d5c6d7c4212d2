use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use anyhow::Context;
use smallvec::SmallVec;

use crate::animation::parse::{PreprocessOpts, SyntheticId, parse_animations, preprocess_svg};
use crate::animation::smil::{
    AnimationFrameChange, AnimationState, PlaybackState, RepeatMode, SmilAnimation,
};
use crate::foundation::error::{FbfError, FbfResult};

/// Tunables for [`AnimationController`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ControllerOpts {
    /// Repeat mode a fresh controller starts in.
    pub default_repeat_mode: RepeatMode,
    /// Lower clamp for the derived frame rate.
    pub min_frame_rate: f64,
    /// Upper clamp for the derived frame rate.
    pub max_frame_rate: f64,
    /// Frame rate reported when it cannot be derived (static documents).
    pub fallback_frame_rate: f64,
    /// Per-animation fps deviation that triggers the consistency warning.
    pub frame_rate_tolerance: f64,
    /// Rewrite `<symbol>` to `<g>` during preprocessing.
    pub convert_symbols_to_groups: bool,
    /// Inject synthetic ids into anonymous animated `<use>` elements.
    pub inject_synthetic_ids: bool,
}

impl Default for ControllerOpts {
    fn default() -> Self {
        Self {
            default_repeat_mode: RepeatMode::Loop,
            min_frame_rate: 1.0,
            max_frame_rate: 240.0,
            fallback_frame_rate: 30.0,
            frame_rate_tolerance: 0.1,
            convert_symbols_to_groups: false,
            inject_synthetic_ids: true,
        }
    }
}

impl ControllerOpts {
    /// Reject frame-rate bounds that cannot produce a usable clamp.
    pub fn validate(&self) -> FbfResult<()> {
        if !(self.min_frame_rate > 0.0 && self.min_frame_rate <= self.max_frame_rate) {
            return Err(FbfError::config(
                "controller frame rate bounds must satisfy 0 < min_frame_rate <= max_frame_rate",
            ));
        }
        if !(self.fallback_frame_rate > 0.0 && self.fallback_frame_rate.is_finite()) {
            return Err(FbfError::config(
                "controller fallback_frame_rate must be positive",
            ));
        }
        if self.frame_rate_tolerance.is_nan() || self.frame_rate_tolerance < 0.0 {
            return Err(FbfError::config(
                "controller frame_rate_tolerance must be >= 0",
            ));
        }
        Ok(())
    }

    fn preprocess(&self) -> PreprocessOpts {
        PreprocessOpts {
            convert_symbols_to_groups: self.convert_symbols_to_groups,
            inject_synthetic_ids: self.inject_synthetic_ids,
        }
    }
}

/// Timing counters exposed by [`AnimationController::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct AnimationStats {
    /// Last render duration reported through [`AnimationController::update_render_time`].
    pub render_time_ms: f64,
    /// Time spent inside the last `update()`.
    pub update_time_ms: f64,
    /// Timeline position in milliseconds.
    pub animation_time_ms: f64,
    /// Global frame index.
    pub current_frame: usize,
    /// Frames in the document.
    pub total_frames: usize,
    /// Update frequency measured from the wall-clock interval between updates.
    pub fps: f64,
    /// Global frames jumped over (without wrapping) since the last reset.
    pub frame_skips: u64,
}

/// Called with the new state on every actual state transition.
pub type StateChangeCallback = Arc<dyn Fn(PlaybackState) + Send + Sync>;
/// Called with the total completed loop count whenever the timeline wraps or bounces.
pub type LoopCallback = Arc<dyn Fn(u32) + Send + Sync>;
/// Called once when a finite run reaches its end.
pub type EndCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
struct Callbacks {
    state_change: Option<StateChangeCallback>,
    on_loop: Option<LoopCallback>,
    on_end: Option<EndCallback>,
}

enum Notification {
    StateChanged(PlaybackState),
    Looped(u32),
    Ended,
}

type Pending = SmallVec<[Notification; 4]>;

struct Timeline {
    opts: ControllerOpts,
    loaded: bool,
    animations: Vec<SmilAnimation>,
    original_content: String,
    processed_content: String,
    synthetic_ids: Vec<SyntheticId>,

    current_time: f64,
    duration: f64,
    frame_rate: f64,
    total_frames: usize,

    state: PlaybackState,
    repeat_mode: RepeatMode,
    repeat_count: u32,
    completed_loops: u32,
    playback_rate: f64,
    playing_forward: bool,

    scrubbing: bool,
    state_before_scrub: PlaybackState,

    last_frame: usize,
    previous_frame_indices: Vec<usize>,
    frame_changes: Vec<AnimationFrameChange>,
    stats: AnimationStats,
    last_update: Option<Instant>,
}

impl Timeline {
    fn new(opts: ControllerOpts) -> Self {
        let repeat_mode = opts.default_repeat_mode;
        let frame_rate = opts.fallback_frame_rate;
        Self {
            opts,
            loaded: false,
            animations: Vec::new(),
            original_content: String::new(),
            processed_content: String::new(),
            synthetic_ids: Vec::new(),
            current_time: 0.0,
            duration: 0.0,
            frame_rate,
            total_frames: 0,
            state: PlaybackState::Stopped,
            repeat_mode,
            repeat_count: u32::from(repeat_mode == RepeatMode::Count),
            completed_loops: 0,
            playback_rate: 1.0,
            playing_forward: true,
            scrubbing: false,
            state_before_scrub: PlaybackState::Stopped,
            last_frame: 0,
            previous_frame_indices: Vec::new(),
            frame_changes: Vec::new(),
            stats: AnimationStats::default(),
            last_update: None,
        }
    }

    fn unload(&mut self) {
        self.animations.clear();
        self.original_content.clear();
        self.processed_content.clear();
        self.synthetic_ids.clear();
        self.loaded = false;

        self.current_time = 0.0;
        self.duration = 0.0;
        self.frame_rate = self.opts.fallback_frame_rate;
        self.total_frames = 0;

        self.state = PlaybackState::Stopped;
        self.completed_loops = 0;
        self.playing_forward = true;

        self.scrubbing = false;
        self.state_before_scrub = PlaybackState::Stopped;

        self.previous_frame_indices.clear();
        self.frame_changes.clear();
        self.last_update = None;
        self.reset_stats();
    }

    fn reset_stats(&mut self) {
        self.stats = AnimationStats {
            total_frames: self.total_frames,
            ..AnimationStats::default()
        };
        self.last_frame = 0;
    }

    fn set_state(&mut self, state: PlaybackState, pending: &mut Pending) {
        if self.state != state {
            self.state = state;
            pending.push(Notification::StateChanged(state));
        }
    }

    fn play(&mut self, pending: &mut Pending) {
        if !self.loaded || self.state == PlaybackState::Playing {
            return;
        }
        if self.state == PlaybackState::Stopped && self.at_terminal_position() {
            self.current_time = 0.0;
            self.completed_loops = 0;
            self.playing_forward = true;
            self.last_frame = 0;
        }
        self.last_update = Some(Instant::now());
        self.set_state(PlaybackState::Playing, pending);
    }

    fn pause(&mut self, pending: &mut Pending) {
        if !self.loaded {
            return;
        }
        self.set_state(PlaybackState::Paused, pending);
    }

    fn stop(&mut self, pending: &mut Pending) {
        self.current_time = 0.0;
        self.completed_loops = 0;
        self.playing_forward = true;
        self.last_frame = 0;
        self.set_state(PlaybackState::Stopped, pending);
    }

    /// A finite run parked at its end: playing again restarts from the top.
    fn at_terminal_position(&self) -> bool {
        matches!(self.repeat_mode, RepeatMode::None | RepeatMode::Count)
            && self.duration > 0.0
            && (self.current_time >= self.duration
                || (self.completed_loops > 0 && self.current_time <= 0.0))
    }

    fn end(&mut self, at: f64, pending: &mut Pending) {
        self.current_time = at;
        self.set_state(PlaybackState::Stopped, pending);
        pending.push(Notification::Ended);
    }

    fn handle_loop_behavior(&mut self, pending: &mut Pending) -> bool {
        let d = self.duration;
        if d <= 0.0 {
            return false;
        }
        let t = self.current_time;

        match self.repeat_mode {
            RepeatMode::None => {
                if t >= d {
                    self.end(d, pending);
                } else if t < 0.0 {
                    self.end(0.0, pending);
                }
                false
            }
            RepeatMode::Loop => {
                if (0.0..d).contains(&t) {
                    return false;
                }
                let wraps = (t / d).floor();
                let mut wrapped = t.rem_euclid(d);
                if wrapped >= d {
                    wrapped = 0.0;
                }
                self.current_time = wrapped;
                let wraps = wraps.abs().min(f64::from(u32::MAX)) as u32;
                self.completed_loops = self.completed_loops.saturating_add(wraps.max(1));
                pending.push(Notification::Looped(self.completed_loops));
                true
            }
            RepeatMode::Reverse => {
                if t >= d {
                    self.current_time = (d - (t - d)).clamp(0.0, d);
                    self.playing_forward = false;
                } else if t < 0.0 {
                    self.current_time = (-t).clamp(0.0, d);
                    self.playing_forward = true;
                } else {
                    return false;
                }
                self.completed_loops = self.completed_loops.saturating_add(1);
                pending.push(Notification::Looped(self.completed_loops));
                true
            }
            RepeatMode::Count => {
                if (0.0..d).contains(&t) {
                    return false;
                }
                self.completed_loops = self.completed_loops.saturating_add(1);
                if self.completed_loops >= self.repeat_count {
                    self.end(if t >= d { d } else { 0.0 }, pending);
                    false
                } else {
                    self.current_time = t.rem_euclid(d);
                    if self.current_time >= d {
                        self.current_time = 0.0;
                    }
                    pending.push(Notification::Looped(self.completed_loops));
                    true
                }
            }
        }
    }

    fn frame_for_time(&self, time: f64) -> usize {
        if self.total_frames == 0 || self.duration <= 0.0 {
            return 0;
        }
        let frame_time = self.duration / self.total_frames as f64;
        let frame = (time / frame_time).floor();
        if frame.is_nan() || frame <= 0.0 {
            return 0;
        }
        (frame as usize).min(self.total_frames - 1)
    }

    fn time_for_frame(&self, frame: usize) -> f64 {
        if self.total_frames == 0 || self.duration <= 0.0 {
            return 0.0;
        }
        let frame = frame.min(self.total_frames - 1);
        frame as f64 * (self.duration / self.total_frames as f64)
    }

    fn current_frame(&self) -> usize {
        self.frame_for_time(self.current_time)
    }

    fn track_frames(&mut self, time: f64) {
        self.frame_changes.clear();
        self.previous_frame_indices.resize(self.animations.len(), 0);

        for (anim, previous) in self
            .animations
            .iter()
            .zip(self.previous_frame_indices.iter_mut())
        {
            let current = anim.current_frame_index(time);
            if current != *previous {
                self.frame_changes.push(AnimationFrameChange {
                    target_id: anim.target_id.clone(),
                    previous_frame: *previous,
                    current_frame: current,
                });
            }
            *previous = current;
        }
    }

    fn seek_to(&mut self, time: f64) {
        if !self.loaded {
            return;
        }
        self.current_time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration.max(0.0))
        };
        self.last_frame = self.current_frame();
    }

    fn seek_to_frame(&mut self, frame: usize) {
        if !self.loaded || self.total_frames == 0 {
            return;
        }
        let frame = frame.min(self.total_frames - 1);
        self.current_time = self.time_for_frame(frame);
        self.last_frame = frame;
    }

    /// Relative seek. Under `Loop` the target wraps around (counting a loop); otherwise it clamps.
    fn seek_by(&mut self, delta: f64, pending: &mut Pending) {
        if !self.loaded || delta.is_nan() {
            return;
        }
        let target = self.current_time + delta;
        if self.repeat_mode == RepeatMode::Loop
            && self.duration > 0.0
            && !(0.0..=self.duration).contains(&target)
        {
            self.current_time = target;
            self.handle_loop_behavior(pending);
            self.last_frame = self.current_frame();
        } else {
            self.seek_to(target);
        }
    }

    fn step_by_frames(&mut self, frames: i64, pending: &mut Pending) {
        if !self.loaded || self.total_frames == 0 {
            return;
        }
        if self.state == PlaybackState::Playing {
            self.pause(pending);
        }
        let last = self.total_frames as i64 - 1;
        let target = (self.current_frame() as i64).saturating_add(frames).clamp(0, last);
        self.seek_to_frame(target as usize);
    }
}

/// Discrete SMIL timeline: parses `<animate>` elements and drives a seekable, loop-aware clock.
///
/// All methods take `&self`; state lives behind one internal mutex so readers on other threads
/// (a stats overlay, say) can query while the render thread mutates. Mutators are still meant to
/// be called from a single thread. Notifications raised during a call are queued under the lock
/// and delivered after it is released, in the order they occurred, so callbacks may call back
/// into the controller.
pub struct AnimationController {
    timeline: Mutex<Timeline>,
    callbacks: Mutex<Callbacks>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tl = self.lock();
        f.debug_struct("AnimationController")
            .field("loaded", &tl.loaded)
            .field("animations", &tl.animations.len())
            .field("duration", &tl.duration)
            .field("current_time", &tl.current_time)
            .field("state", &tl.state)
            .field("repeat_mode", &tl.repeat_mode)
            .finish()
    }
}

impl AnimationController {
    /// Unloaded controller with default options.
    pub fn new() -> Self {
        Self::with_opts(ControllerOpts::default())
    }

    /// Unloaded controller with explicit options.
    pub fn with_opts(opts: ControllerOpts) -> Self {
        Self {
            timeline: Mutex::new(Timeline::new(opts)),
            callbacks: Mutex::new(Callbacks::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Timeline> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(&self, f: impl FnOnce(&Timeline) -> R) -> R {
        f(&*self.lock())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Timeline, &mut Pending) -> R) -> R {
        let mut pending = Pending::new();
        let out = {
            let mut tl = self.lock();
            f(&mut *tl, &mut pending)
        };
        self.dispatch(pending);
        out
    }

    fn dispatch(&self, pending: Pending) {
        if pending.is_empty() {
            return;
        }
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for note in pending {
            match note {
                Notification::StateChanged(state) => {
                    if let Some(cb) = &callbacks.state_change {
                        cb(state);
                    }
                }
                Notification::Looped(loops) => {
                    if let Some(cb) = &callbacks.on_loop {
                        cb(loops);
                    }
                }
                Notification::Ended => {
                    if let Some(cb) = &callbacks.on_end {
                        cb();
                    }
                }
            }
        }
    }

    // ---- load ----

    /// Load SVG markup. Any previous document is unloaded first, even when this call fails.
    ///
    /// Documents without animations load as static (`duration() == 0`, `total_frames() == 1`).
    #[tracing::instrument(skip(self, svg), fields(bytes = svg.len()))]
    pub fn load_from_content(&self, svg: &str) -> FbfResult<()> {
        let mut pending = Pending::new();
        let result = {
            let mut tl = self.lock();
            let old_state = tl.state;
            tl.unload();
            if old_state != PlaybackState::Stopped {
                pending.push(Notification::StateChanged(PlaybackState::Stopped));
            }
            Self::load_locked(&mut tl, svg)
        };
        self.dispatch(pending);
        result
    }

    fn load_locked(tl: &mut Timeline, svg: &str) -> FbfResult<()> {
        if svg.trim().is_empty() {
            tracing::warn!("rejected empty svg content");
            return Err(FbfError::load("svg content is empty"));
        }

        let pre = preprocess_svg(svg, &tl.opts.preprocess());
        tl.original_content = svg.to_owned();
        tl.animations = parse_animations(&pre.content);
        tl.processed_content = pre.content;
        tl.synthetic_ids = pre.synthetic_ids;

        if tl.animations.is_empty() {
            tracing::info!("no SMIL animations found, loaded as static document");
            tl.duration = 0.0;
            tl.total_frames = 1;
            tl.frame_rate = tl.opts.fallback_frame_rate;
            tl.stats.total_frames = 1;
            tl.loaded = true;
            return Ok(());
        }

        tl.duration = tl
            .animations
            .iter()
            .map(|a| a.duration)
            .fold(0.0, f64::max);
        tl.total_frames = tl
            .animations
            .iter()
            .map(SmilAnimation::frame_count)
            .max()
            .unwrap_or(0)
            .max(1);
        tl.frame_rate = if tl.duration > 0.0 {
            (tl.total_frames as f64 / tl.duration)
                .clamp(tl.opts.min_frame_rate, tl.opts.max_frame_rate)
        } else {
            tl.opts.fallback_frame_rate
        };

        for anim in &tl.animations {
            if let Some(fps) = anim.implied_fps()
                && (fps - tl.frame_rate).abs() > tl.opts.frame_rate_tolerance
            {
                tracing::warn!(
                    target_id = %anim.target_id,
                    animation_fps = fps,
                    document_fps = tl.frame_rate,
                    "animation frame rate differs from document frame rate"
                );
            }
        }

        tl.previous_frame_indices = vec![0; tl.animations.len()];
        tl.stats.total_frames = tl.total_frames;
        tl.loaded = true;

        tracing::info!(
            animations = tl.animations.len(),
            duration = tl.duration,
            frames = tl.total_frames,
            fps = tl.frame_rate,
            synthetic_ids = tl.synthetic_ids.len(),
            "loaded SMIL timeline"
        );
        Ok(())
    }

    /// Read and load an SVG file.
    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> FbfResult<()> {
        let path = path.as_ref();
        let read = std::fs::read_to_string(path)
            .with_context(|| format!("read svg '{}'", path.display()));
        match read {
            Ok(svg) => self.load_from_content(&svg),
            Err(err) => {
                tracing::warn!(error = %err, "cannot open svg file");
                self.unload();
                Err(err.into())
            }
        }
    }

    /// Drop the document and reset the timeline. Repeat mode, repeat count, rate and callbacks
    /// survive.
    pub fn unload(&self) {
        self.mutate(|tl, pending| {
            let old_state = tl.state;
            tl.unload();
            if old_state != PlaybackState::Stopped {
                pending.push(Notification::StateChanged(PlaybackState::Stopped));
            }
        });
    }

    /// True after a successful load.
    pub fn is_loaded(&self) -> bool {
        self.read(|tl| tl.loaded)
    }

    /// Markup after preprocessing; this is what the renderer should consume.
    pub fn processed_content(&self) -> String {
        self.read(|tl| tl.processed_content.clone())
    }

    /// Markup exactly as loaded.
    pub fn original_content(&self) -> String {
        self.read(|tl| tl.original_content.clone())
    }

    /// Run this controller's preprocessing over arbitrary markup without loading it.
    pub fn preprocessed_content(&self, svg: &str) -> String {
        let opts = self.read(|tl| tl.opts.preprocess());
        preprocess_svg(svg, &opts).content
    }

    /// Ids injected during the last load.
    pub fn synthetic_ids(&self) -> Vec<SyntheticId> {
        self.read(|tl| tl.synthetic_ids.clone())
    }

    /// Options this controller was built with.
    pub fn opts(&self) -> ControllerOpts {
        self.read(|tl| tl.opts.clone())
    }

    // ---- document info ----

    /// Longest animation duration in seconds.
    pub fn duration(&self) -> f64 {
        self.read(|tl| tl.duration)
    }

    /// Largest value-list length (1 for static documents, 0 when unloaded).
    pub fn total_frames(&self) -> usize {
        self.read(|tl| tl.total_frames)
    }

    /// Derived frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.read(|tl| tl.frame_rate)
    }

    /// Parsed animations.
    pub fn animations(&self) -> Vec<SmilAnimation> {
        self.read(|tl| tl.animations.clone())
    }

    /// True when at least one animation was parsed.
    pub fn has_animations(&self) -> bool {
        self.read(|tl| !tl.animations.is_empty())
    }

    // ---- playback ----

    /// Start or resume. Restarts from zero when a finite run has ended.
    pub fn play(&self) {
        self.mutate(Timeline::play);
    }

    /// Freeze at the current position.
    pub fn pause(&self) {
        self.mutate(Timeline::pause);
    }

    /// Return to the start in the `Stopped` state.
    pub fn stop(&self) {
        self.mutate(Timeline::stop);
    }

    /// `pause()` while playing, `play()` otherwise.
    pub fn toggle_playback(&self) {
        self.mutate(|tl, pending| {
            if tl.state == PlaybackState::Playing {
                tl.pause(pending);
            } else {
                tl.play(pending);
            }
        });
    }

    /// Current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.read(|tl| tl.state)
    }

    /// `playback_state() == Playing`.
    pub fn is_playing(&self) -> bool {
        self.playback_state() == PlaybackState::Playing
    }

    /// `playback_state() == Paused`.
    pub fn is_paused(&self) -> bool {
        self.playback_state() == PlaybackState::Paused
    }

    /// `playback_state() == Stopped`.
    pub fn is_stopped(&self) -> bool {
        self.playback_state() == PlaybackState::Stopped
    }

    // ---- repeat ----

    /// Switch repeat mode. Leaving `Count` clears the repeat count; entering it keeps at least 1.
    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.mutate(|tl, _| {
            tl.repeat_mode = mode;
            if mode == RepeatMode::Count {
                tl.repeat_count = tl.repeat_count.max(1);
            } else {
                tl.repeat_count = 0;
            }
        });
    }

    /// Current repeat mode.
    pub fn repeat_mode(&self) -> RepeatMode {
        self.read(|tl| tl.repeat_mode)
    }

    /// Play `count` loops (at least 1) and switch to [`RepeatMode::Count`].
    pub fn set_repeat_count(&self, count: u32) {
        self.mutate(|tl, _| {
            tl.repeat_count = count.max(1);
            tl.repeat_mode = RepeatMode::Count;
        });
    }

    /// Loops requested under [`RepeatMode::Count`].
    pub fn repeat_count(&self) -> u32 {
        self.read(|tl| tl.repeat_count)
    }

    /// Loops (wraps or bounces) completed since the last stop or load.
    pub fn completed_loops(&self) -> u32 {
        self.read(|tl| tl.completed_loops)
    }

    /// Direction of travel; only flips under [`RepeatMode::Reverse`].
    pub fn is_playing_forward(&self) -> bool {
        self.read(|tl| tl.playing_forward)
    }

    // ---- rate ----

    /// Clamp to `[-10, 10]`; magnitudes below `0.01` become `0.01`.
    pub fn set_playback_rate(&self, rate: f64) {
        self.mutate(|tl, _| {
            let rate = if rate.is_nan() { 1.0 } else { rate.clamp(-10.0, 10.0) };
            tl.playback_rate = if rate.abs() < 0.01 { 0.01 } else { rate };
        });
    }

    /// Effective playback rate.
    pub fn playback_rate(&self) -> f64 {
        self.read(|tl| tl.playback_rate)
    }

    // ---- timeline ----

    /// Advance the clock by `delta_seconds` of wall time. Returns whether a re-render is needed.
    ///
    /// No-op (returning `false`) when unloaded, static, or not playing.
    pub fn update(&self, delta_seconds: f64) -> bool {
        self.mutate(|tl, pending| {
            if !tl.loaded || tl.duration <= 0.0 || tl.state != PlaybackState::Playing {
                return false;
            }
            let started = Instant::now();
            let previous_frame = tl.last_frame;

            let mut delta = delta_seconds * tl.playback_rate;
            if !tl.playing_forward {
                delta = -delta;
            }
            if delta.is_finite() {
                tl.current_time += delta;
            }
            let looped = tl.handle_loop_behavior(pending);

            let current_frame = tl.current_frame();
            tl.stats.animation_time_ms = tl.current_time * 1000.0;
            tl.stats.current_frame = current_frame;
            tl.stats.total_frames = tl.total_frames;
            if !looped {
                let jumped = current_frame.abs_diff(previous_frame);
                if jumped > 1 {
                    tl.stats.frame_skips += (jumped - 1) as u64;
                }
            }
            if let Some(last) = tl.last_update {
                let elapsed = started.duration_since(last).as_secs_f64();
                if elapsed > 0.0 {
                    tl.stats.fps = 1.0 / elapsed;
                }
            }
            tl.last_update = Some(started);

            let time = tl.current_time;
            tl.track_frames(time);

            let frame_changed = current_frame != previous_frame;
            if frame_changed {
                tl.last_frame = current_frame;
            }
            tl.stats.update_time_ms = started.elapsed().as_secs_f64() * 1000.0;
            frame_changed || !tl.frame_changes.is_empty()
        })
    }

    /// Timeline position in seconds.
    pub fn current_time(&self) -> f64 {
        self.read(|tl| tl.current_time)
    }

    /// `current_time / duration`, `0` for static documents.
    pub fn progress(&self) -> f64 {
        self.read(|tl| {
            if tl.duration <= 0.0 {
                0.0
            } else {
                tl.current_time / tl.duration
            }
        })
    }

    /// Global frame index at the current time.
    pub fn current_frame(&self) -> usize {
        self.read(Timeline::current_frame)
    }

    /// Global frame index for an arbitrary time, clamped to the document.
    pub fn frame_for_time(&self, time: f64) -> usize {
        self.read(|tl| tl.frame_for_time(time))
    }

    /// Start time of a global frame, clamped to the document.
    pub fn time_for_frame(&self, frame: usize) -> f64 {
        self.read(|tl| tl.time_for_frame(frame))
    }

    // ---- seeking ----

    /// Jump to `seconds`, clamped to `[0, duration]`.
    pub fn seek_to(&self, seconds: f64) {
        self.mutate(|tl, _| tl.seek_to(seconds));
    }

    /// Jump to the start of a global frame (clamped).
    pub fn seek_to_frame(&self, frame: usize) {
        self.mutate(|tl, _| tl.seek_to_frame(frame));
    }

    /// Jump to a fraction of the duration (clamped to `[0, 1]`).
    pub fn seek_to_progress(&self, progress: f64) {
        self.mutate(|tl, _| {
            let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
            let d = tl.duration;
            tl.seek_to(p * d);
        });
    }

    /// Jump to `0`.
    pub fn seek_to_start(&self) {
        self.seek_to(0.0);
    }

    /// Jump to the end of the timeline.
    pub fn seek_to_end(&self) {
        self.mutate(|tl, _| {
            let d = tl.duration;
            tl.seek_to(d);
            if tl.loaded {
                tl.last_frame = tl.total_frames.saturating_sub(1);
            }
        });
    }

    /// Move forward by `seconds`.
    pub fn seek_forward_by_time(&self, seconds: f64) {
        self.mutate(|tl, pending| tl.seek_by(seconds, pending));
    }

    /// Move backward by `seconds`.
    pub fn seek_backward_by_time(&self, seconds: f64) {
        self.mutate(|tl, pending| tl.seek_by(-seconds, pending));
    }

    /// Move forward by a fraction of the duration.
    pub fn seek_forward_by_percentage(&self, fraction: f64) {
        self.mutate(|tl, pending| {
            let delta = fraction * tl.duration;
            tl.seek_by(delta, pending);
        });
    }

    /// Move backward by a fraction of the duration.
    pub fn seek_backward_by_percentage(&self, fraction: f64) {
        self.mutate(|tl, pending| {
            let delta = fraction * tl.duration;
            tl.seek_by(-delta, pending);
        });
    }

    // ---- stepping ----

    /// One frame forward, pausing first if playing.
    pub fn step_forward(&self) {
        self.step_by_frames(1);
    }

    /// One frame back, pausing first if playing.
    pub fn step_backward(&self) {
        self.step_by_frames(-1);
    }

    /// Move by `frames` global frames (clamped), pausing first if playing.
    pub fn step_by_frames(&self, frames: i64) {
        self.mutate(|tl, pending| tl.step_by_frames(frames, pending));
    }

    // ---- scrubbing ----

    /// Remember the playback state and pause for interactive seeking.
    pub fn begin_scrubbing(&self) {
        self.mutate(|tl, pending| {
            if tl.scrubbing || !tl.loaded {
                return;
            }
            tl.scrubbing = true;
            tl.state_before_scrub = tl.state;
            tl.pause(pending);
        });
    }

    /// Silent seek while scrubbing; ignored otherwise.
    pub fn scrub_to_progress(&self, progress: f64) {
        self.mutate(|tl, _| {
            if !tl.scrubbing {
                return;
            }
            let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
            let d = tl.duration;
            tl.seek_to(p * d);
        });
    }

    /// Leave scrubbing; resumes playback when `resume` is set and it was playing before.
    pub fn end_scrubbing(&self, resume: bool) {
        self.mutate(|tl, pending| {
            if !tl.scrubbing {
                return;
            }
            tl.scrubbing = false;
            if resume && tl.state_before_scrub == PlaybackState::Playing {
                tl.play(pending);
            }
        });
    }

    /// True between `begin_scrubbing` and `end_scrubbing`.
    pub fn is_scrubbing(&self) -> bool {
        self.read(|tl| tl.scrubbing)
    }

    // ---- queries ----

    /// Attribute mutations to apply for the current time, one per animation.
    pub fn current_animation_states(&self) -> Vec<AnimationState> {
        self.read(|tl| {
            tl.animations
                .iter()
                .map(|anim| AnimationState {
                    target_id: anim.target_id.clone(),
                    attribute_name: anim.attribute_name.clone(),
                    value: anim.current_value(tl.current_time).to_owned(),
                })
                .collect()
        })
    }

    /// Per-animation frame changes observed by the last `update()` or `update_frame_tracking()`.
    pub fn frame_changes(&self) -> Vec<AnimationFrameChange> {
        self.read(|tl| tl.frame_changes.clone())
    }

    /// Recompute frame changes for an externally driven clock. Playback state, time and callbacks
    /// are left alone.
    pub fn update_frame_tracking(&self, absolute_time: f64) {
        self.mutate(|tl, _| tl.track_frames(absolute_time));
    }

    // ---- stats ----

    /// Snapshot of the timing counters.
    pub fn stats(&self) -> AnimationStats {
        self.read(|tl| tl.stats)
    }

    /// Zero the counters (keeps `total_frames`).
    pub fn reset_stats(&self) {
        self.mutate(|tl, _| tl.reset_stats());
    }

    /// Record how long the host's last render took.
    pub fn update_render_time(&self, ms: f64) {
        self.mutate(|tl, _| tl.stats.render_time_ms = ms);
    }

    // ---- callbacks ----

    /// Replace the state-change callback.
    pub fn set_state_change_callback(&self, cb: impl Fn(PlaybackState) + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state_change = Some(Arc::new(cb));
    }

    /// Replace the loop callback.
    pub fn set_loop_callback(&self, cb: impl Fn(u32) + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_loop = Some(Arc::new(cb));
    }

    /// Replace the end callback.
    pub fn set_end_callback(&self, cb: impl Fn() + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_end = Some(Arc::new(cb));
    }

    /// Remove all callbacks.
    pub fn clear_callbacks(&self) {
        *self.callbacks.lock().unwrap_or_else(PoisonError::into_inner) = Callbacks::default();
    }
}

/// Format seconds as `MM:SS.mmm` (minutes widen past 99; negative input reads as zero).
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let whole = seconds.floor();
    let total = whole as u64;
    let ms = (((seconds - whole) * 1000.0).floor() as u64).min(999);
    format!("{:02}:{:02}.{:03}", total / 60, total % 60, ms)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/controller.rs"]
mod tests;
