//! Per-frame playback pipeline tying the timeline, dirty tracker and renderer together.

pub(crate) mod player;
