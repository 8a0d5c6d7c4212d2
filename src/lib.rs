//! fbfsvg plays frame-by-frame SVG animations.
//!
//! Documents animate by swapping attribute values with discrete SMIL `<animate>` elements. The
//! crate parses those, drives a seekable playback clock, and decides per frame whether only a few
//! regions of the canvas need to be rasterized again:
//!
//! - Load a document into an [`AnimationController`] (or a [`Player`], which adds rendering)
//! - Advance it with [`AnimationController::update`] once per displayed frame
//! - Feed the frame changes into a [`DirtyRegionTracker`] to pick full or partial rendering
//!
//! [`GridCompositor`] combines several documents into one grid document for side-by-side playback.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod compose;
pub(crate) mod dirty;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{Canvas, DirtyRect, FrameRGBA, Rect, ViewBox};
pub use crate::foundation::error::{FbfError, FbfResult};
pub use crate::foundation::markup::{
    TagSpan, attribute_value_range, escape_xml, extract_attribute, find_element_by_id,
    parse_numeric, set_attribute, tag_name,
};

pub use crate::animation::controller::{
    AnimationController, AnimationStats, ControllerOpts, EndCallback, LoopCallback,
    StateChangeCallback, format_time,
};
pub use crate::animation::parse::{
    PreprocessOpts, Preprocessed, SYNTHETIC_ID_PREFIX, SyntheticId, convert_symbols_to_groups,
    parse_animations, parse_duration, preprocess_svg,
};
pub use crate::animation::smil::{
    AnimationFrameChange, AnimationState, PlaybackState, RepeatMode, SmilAnimation,
};
pub use crate::compose::grid::{
    CellLayout, CompositorCell, GridCompositor, GridConfig, GridResult,
};
pub use crate::compose::prefix::{
    extract_full_view_box, extract_svg_content, extract_view_box, prefix_svg_ids,
};
pub use crate::dirty::bounds::{
    extract_animation_bounds, extract_bounds_for_id, parse_translate, parse_view_box,
};
pub use crate::dirty::tracker::{AnimationDirtyState, DirtyRegionTracker, DirtyTrackerOpts};
pub use crate::render::context::{RenderContext, RenderContextOpts};
pub use crate::render::frame::{
    FrameRenderer, apply_animation_states, document_view_box, pixel_size,
};
pub use crate::session::player::{
    FrameReport, Player, PlayerConfig, RenderPath, SimulationSummary,
};
