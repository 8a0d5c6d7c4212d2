//! SMIL timeline: value model, markup parsing and the playback controller.

pub(crate) mod controller;
pub(crate) mod parse;
pub(crate) mod smil;
