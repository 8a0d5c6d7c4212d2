//! Grid composition of several SVG documents into one.

pub(crate) mod grid;
pub(crate) mod prefix;
