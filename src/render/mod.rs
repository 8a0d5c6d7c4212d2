//! Rasterization: shared font/parse context and the persistent frame buffer.

pub(crate) mod context;
pub(crate) mod frame;
