//! Shared value types, error taxonomy and markup helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod markup;
