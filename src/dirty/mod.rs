//! Partial-redraw bookkeeping: element bounds and the per-frame dirty tracker.

pub(crate) mod bounds;
pub(crate) mod tracker;
