//! Query engine: filter and sort notes for display.
//!
//! # Responsibility
//! - Turn the current notes plus a `FilterSpec` into the visible ordering.
//! - Stay pure: no store access, no persistence, no input mutation.

pub mod filter;
