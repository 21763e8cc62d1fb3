//! Series transformation stages.
//!
//! Each stage takes an immutable input and returns a new value; nothing here
//! performs I/O.
//!
//! Submodules:
//! - `parse` - raw API pairs into dated observations.
//! - `normalize` - native frequency down to one value per month.
//! - `align` - outer join of monthly series into a group table.

pub mod align;
pub mod normalize;
pub mod parse;

pub use align::align;
pub use normalize::normalize;
pub use parse::parse;
