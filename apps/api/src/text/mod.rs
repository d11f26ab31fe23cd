// Text normalization applied to every request field before classification.

pub mod emoji;
pub mod sanitize;

pub use sanitize::{sanitize_analysis, sanitize_field};
