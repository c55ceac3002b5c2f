//! Script composition of a tokenizer vocabulary: per-token categories,
//! aggregate counts, and chart rendering.

mod chart;
mod distribution;
mod error;

pub use chart::*;
pub use distribution::*;
pub use error::{ReportError, Result};
