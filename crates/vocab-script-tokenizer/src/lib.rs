mod error;
mod filter;
mod hf;
mod post_processor;
mod state;

pub use error::{Result, TokenizerError};
pub use filter::*;
pub use hf::*;
pub use post_processor::*;
pub use state::*;
