//! Code point to Unicode script lookup built from the Unicode `Scripts.txt`
//! data file.

mod error;
mod table;

pub use error::{Result, ScriptDataError};
pub use table::*;
