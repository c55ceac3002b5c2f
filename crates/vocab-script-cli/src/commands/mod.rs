pub mod filter;
pub mod plot;

use anyhow::{Context, Result};
use std::path::Path;
use vocab_script_unicode::ScriptTable;

pub(crate) fn load_script_table(path: &Path) -> Result<ScriptTable> {
    ScriptTable::load(path)
        .with_context(|| format!("Failed to load script data from {}", path.display()))
}
