use super::load_script_table;
use crate::config::{DEFAULT_SAVE_DIR, DEFAULT_SCRIPTS_FILE, FilterConfig, SCRIPTS_FILE_ENV};
use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use vocab_script_tokenizer::{FilterStats, HfTokenizer, VocabularyFilter, remove_tokens};
use vocab_script_unicode::ScriptTable;

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Tokenizer file, directory or HuggingFace Hub model id
    pub tokenizer: String,

    /// Scripts to keep, e.g. Latin Cyrillic
    #[arg(required = true, num_args = 1..)]
    pub scripts: Vec<String>,

    /// Output directory for the filtered tokenizer
    #[arg(long, default_value = DEFAULT_SAVE_DIR)]
    pub save_dir: PathBuf,

    /// Unicode Scripts.txt data file
    #[arg(long, env = SCRIPTS_FILE_ENV, default_value = DEFAULT_SCRIPTS_FILE)]
    pub scripts_file: PathBuf,

    /// Log every removed token
    #[arg(short, long)]
    pub verbose: bool,
}

impl FilterArgs {
    pub fn into_config(self) -> FilterConfig {
        FilterConfig {
            tokenizer: self.tokenizer,
            scripts: self.scripts,
            save_dir: self.save_dir,
            scripts_file: self.scripts_file,
            verbose: self.verbose,
        }
    }
}

/// Fails with the unknown names and the known set when a target script is not
/// listed in the script data
pub fn check_target_scripts(table: &ScriptTable, scripts: &[String]) -> Result<()> {
    let unknown = table.unknown_scripts(scripts.iter().map(String::as_str));
    if !unknown.is_empty() {
        let known: Vec<&str> = table.known_scripts().into_iter().collect();
        bail!(
            "Unknown script(s): {}. Known scripts: {}",
            unknown.join(", "),
            known.join(", ")
        );
    }
    Ok(())
}

pub fn execute(config: &FilterConfig) -> Result<()> {
    let table = load_script_table(&config.scripts_file)?;
    // Checked before the tokenizer is fetched
    check_target_scripts(&table, &config.scripts)?;

    let tokenizer = HfTokenizer::load(&config.tokenizer)
        .with_context(|| format!("Failed to load tokenizer '{}'", config.tokenizer))?;

    let filter = VocabularyFilter::new(&table, config.scripts.iter().map(String::as_str));
    let remove = filter.select_tokens_to_remove(
        &tokenizer.vocabulary(),
        &tokenizer.special_ids(),
        &tokenizer,
    )?;

    let (state, stats) = remove_tokens(&tokenizer.state()?, &remove)?;
    log_stats(&stats);

    let filtered = HfTokenizer::from_state(&state).context("Filtered tokenizer does not load")?;
    let saved = filtered
        .save(&config.save_dir, tokenizer.source_dir())
        .with_context(|| format!("Failed to save tokenizer in {}", config.save_dir.display()))?;
    println!("Saved tokenizer in {}", config.save_dir.display());

    let reloaded = HfTokenizer::from_file(&saved).context("Saved tokenizer does not reload")?;
    let expected = filtered.vocabulary().len();
    let actual = reloaded.vocabulary().len();
    if actual != expected {
        bail!(
            "Saved tokenizer has {} entries, expected {}",
            actual,
            expected
        );
    }
    info!("Reloaded {} with {} entries", saved.display(), actual);

    Ok(())
}

fn log_stats(stats: &FilterStats) {
    info!(
        "Vocabulary: {} -> {} tokens",
        stats.vocab_before, stats.vocab_after
    );
    info!(
        "Merges: {} -> {} rules",
        stats.merges_before, stats.merges_after
    );
    info!(
        "Special tokens: {} re-assigned, {} post-processor references updated",
        stats.special_tokens, stats.post_processor_refs
    );
}
