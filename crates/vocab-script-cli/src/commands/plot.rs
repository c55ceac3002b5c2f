use super::load_script_table;
use crate::config::{DEFAULT_MIN_COUNT, DEFAULT_SCRIPTS_FILE, PlotConfig, SCRIPTS_FILE_ENV};
use anyhow::{Context, Result};
use clap::Args;
use std::fmt::Write;
use std::path::PathBuf;
use vocab_script_report::{
    CategoryCounts, ChartRenderer, OTHER_LABEL, ScriptDistributionReporter, fold_rare_categories,
};
use vocab_script_tokenizer::HfTokenizer;

#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Tokenizer file, directory or HuggingFace Hub model id
    pub tokenizer: String,

    /// Categories with fewer tokens are combined into "[other]"
    #[arg(long, default_value_t = DEFAULT_MIN_COUNT)]
    pub min_count: usize,

    /// Chart title, defaults to the tokenizer id
    #[arg(long)]
    pub title: Option<String>,

    /// Write the chart as SVG here instead of printing a summary
    #[arg(long)]
    pub plotfile: Option<PathBuf>,

    /// Categories to leave out, e.g. "[special]" Common
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// Unicode Scripts.txt data file
    #[arg(long, env = SCRIPTS_FILE_ENV, default_value = DEFAULT_SCRIPTS_FILE)]
    pub scripts_file: PathBuf,

    /// Log the category of every token
    #[arg(short, long)]
    pub verbose: bool,
}

impl PlotArgs {
    pub fn into_config(self) -> PlotConfig {
        PlotConfig {
            tokenizer: self.tokenizer,
            min_count: self.min_count,
            title: self.title,
            plotfile: self.plotfile,
            exclude: self.exclude,
            scripts_file: self.scripts_file,
            verbose: self.verbose,
        }
    }
}

/// Category counts of a vocabulary, before and after combining rare ones
#[derive(Debug, Clone)]
pub struct Distribution {
    pub counts: CategoryCounts,
    pub combined: CategoryCounts,
}

pub fn compute_distribution(config: &PlotConfig) -> Result<Distribution> {
    let table = load_script_table(&config.scripts_file)?;
    let tokenizer = HfTokenizer::load(&config.tokenizer)
        .with_context(|| format!("Failed to load tokenizer '{}'", config.tokenizer))?;

    let reporter = ScriptDistributionReporter::new(&table);
    let mut counts =
        reporter.aggregate(&tokenizer.vocabulary(), &tokenizer.special_ids(), &tokenizer)?;
    counts.exclude(config.exclude.iter().map(String::as_str));

    let combined = fold_rare_categories(&counts, config.min_count, OTHER_LABEL);
    Ok(Distribution { counts, combined })
}

/// One `label count` line per category, largest first
pub fn format_counts(counts: &CategoryCounts) -> String {
    let mut out = String::new();
    for (label, count) in counts.sorted() {
        let _ = writeln!(out, "{:<16} {:>8}", label, count);
    }
    out
}

pub fn execute(config: &PlotConfig) -> Result<()> {
    let distribution = compute_distribution(config)?;

    println!("before combining rare");
    print!("{}", format_counts(&distribution.counts));
    println!("{}", "-".repeat(78));
    println!("after combining rare");
    print!("{}", format_counts(&distribution.combined));

    let renderer = ChartRenderer::new()?;
    let title = config.chart_title();
    match &config.plotfile {
        Some(path) => {
            renderer
                .write_svg(&distribution.combined, &title, path)
                .with_context(|| format!("Failed to write chart to {}", path.display()))?;
            println!("Saved chart in {}", path.display());
        }
        None => print!("{}", renderer.render_text(&distribution.combined, &title)?),
    }

    Ok(())
}
