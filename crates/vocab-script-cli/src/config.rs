use std::path::PathBuf;

/// Environment variable consulted when `--scripts-file` is not given
pub const SCRIPTS_FILE_ENV: &str = "VOCAB_SCRIPT_SCRIPTS_FILE";
pub const DEFAULT_SCRIPTS_FILE: &str = "Scripts.txt";
pub const DEFAULT_SAVE_DIR: &str = "filtered-tokenizer";
pub const DEFAULT_MIN_COUNT: usize = 100;

/// Settings of the `filter` command
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Tokenizer file, directory or hub model id
    pub tokenizer: String,

    /// Scripts whose tokens are kept
    pub scripts: Vec<String>,

    /// Where the filtered tokenizer is written
    pub save_dir: PathBuf,

    /// Unicode `Scripts.txt` data file
    pub scripts_file: PathBuf,

    pub verbose: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tokenizer: String::new(),
            scripts: Vec::new(),
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            scripts_file: PathBuf::from(DEFAULT_SCRIPTS_FILE),
            verbose: false,
        }
    }
}

/// Settings of the `plot` command
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Tokenizer file, directory or hub model id
    pub tokenizer: String,

    /// Categories with fewer tokens are folded into "[other]"
    pub min_count: usize,

    pub title: Option<String>,

    /// SVG output path; the summary is printed when unset
    pub plotfile: Option<PathBuf>,

    /// Category labels left out of the chart
    pub exclude: Vec<String>,

    /// Unicode `Scripts.txt` data file
    pub scripts_file: PathBuf,

    pub verbose: bool,
}

impl PlotConfig {
    /// The explicit title, or the tokenizer id with the exclusions noted
    pub fn chart_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None if self.exclude.is_empty() => self.tokenizer.clone(),
            None => format!("{} (excluding {})", self.tokenizer, self.exclude.join(",")),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            tokenizer: String::new(),
            min_count: DEFAULT_MIN_COUNT,
            title: None,
            plotfile: None,
            exclude: Vec::new(),
            scripts_file: PathBuf::from(DEFAULT_SCRIPTS_FILE),
            verbose: false,
        }
    }
}
