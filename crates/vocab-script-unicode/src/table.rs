use crate::{Result, ScriptDataError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Script value of every code point not listed in `Scripts.txt`
pub const UNKNOWN_SCRIPT: &str = "Unknown";

/// Script shared by punctuation, digits, whitespace and symbols
pub const COMMON_SCRIPT: &str = "Common";

/// Highest Unicode code point
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

// Matches a Scripts.txt data line up to the script name, e.g.
// 0000..001F    ; Common # Cc  [32] <control-0000>..<control-001F>
// 0020          ; Common # Zs       SPACE
static SCRIPT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9A-F]{4,5})(?:\.\.([0-9A-F]{4,5}))?\s+; ([A-Za-z_]+) #.*")
        .expect("Scripts.txt line pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScriptRange {
    start: u32,
    end: u32,
    script: usize,
    line: usize,
}

/// Immutable code point to script lookup.
///
/// Ranges are kept sorted by start and never overlap, so a lookup is a binary
/// search. Code points outside every range resolve to [`UNKNOWN_SCRIPT`].
#[derive(Debug, Clone, Default)]
pub struct ScriptTable {
    ranges: Vec<ScriptRange>,
    names: Vec<String>,
}

impl ScriptTable {
    /// Loads a table from a `Scripts.txt` file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::parse(BufReader::new(file))?;

        info!(
            "Loaded {} script ranges covering {} scripts from {}",
            table.range_count(),
            table.script_count(),
            path.display()
        );

        Ok(table)
    }

    /// Parses `Scripts.txt` content from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        let mut name_index: HashMap<String, usize> = HashMap::new();
        let mut ranges = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;

            // Skip blank and comment lines
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let (start, end, script) = parse_line(&line, line_no)?;

            let script = match name_index.get(script) {
                Some(&index) => index,
                None => {
                    names.push(script.to_string());
                    name_index.insert(script.to_string(), names.len() - 1);
                    names.len() - 1
                }
            };

            ranges.push(ScriptRange {
                start,
                end,
                script,
                line: line_no,
            });
        }

        ranges.sort_by_key(|r| (r.start, r.line));

        // Sorted by start, any overlap shows up between neighbours
        for pair in ranges.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start <= prev.end {
                return Err(ScriptDataError::Overlap {
                    codepoint: next.start,
                    first_line: prev.line.min(next.line),
                    second_line: prev.line.max(next.line),
                });
            }
        }

        debug!("Parsed {} ranges, {} scripts", ranges.len(), names.len());

        Ok(Self { ranges, names })
    }

    /// Returns the script of a code point, or [`UNKNOWN_SCRIPT`] if unlisted
    pub fn lookup(&self, codepoint: u32) -> &str {
        let idx = self.ranges.partition_point(|r| r.end < codepoint);
        match self.ranges.get(idx) {
            Some(range) if range.start <= codepoint => &self.names[range.script],
            _ => UNKNOWN_SCRIPT,
        }
    }

    pub fn lookup_char(&self, c: char) -> &str {
        self.lookup(c as u32)
    }

    /// Distinct scripts of every character in `text`
    pub fn scripts_of(&self, text: &str) -> BTreeSet<&str> {
        text.chars().map(|c| self.lookup_char(c)).collect()
    }

    /// Script names listed in the source data, sorted
    pub fn known_scripts(&self) -> BTreeSet<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    /// Returns the requested names that are not known scripts, sorted and deduplicated
    pub fn unknown_scripts<'a, I>(&self, requested: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known = self.known_scripts();
        let unknown: BTreeSet<&'a str> = requested
            .into_iter()
            .filter(|name| !known.contains(name))
            .collect();
        unknown.into_iter().collect()
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn script_count(&self) -> usize {
        self.names.len()
    }
}

impl FromStr for ScriptTable {
    type Err = ScriptDataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(Cursor::new(s))
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<(u32, u32, &str)> {
    let parse_error = || ScriptDataError::Parse {
        line: line_no,
        content: line.to_string(),
    };

    let caps = SCRIPT_LINE_RE.captures(line).ok_or_else(parse_error)?;
    let start = u32::from_str_radix(&caps[1], 16).map_err(|_| parse_error())?;
    let end = match caps.get(2) {
        Some(end) => u32::from_str_radix(end.as_str(), 16).map_err(|_| parse_error())?,
        None => start,
    };

    if start > end || end > MAX_CODEPOINT {
        return Err(parse_error());
    }

    let script = caps.get(3).ok_or_else(parse_error)?.as_str();
    Ok((start, end, script))
}
