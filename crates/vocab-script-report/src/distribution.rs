use crate::Result;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;
use vocab_script_tokenizer::{TokenDecoder, Vocabulary};
use vocab_script_unicode::ScriptTable;

// Brackets never occur in Unicode script names, so these cannot collide
pub const SPECIAL_LABEL: &str = "[special]";
pub const MIXED_LABEL: &str = "[mixed]";
pub const OTHER_LABEL: &str = "[other]";

/// Category a vocabulary entry is counted under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Every character belongs to this script
    Script(String),
    /// Characters from more than one script (or none at all)
    Mixed,
    /// A special token, never inspected
    Special,
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Category::Script(name) => name.as_str(),
            Category::Mixed => MIXED_LABEL,
            Category::Special => SPECIAL_LABEL,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drops the leading space of whitespace-prefixed subword tokens (" word")
pub fn normalize_token(token: &str) -> &str {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(' '), Some(second)) if !second.is_whitespace() => &token[1..],
        _ => token,
    }
}

/// Total count per category label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    counts: HashMap<String, usize>,
}

impl CategoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: impl Into<String>, count: usize) {
        *self.counts.entry(label.into()).or_insert(0) += count;
    }

    pub fn get(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.counts.contains_key(label)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Removes the named categories; names not present are ignored
    pub fn exclude<'a>(&mut self, labels: impl IntoIterator<Item = &'a str>) {
        for label in labels {
            self.counts.remove(label);
        }
    }

    /// Labels and counts, largest first, ties by label
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(label, &count)| (label.as_str(), count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (label, count) in iter {
            counts.add(label, count);
        }
        counts
    }
}

/// Folds every category below `min_count` into `other_label`.
///
/// An existing `other_label` bucket is always folded, whatever its size. The
/// bucket is left out when nothing was folded into it, so folding twice gives
/// the same result as folding once.
pub fn fold_rare_categories(
    counts: &CategoryCounts,
    min_count: usize,
    other_label: &str,
) -> CategoryCounts {
    let mut folded = CategoryCounts::new();
    let mut other_total = 0;

    for (label, &count) in &counts.counts {
        if count < min_count || label == other_label {
            other_total += count;
        } else {
            folded.add(label.as_str(), count);
        }
    }

    if other_total > 0 {
        folded.add(other_label, other_total);
    }
    folded
}

/// Categorizes vocabulary entries by the Unicode scripts of their text
pub struct ScriptDistributionReporter<'a> {
    table: &'a ScriptTable,
}

impl<'a> ScriptDistributionReporter<'a> {
    pub fn new(table: &'a ScriptTable) -> Self {
        Self { table }
    }

    /// Category of a decoded, non-special token.
    ///
    /// Unlike vocabulary filtering, Common and Unknown count as scripts here.
    pub fn categorize(&self, token: &str) -> Category {
        let scripts = self.table.scripts_of(normalize_token(token));
        match scripts.len() {
            1 => scripts
                .into_iter()
                .next()
                .map(|script| Category::Script(script.to_string()))
                .unwrap_or(Category::Mixed),
            _ => Category::Mixed,
        }
    }

    pub fn categorize_token<D>(
        &self,
        id: u32,
        special_ids: &HashSet<u32>,
        decoder: &D,
    ) -> Result<Category>
    where
        D: TokenDecoder + ?Sized,
    {
        if special_ids.contains(&id) {
            return Ok(Category::Special);
        }

        let token = decoder.decode_token(id)?;
        let category = self.categorize(&token);
        debug!("{} {}", token, category);
        Ok(category)
    }

    /// Counts every vocabulary entry, visiting ids in ascending order
    pub fn aggregate<D>(
        &self,
        vocab: &Vocabulary,
        special_ids: &HashSet<u32>,
        decoder: &D,
    ) -> Result<CategoryCounts>
    where
        D: TokenDecoder + ?Sized,
    {
        let mut ids: Vec<u32> = vocab.values().copied().collect();
        ids.sort_unstable();

        let mut counts = CategoryCounts::new();
        for id in ids {
            let category = self.categorize_token(id, special_ids, decoder)?;
            counts.add(category.label(), 1);
        }
        Ok(counts)
    }
}
