use crate::{AddedToken, Result, TokenizerState, Vocabulary, update_special_token_ids};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};
use vocab_script_unicode::{COMMON_SCRIPT, ScriptTable, UNKNOWN_SCRIPT};

/// Scripts that never cause a token to be removed on their own
pub const IGNORED_SCRIPTS: [&str; 2] = [COMMON_SCRIPT, UNKNOWN_SCRIPT];

/// Turns a single token id back into the text it stands for
pub trait TokenDecoder {
    fn decode_token(&self, id: u32) -> Result<String>;
}

/// Decides which tokens fall outside a set of target scripts
pub struct VocabularyFilter<'a> {
    table: &'a ScriptTable,
    targets: BTreeSet<String>,
}

impl<'a> VocabularyFilter<'a> {
    pub fn new<I, S>(table: &'a ScriptTable, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table,
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn targets(&self) -> &BTreeSet<String> {
        &self.targets
    }

    /// Scripts in `text` outside the target set, ignoring Common and Unknown
    pub fn foreign_scripts<'t>(&'t self, text: &str) -> BTreeSet<&'t str> {
        self.table
            .scripts_of(text)
            .into_iter()
            .filter(|script| !IGNORED_SCRIPTS.contains(script))
            .filter(|script| !self.targets.contains(*script))
            .collect()
    }

    /// Selects every non-special token whose decoded text contains a character
    /// from a script outside the target set.
    ///
    /// Tokens are decoded rather than read from the vocabulary keys because
    /// byte-level vocabularies store an encoded form of the text.
    pub fn select_tokens_to_remove<D>(
        &self,
        vocab: &Vocabulary,
        special_ids: &HashSet<u32>,
        decoder: &D,
    ) -> Result<HashSet<String>>
    where
        D: TokenDecoder + ?Sized,
    {
        let mut remove = HashSet::new();

        for (token, id) in sorted_by_id(vocab) {
            if special_ids.contains(&id) {
                continue;
            }

            let text = decoder.decode_token(id)?;
            let foreign = self.foreign_scripts(&text);
            if !foreign.is_empty() {
                debug!("Filtering {} {:?} {:?}", id, text, foreign);
                remove.insert(token.to_string());
            }
        }

        info!("Removing {} tokens", remove.len());
        Ok(remove)
    }
}

/// Counts describing what a filtering pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub vocab_before: usize,
    pub vocab_after: usize,
    pub merges_before: usize,
    pub merges_after: usize,
    pub special_tokens: usize,
    pub post_processor_refs: usize,
}

/// Builds a new tokenizer state without `tokens_to_remove`.
///
/// Kept tokens are renumbered `0..N` in their original id order. Merges that
/// produce a removed token are dropped. Added tokens take their id from the new
/// vocabulary when present there, otherwise the next id after it, in declared
/// order. Post-processor references are then regenerated from those ids.
pub fn remove_tokens(
    state: &TokenizerState,
    tokens_to_remove: &HashSet<String>,
) -> Result<(TokenizerState, FilterStats)> {
    let mut vocab = Vocabulary::with_capacity(state.vocab.len());
    for (token, _) in sorted_by_id(&state.vocab) {
        if !tokens_to_remove.contains(token) {
            let id = vocab.len() as u32;
            vocab.insert(token.to_string(), id);
        }
    }
    info!("Filtered vocab from {} to {}", state.vocab.len(), vocab.len());

    // A merge producing a removed token is dropped even if both operands survive
    let removed: HashSet<&str> = state
        .vocab
        .keys()
        .filter(|token| !vocab.contains_key(*token))
        .map(String::as_str)
        .collect();
    let merges: Vec<_> = state
        .merges
        .iter()
        .filter(|m| !removed.contains(m.merged().as_str()))
        .cloned()
        .collect();
    info!(
        "Filtered merges from {} to {}",
        state.merges.len(),
        merges.len()
    );

    let mut next_free_id = vocab.len() as u32;
    let mut token_ids: HashMap<String, u32> = HashMap::new();
    let added_tokens: Vec<AddedToken> = state
        .added_tokens
        .iter()
        .map(|token| {
            let id = match vocab.get(&token.content) {
                Some(&id) => id,
                None => {
                    let id = next_free_id;
                    next_free_id += 1;
                    id
                }
            };
            token_ids.insert(token.content.clone(), id);
            AddedToken {
                id,
                ..token.clone()
            }
        })
        .collect();
    info!("Updated ids for {} special tokens", token_ids.len());

    let mut post_processor = state.post_processor.clone();
    let post_processor_refs = match post_processor.as_mut() {
        Some(processor) => update_special_token_ids(processor, &token_ids)?,
        None => 0,
    };
    info!(
        "Updated ids for {} special tokens in post-processor",
        post_processor_refs
    );

    let stats = FilterStats {
        vocab_before: state.vocab.len(),
        vocab_after: vocab.len(),
        merges_before: state.merges.len(),
        merges_after: merges.len(),
        special_tokens: token_ids.len(),
        post_processor_refs,
    };

    Ok((
        state.with_parts(vocab, merges, added_tokens, post_processor),
        stats,
    ))
}

// Ascending id; equal ids fall back to token text so the order is stable
fn sorted_by_id(vocab: &Vocabulary) -> Vec<(&str, u32)> {
    let mut entries: Vec<(&str, u32)> = vocab.iter().map(|(t, &i)| (t.as_str(), i)).collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    entries
}
