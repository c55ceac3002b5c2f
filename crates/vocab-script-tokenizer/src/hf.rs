use crate::{Result, TokenDecoder, TokenizerError, TokenizerState, Vocabulary};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// File name of a serialized tokenizer
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Files saved next to `tokenizer.json` by transformers, copied along on save
pub const COMPANION_FILES: [&str; 3] = [
    "tokenizer_config.json",
    "special_tokens_map.json",
    "generation_config.json",
];

/// HuggingFace tokenizer wrapper
pub struct HfTokenizer {
    /// The underlying HuggingFace tokenizer
    tokenizer: Tokenizer,
    /// Local directory the tokenizer was loaded from, if any
    source_dir: Option<PathBuf>,
}

impl HfTokenizer {
    /// Loads a tokenizer from a `tokenizer.json` path, a directory containing
    /// one, or a HuggingFace Hub model id
    pub fn load(identifier: &str) -> Result<Self> {
        let path = Path::new(identifier);

        if path.is_dir() {
            let mut tokenizer = Self::from_file(path.join(TOKENIZER_FILE))?;
            tokenizer.source_dir = Some(path.to_path_buf());
            return Ok(tokenizer);
        }

        if path.is_file() {
            let mut tokenizer = Self::from_file(path)?;
            tokenizer.source_dir = path.parent().map(Path::to_path_buf);
            return Ok(tokenizer);
        }

        info!("No local tokenizer at '{}', fetching from the hub", identifier);
        let tokenizer = Tokenizer::from_pretrained(identifier, None).map_err(|e| {
            TokenizerError::Tokenizer(format!("Failed to load tokenizer '{}': {}", identifier, e))
        })?;

        Ok(Self {
            tokenizer,
            source_dir: None,
        })
    }

    /// Create a new HuggingFace tokenizer from a tokenizer.json file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            TokenizerError::Tokenizer(format!(
                "Failed to load tokenizer from {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            tokenizer,
            source_dir: None,
        })
    }

    /// Builds a tokenizer from a state; fails if the library rejects it
    pub fn from_state(state: &TokenizerState) -> Result<Self> {
        let json = state.to_json(false)?;
        let tokenizer = Tokenizer::from_str(&json).map_err(|e| {
            TokenizerError::Tokenizer(format!("Failed to build tokenizer from state: {}", e))
        })?;

        Ok(Self {
            tokenizer,
            source_dir: None,
        })
    }

    /// Serialized state of the tokenizer
    pub fn state(&self) -> Result<TokenizerState> {
        let json = self
            .tokenizer
            .to_string(false)
            .map_err(|e| TokenizerError::Tokenizer(format!("Failed to serialize tokenizer: {}", e)))?;
        TokenizerState::from_json(&json)
    }

    /// Vocabulary including added tokens
    pub fn vocabulary(&self) -> Vocabulary {
        self.tokenizer.get_vocab(true).into_iter().collect()
    }

    /// Ids of the added tokens flagged as special
    pub fn special_ids(&self) -> HashSet<u32> {
        self.tokenizer
            .get_added_tokens_decoder()
            .into_iter()
            .filter(|(_, token)| token.special)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn inner(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Writes `tokenizer.json` into `dir` and returns its path.
    ///
    /// Companion files found in `companions_from` are copied along. The
    /// `added_tokens_decoder` table of `tokenizer_config.json` is keyed by token
    /// id, so it is re-keyed with the ids of this tokenizer on the way.
    pub fn save(&self, dir: impl AsRef<Path>, companions_from: Option<&Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(TOKENIZER_FILE);
        self.tokenizer
            .save(&path, true)
            .map_err(|e| TokenizerError::Tokenizer(format!("Failed to save tokenizer: {}", e)))?;
        debug!("Wrote {}", path.display());

        if let Some(source) = companions_from {
            let token_ids = self.state()?.added_token_ids();
            for name in COMPANION_FILES {
                let from = source.join(name);
                if !from.is_file() {
                    continue;
                }

                let mut config: Value = serde_json::from_str(&fs::read_to_string(&from)?)?;
                let rekeyed = rekey_added_tokens_decoder(&mut config, &token_ids)?;
                fs::write(dir.join(name), serde_json::to_string_pretty(&config)?)?;
                debug!("Copied {} ({} added token entries re-keyed)", name, rekeyed);
            }
        }

        Ok(path)
    }
}

impl TokenDecoder for HfTokenizer {
    fn decode_token(&self, id: u32) -> Result<String> {
        // Keep special tokens, they are never filtered anyway
        self.tokenizer
            .decode(&[id], false)
            .map_err(|e| TokenizerError::Decode {
                id,
                message: e.to_string(),
            })
    }
}

/// Rebuilds the id keys of a transformers `added_tokens_decoder` table from
/// the `content` of each entry. Returns the number of entries re-keyed.
pub fn rekey_added_tokens_decoder(
    config: &mut Value,
    token_ids: &HashMap<String, u32>,
) -> Result<usize> {
    let Some(Value::Object(decoder)) = config.get_mut("added_tokens_decoder") else {
        return Ok(0);
    };

    let mut rekeyed = Map::new();
    for (_, entry) in std::mem::take(decoder) {
        let content = entry
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TokenizerError::MalformedState(
                    "added_tokens_decoder entry has no content".to_string(),
                )
            })?;
        let id = token_ids
            .get(content)
            .ok_or_else(|| TokenizerError::UnresolvedSpecialToken(content.to_string()))?;
        rekeyed.insert(id.to_string(), entry);
    }

    let count = rekeyed.len();
    *decoder = rekeyed;
    Ok(count)
}
