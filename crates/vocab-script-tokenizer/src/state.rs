use crate::{Result, TokenizerError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Token string to id mapping of a tokenizer model
pub type Vocabulary = HashMap<String, u32>;

/// A BPE merge rule; `left + right` is the token it produces
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeRule {
    pub left: String,
    pub right: String,
}

impl MergeRule {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// The token produced by applying this merge
    pub fn merged(&self) -> String {
        format!("{}{}", self.left, self.right)
    }
}

/// How merges are serialized in `tokenizer.json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeFormat {
    /// `["left", "right"]`, written by tokenizers 0.20 and later
    #[default]
    Pairs,
    /// `"left right"`, the older space-separated form
    Legacy,
}

/// An entry of the tokenizer's `added_tokens` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedToken {
    pub id: u32,
    pub content: String,
    #[serde(default)]
    pub special: bool,
    /// single_word, lstrip, rstrip, normalized and anything newer
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view of a serialized BPE tokenizer.
///
/// The vocabulary, merges, added tokens and post-processor are pulled out of the
/// JSON document; every other field is kept as-is and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerState {
    pub vocab: Vocabulary,
    pub merges: Vec<MergeRule>,
    pub merge_format: MergeFormat,
    pub added_tokens: Vec<AddedToken>,
    pub post_processor: Option<Value>,
    passthrough: Map<String, Value>,
}

impl TokenizerState {
    /// Parses a `tokenizer.json` document
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(TokenizerError::MalformedState(
                "tokenizer JSON is not an object".to_string(),
            ));
        };

        let model = match root.get_mut("model") {
            Some(Value::Object(model)) => model,
            _ => {
                return Err(TokenizerError::MalformedState(
                    "tokenizer JSON missing 'model' object".to_string(),
                ));
            }
        };

        if let Some(model_type) = model.get("type").and_then(Value::as_str) {
            if model_type != "BPE" {
                return Err(TokenizerError::UnsupportedModel(model_type.to_string()));
            }
        }

        let vocab = match model.remove("vocab") {
            Some(Value::Object(vocab)) => parse_vocab(vocab)?,
            _ => {
                return Err(TokenizerError::UnsupportedModel(
                    "model has no 'vocab' object".to_string(),
                ));
            }
        };

        let (merges, merge_format) = match model.remove("merges") {
            Some(Value::Array(merges)) => parse_merges(merges)?,
            _ => {
                return Err(TokenizerError::UnsupportedModel(
                    "model has no 'merges' array".to_string(),
                ));
            }
        };

        let added_tokens = match root.remove("added_tokens") {
            Some(tokens) => serde_json::from_value(tokens)?,
            None => Vec::new(),
        };

        let post_processor = root.remove("post_processor");

        Ok(Self {
            vocab,
            merges,
            merge_format,
            added_tokens,
            post_processor,
            passthrough: root,
        })
    }

    /// Reassembles the full `tokenizer.json` document
    pub fn to_value(&self) -> Result<Value> {
        let mut root = self.passthrough.clone();

        let mut vocab: Vec<(&String, &u32)> = self.vocab.iter().collect();
        vocab.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        let vocab: Map<String, Value> = vocab
            .into_iter()
            .map(|(token, id)| (token.clone(), Value::from(*id)))
            .collect();

        let merges: Vec<Value> = self
            .merges
            .iter()
            .map(|m| match self.merge_format {
                MergeFormat::Pairs => Value::from(vec![m.left.clone(), m.right.clone()]),
                MergeFormat::Legacy => Value::from(format!("{} {}", m.left, m.right)),
            })
            .collect();

        let model = root
            .get_mut("model")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                TokenizerError::MalformedState("tokenizer JSON missing 'model' object".to_string())
            })?;
        model.insert("vocab".to_string(), Value::Object(vocab));
        model.insert("merges".to_string(), Value::Array(merges));

        root.insert(
            "added_tokens".to_string(),
            serde_json::to_value(&self.added_tokens)?,
        );
        if let Some(post_processor) = &self.post_processor {
            root.insert("post_processor".to_string(), post_processor.clone());
        }

        Ok(Value::Object(root))
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let value = self.to_value()?;
        let json = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(json)
    }

    /// Content to id mapping of the added tokens
    pub fn added_token_ids(&self) -> HashMap<String, u32> {
        self.added_tokens
            .iter()
            .map(|t| (t.content.clone(), t.id))
            .collect()
    }

    /// Returns a copy carrying new model data and the same passthrough fields
    pub(crate) fn with_parts(
        &self,
        vocab: Vocabulary,
        merges: Vec<MergeRule>,
        added_tokens: Vec<AddedToken>,
        post_processor: Option<Value>,
    ) -> Self {
        Self {
            vocab,
            merges,
            merge_format: self.merge_format,
            added_tokens,
            post_processor,
            passthrough: self.passthrough.clone(),
        }
    }
}

fn parse_vocab(vocab: Map<String, Value>) -> Result<Vocabulary> {
    vocab
        .into_iter()
        .map(|(token, id)| {
            let id = id
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .ok_or_else(|| {
                    TokenizerError::MalformedState(format!(
                        "vocab entry '{}' has invalid id {}",
                        token, id
                    ))
                })?;
            Ok((token, id))
        })
        .collect()
}

fn parse_merges(merges: Vec<Value>) -> Result<(Vec<MergeRule>, MergeFormat)> {
    let format = match merges.first() {
        Some(Value::String(_)) => MergeFormat::Legacy,
        _ => MergeFormat::Pairs,
    };

    let rules = merges
        .into_iter()
        .map(|merge| match (format, merge) {
            (MergeFormat::Legacy, Value::String(s)) => s
                .split_once(' ')
                .map(|(left, right)| MergeRule::new(left, right))
                .ok_or_else(|| TokenizerError::MalformedState(format!("invalid merge '{}'", s))),
            (MergeFormat::Pairs, Value::Array(pair)) => match pair.as_slice() {
                [Value::String(left), Value::String(right)] => {
                    Ok(MergeRule::new(left.as_str(), right.as_str()))
                }
                _ => Err(TokenizerError::MalformedState(format!(
                    "invalid merge {:?}",
                    pair
                ))),
            },
            (_, other) => Err(TokenizerError::MalformedState(format!(
                "merge {} does not match the {:?} format of the first merge",
                other, format
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((rules, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "<s>", "single_word": false, "lstrip": false,
                 "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": null,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "BPE",
                "dropout": null,
                "unk_token": null,
                "vocab": {"<s>": 0, "a": 1, "b": 2, "ab": 3},
                "merges": [["a", "b"]]
            }
        })
    }

    #[test]
    fn test_parse_pairs_format() {
        let state = TokenizerState::from_value(sample()).unwrap();
        assert_eq!(state.vocab.len(), 4);
        assert_eq!(state.vocab["ab"], 3);
        assert_eq!(state.merges, vec![MergeRule::new("a", "b")]);
        assert_eq!(state.merge_format, MergeFormat::Pairs);
        assert_eq!(state.added_tokens[0].content, "<s>");
        assert!(state.added_tokens[0].special);
        assert_eq!(state.added_tokens[0].extra["lstrip"], json!(false));
        assert_eq!(state.post_processor, Some(Value::Null));
    }

    #[test]
    fn test_parse_legacy_format() {
        let mut value = sample();
        value["model"]["merges"] = json!(["a b"]);
        let state = TokenizerState::from_value(value).unwrap();
        assert_eq!(state.merge_format, MergeFormat::Legacy);
        assert_eq!(state.merges[0].merged(), "ab");

        let back = state.to_value().unwrap();
        assert_eq!(back["model"]["merges"], json!(["a b"]));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let original = sample();
        let state = TokenizerState::from_value(original.clone()).unwrap();
        assert_eq!(state.to_value().unwrap(), original);
    }

    #[test]
    fn test_mixed_merge_formats_rejected() {
        let mut value = sample();
        value["model"]["merges"] = json!(["a b", ["a", "b"]]);
        assert!(matches!(
            TokenizerState::from_value(value),
            Err(TokenizerError::MalformedState(_))
        ));
    }

    #[test]
    fn test_non_bpe_model_rejected() {
        let mut value = sample();
        value["model"]["type"] = json!("WordPiece");
        assert!(matches!(
            TokenizerState::from_value(value),
            Err(TokenizerError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_missing_merges_rejected() {
        let mut value = sample();
        value["model"].as_object_mut().unwrap().remove("merges");
        assert!(matches!(
            TokenizerState::from_value(value),
            Err(TokenizerError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_negative_vocab_id_rejected() {
        let mut value = sample();
        value["model"]["vocab"]["a"] = json!(-1);
        assert!(matches!(
            TokenizerState::from_value(value),
            Err(TokenizerError::MalformedState(_))
        ));
    }

    #[test]
    fn test_not_an_object() {
        assert!(TokenizerState::from_json("[1, 2, 3]").is_err());
        assert!(TokenizerState::from_json("{not json").is_err());
    }
}
