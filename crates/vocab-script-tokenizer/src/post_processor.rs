use crate::{Result, TokenizerError};
use serde_json::{Map, Value};
use std::collections::HashMap;

// Processors that store special tokens as [content, id] pairs
const PAIR_PROCESSORS: [&str; 2] = ["BertProcessing", "RobertaProcessing"];
const PAIR_FIELDS: [&str; 2] = ["sep", "cls"];

/// Walks a JSON tree depth first, calling `visit` on every object before
/// descending into its values.
pub fn visit_objects<F>(value: &mut Value, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Map<String, Value>) -> Result<()>,
{
    match value {
        Value::Object(map) => {
            visit(map)?;
            for child in map.values_mut() {
                visit_objects(child, visit)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                visit_objects(item, visit)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Regenerates every special-token id referenced by a post-processor.
///
/// `TemplateProcessing` keeps a `special_tokens` map whose entries carry a
/// `tokens` list and the matching `ids`; the ids are rebuilt from `token_ids`.
/// `BertProcessing` and `RobertaProcessing` keep `[content, id]` pairs, whose ids
/// are rebuilt the same way. Nested `Sequence` processors are covered by the walk.
///
/// Returns the number of references updated.
pub fn update_special_token_ids(
    post_processor: &mut Value,
    token_ids: &HashMap<String, u32>,
) -> Result<usize> {
    let resolve = |content: &str| {
        token_ids
            .get(content)
            .copied()
            .ok_or_else(|| TokenizerError::UnresolvedSpecialToken(content.to_string()))
    };

    let mut updated = 0;
    visit_objects(post_processor, &mut |node| {
        if let Some(Value::Object(special_tokens)) = node.get_mut("special_tokens") {
            for (name, entry) in special_tokens.iter_mut() {
                let entry = entry.as_object_mut().ok_or_else(|| {
                    TokenizerError::MalformedState(format!(
                        "special token entry '{}' is not an object",
                        name
                    ))
                })?;
                let tokens = entry
                    .get("tokens")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        TokenizerError::MalformedState(format!(
                            "special token entry '{}' has no 'tokens' list",
                            name
                        ))
                    })?;
                let ids = tokens
                    .iter()
                    .map(|token| {
                        let content = token.as_str().ok_or_else(|| {
                            TokenizerError::MalformedState(format!(
                                "special token entry '{}' lists a non-string token",
                                name
                            ))
                        })?;
                        resolve(content).map(Value::from)
                    })
                    .collect::<Result<Vec<_>>>()?;
                entry.insert("ids".to_string(), Value::Array(ids));
                updated += 1;
            }
        }

        let is_pair_processor = node
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| PAIR_PROCESSORS.contains(&t));
        if is_pair_processor {
            for field in PAIR_FIELDS {
                if let Some(Value::Array(pair)) = node.get_mut(field) {
                    if let [Value::String(content), id] = pair.as_mut_slice() {
                        *id = Value::from(resolve(content.as_str())?);
                        updated += 1;
                    }
                }
            }
        }

        Ok(())
    })?;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(t, i)| (t.to_string(), *i)).collect()
    }

    #[test]
    fn test_template_processing_ids_rewritten() {
        let mut processor = json!({
            "type": "TemplateProcessing",
            "single": [{"SpecialToken": {"id": "<s>", "type_id": 0}},
                       {"Sequence": {"id": "A", "type_id": 0}}],
            "pair": [],
            "special_tokens": {
                "<s>": {"id": "<s>", "ids": [1], "tokens": ["<s>"]},
                "</s>": {"id": "</s>", "ids": [2], "tokens": ["</s>"]}
            }
        });

        let updated =
            update_special_token_ids(&mut processor, &ids(&[("<s>", 7), ("</s>", 8)])).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(processor["special_tokens"]["<s>"]["ids"], json!([7]));
        assert_eq!(processor["special_tokens"]["</s>"]["ids"], json!([8]));
        // The template itself refers to tokens by name and is untouched
        assert_eq!(processor["single"][0]["SpecialToken"]["id"], json!("<s>"));
    }

    #[test]
    fn test_nested_sequence_processor() {
        let mut processor = json!({
            "type": "Sequence",
            "processors": [
                {"type": "ByteLevel", "trim_offsets": false},
                {"type": "TemplateProcessing", "single": [], "pair": [],
                 "special_tokens": {"[CLS]": {"id": "[CLS]", "ids": [101, 102], "tokens": ["[CLS]", "[SEP]"]}}}
            ]
        });

        let updated =
            update_special_token_ids(&mut processor, &ids(&[("[CLS]", 3), ("[SEP]", 4)])).unwrap();
        assert_eq!(updated, 1);
        assert_eq!(
            processor["processors"][1]["special_tokens"]["[CLS]"]["ids"],
            json!([3, 4])
        );
    }

    #[test]
    fn test_roberta_pairs_rewritten() {
        let mut processor = json!({
            "type": "RobertaProcessing",
            "sep": ["</s>", 2],
            "cls": ["<s>", 0],
            "trim_offsets": true,
            "add_prefix_space": false
        });

        let updated =
            update_special_token_ids(&mut processor, &ids(&[("<s>", 10), ("</s>", 11)])).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(processor["sep"], json!(["</s>", 11]));
        assert_eq!(processor["cls"], json!(["<s>", 10]));
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let mut processor = json!({
            "special_tokens": {"<bos>": {"id": "<bos>", "ids": [0], "tokens": ["<bos>"]}}
        });
        let result = update_special_token_ids(&mut processor, &HashMap::new());
        assert!(matches!(
            result,
            Err(TokenizerError::UnresolvedSpecialToken(ref t)) if t == "<bos>"
        ));
    }

    #[test]
    fn test_null_processor_is_noop() {
        let mut processor = Value::Null;
        assert_eq!(update_special_token_ids(&mut processor, &HashMap::new()).unwrap(), 0);
    }

    #[test]
    fn test_visit_objects_order() {
        let mut value = json!({"a": {"b": [{"c": 1}]}});
        let mut seen = Vec::new();
        visit_objects(&mut value, &mut |node| {
            seen.push(node.keys().cloned().collect::<Vec<_>>().join(","));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
