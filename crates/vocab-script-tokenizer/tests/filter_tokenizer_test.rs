use std::collections::HashSet;
use std::fs;
use std::path::Path;
use vocab_script_tokenizer::{
    HfTokenizer, MergeRule, TokenDecoder, TokenizerState, VocabularyFilter, remove_tokens,
};
use vocab_script_unicode::ScriptTable;

const SCRIPTS: &str = "\
0000..0040    ; Common # Cc
0041..005A    ; Latin # L&
0061..007A    ; Latin # L&
0400..04FF    ; Cyrillic # L&
";

fn fixture_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"))
}

fn load_fixture() -> HfTokenizer {
    HfTokenizer::load(fixture_dir().to_str().unwrap()).expect("fixture tokenizer loads")
}

#[test]
fn test_fixture_views() {
    let tokenizer = load_fixture();
    assert_eq!(tokenizer.vocabulary().len(), 11);
    assert_eq!(tokenizer.special_ids(), HashSet::from([9, 10]));
    assert_eq!(tokenizer.decode_token(3).unwrap(), "д");
    assert_eq!(tokenizer.decode_token(9).unwrap(), "<s>");
    assert_eq!(tokenizer.source_dir(), Some(fixture_dir()));
}

#[test]
fn test_select_latin_only() {
    let table: ScriptTable = SCRIPTS.parse().unwrap();
    let tokenizer = load_fixture();
    let filter = VocabularyFilter::new(&table, ["Latin"]);

    let remove = filter
        .select_tokens_to_remove(&tokenizer.vocabulary(), &tokenizer.special_ids(), &tokenizer)
        .unwrap();

    let expected: HashSet<String> = ["д", "ж", "дж", "aд"].iter().map(|t| t.to_string()).collect();
    assert_eq!(remove, expected);
}

#[test]
fn test_select_all_present_scripts_removes_nothing() {
    let table: ScriptTable = SCRIPTS.parse().unwrap();
    let tokenizer = load_fixture();
    let filter = VocabularyFilter::new(&table, ["Latin", "Cyrillic"]);

    let remove = filter
        .select_tokens_to_remove(&tokenizer.vocabulary(), &tokenizer.special_ids(), &tokenizer)
        .unwrap();
    assert!(remove.is_empty());

    let state = tokenizer.state().unwrap();
    let (filtered, stats) = remove_tokens(&state, &remove).unwrap();
    assert_eq!(filtered.vocab, state.vocab);
    assert_eq!(stats.merges_after, stats.merges_before);
}

#[test]
fn test_filtered_tokenizer_loads_and_encodes() -> anyhow::Result<()> {
    let table: ScriptTable = SCRIPTS.parse()?;
    let tokenizer = load_fixture();
    let filter = VocabularyFilter::new(&table, ["Latin"]);
    let remove =
        filter.select_tokens_to_remove(&tokenizer.vocabulary(), &tokenizer.special_ids(), &tokenizer)?;

    let (state, stats) = remove_tokens(&tokenizer.state()?, &remove)?;
    assert_eq!(stats.vocab_before, 11);
    assert_eq!(stats.vocab_after, 7);
    assert_eq!(stats.merges_after, 2);
    assert_eq!(stats.special_tokens, 2);
    assert_eq!(stats.post_processor_refs, 2);
    assert_eq!(state.merges, vec![MergeRule::new("a", "b"), MergeRule::new("b", "c")]);

    // a b c ab bc keep 0..4, the specials follow
    assert_eq!(state.vocab["ab"], 3);
    assert_eq!(state.vocab["<s>"], 5);
    assert_eq!(state.vocab["</s>"], 6);

    let rebuilt = HfTokenizer::from_state(&state)?;
    let encoding = rebuilt
        .inner()
        .encode("abc", true)
        .map_err(|e| anyhow::anyhow!("encode failed: {}", e))?;
    assert_eq!(encoding.get_ids(), &[5, 3, 2, 6]);
    assert_eq!(rebuilt.special_ids(), HashSet::from([5, 6]));

    Ok(())
}

#[test]
fn test_save_copies_and_rekeys_companions() -> anyhow::Result<()> {
    let table: ScriptTable = SCRIPTS.parse()?;
    let tokenizer = load_fixture();
    let filter = VocabularyFilter::new(&table, ["Latin"]);
    let remove =
        filter.select_tokens_to_remove(&tokenizer.vocabulary(), &tokenizer.special_ids(), &tokenizer)?;
    let (state, _) = remove_tokens(&tokenizer.state()?, &remove)?;

    let out = tempfile::tempdir()?;
    let rebuilt = HfTokenizer::from_state(&state)?;
    let saved = rebuilt.save(out.path(), tokenizer.source_dir())?;
    assert_eq!(saved, out.path().join("tokenizer.json"));

    // The saved tokenizer reloads with the filtered vocabulary
    let reloaded = HfTokenizer::from_file(&saved)?;
    assert_eq!(reloaded.vocabulary().len(), 7);
    let reloaded_state = TokenizerState::from_json(&fs::read_to_string(&saved)?)?;
    assert_eq!(reloaded_state.vocab, state.vocab);

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("tokenizer_config.json"))?)?;
    let decoder = config["added_tokens_decoder"].as_object().unwrap();
    assert_eq!(decoder["5"]["content"], "<s>");
    assert_eq!(decoder["6"]["content"], "</s>");
    assert!(!decoder.contains_key("9"));
    assert_eq!(config["tokenizer_class"], "PreTrainedTokenizerFast");

    // Absent companions are not invented
    assert!(!out.path().join("special_tokens_map.json").exists());
    Ok(())
}
