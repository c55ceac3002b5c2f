use proptest::prelude::*;
use std::io::Write;
use vocab_script_unicode::{MAX_CODEPOINT, ScriptDataError, ScriptTable, UNKNOWN_SCRIPT};

const DATA: &str = "\
# Scripts.txt excerpt

0000..0040    ; Common # Cc
0041..005A    ; Latin # L&
005B..0060    ; Common # Po
0061..007A    ; Latin # L&
0400..04FF    ; Cyrillic # L&
0E01..0E3A    ; Thai # Lo
3040..309F    ; Hiragana # Lo
4E00..9FFF    ; Han # Lo
E0100..E01EF  ; Inherited # Mn
";

// Reference lookup by linear scan over the same data
const RANGES: &[(u32, u32, &str)] = &[
    (0x0000, 0x0040, "Common"),
    (0x0041, 0x005A, "Latin"),
    (0x005B, 0x0060, "Common"),
    (0x0061, 0x007A, "Latin"),
    (0x0400, 0x04FF, "Cyrillic"),
    (0x0E01, 0x0E3A, "Thai"),
    (0x3040, 0x309F, "Hiragana"),
    (0x4E00, 0x9FFF, "Han"),
    (0xE0100, 0xE01EF, "Inherited"),
];

fn reference_lookup(codepoint: u32) -> &'static str {
    RANGES
        .iter()
        .find(|(start, end, _)| (*start..=*end).contains(&codepoint))
        .map(|(_, _, script)| *script)
        .unwrap_or(UNKNOWN_SCRIPT)
}

#[test]
fn test_load_from_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(DATA.as_bytes())?;

    let table = ScriptTable::load(file.path())?;
    assert_eq!(table.lookup('Ж' as u32), "Cyrillic");
    assert_eq!(table.lookup('中' as u32), "Han");
    assert_eq!(table.lookup(0x5B), "Common");
    assert_eq!(table.range_count(), RANGES.len());
    Ok(())
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ScriptTable::load(dir.path().join("Scripts.txt"));
    assert!(matches!(result, Err(ScriptDataError::Io(_))));
}

#[test]
fn test_crlf_line_endings() {
    let data = "# comment\r\n\r\n0041..005A ; Latin # L&\r\n";
    let table: ScriptTable = data.parse().unwrap();
    assert_eq!(table.lookup(0x41), "Latin");
}

proptest! {
    #[test]
    fn prop_every_codepoint_resolves_once(codepoint in 0u32..=MAX_CODEPOINT) {
        let table: ScriptTable = DATA.parse().unwrap();
        prop_assert_eq!(table.lookup(codepoint), reference_lookup(codepoint));
    }

    #[test]
    fn prop_range_order_does_not_matter(seed in any::<u64>()) {
        // Rotate the data lines; the resulting table must be identical
        let lines: Vec<&str> = DATA.lines().filter(|l| !l.is_empty() && !l.starts_with('#')).collect();
        let shift = (seed % lines.len() as u64) as usize;
        let mut rotated = lines.clone();
        rotated.rotate_left(shift);
        let table: ScriptTable = rotated.join("\n").parse().unwrap();

        for (start, end, script) in RANGES {
            prop_assert_eq!(table.lookup(*start), *script);
            prop_assert_eq!(table.lookup(*end), *script);
        }
    }
}
