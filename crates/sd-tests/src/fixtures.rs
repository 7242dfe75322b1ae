//! Call table snippets for tests that need their own table on disk.

/// A plain pass thru, with the entry name on the fifth line of the table
/// built by [`table`].
pub const PASS_THRU: &str = r#"    {
      "name": "pass thru",
      "level": "basic",
      "schemes": [
        {
          "setup": "1x2",
          "restriction": "facing_pair",
          "moves": [{ "who": ["any"], "move": { "step": { "forward": 2 } } }]
        }
      ]
    }"#;

pub const U_TURN_BACK: &str = r#"    {
      "name": "u turn back",
      "level": "basic",
      "schemes": [
        {
          "setup": "any",
          "moves": [{ "who": ["any"], "move": { "step": { "turn": 2 } } }]
        }
      ]
    }"#;

/// Wraps call entries in a version 1 table.
pub fn table(calls: &[&str]) -> String {
    format!(
        "{{\n  \"version\": 1,\n  \"calls\": [\n{}\n  ]\n}}\n",
        calls.join(",\n")
    )
}

/// Line of the `"name"` key of entry `index` in a table built from entries
/// that are all [`PASS_THRU`]-sized.
pub fn entry_line(index: usize) -> usize {
    let entry_lines = PASS_THRU.lines().count();
    4 + index * entry_lines + 1
}
