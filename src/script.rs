//! Unicode script heuristic for the trailing `script` output column.

use unicode_script::{Script, UnicodeScript};

/// Returns the name of the first non-Common Unicode script found in `text`,
/// or the empty string if none is found.
///
/// The scan starts at the *second* character. Long-standing consumers of
/// the column depend on that behavior, so a single-character name reports
/// no script.
pub fn first_script_name(text: &str) -> String {
    for c in text.chars().skip(1) {
        let script = c.script();
        if script == Script::Common {
            continue;
        }
        return script.full_name().to_string();
    }
    String::new()
}
