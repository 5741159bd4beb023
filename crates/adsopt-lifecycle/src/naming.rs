//! Download filename sanitizing.

use std::sync::OnceLock;

use regex::Regex;

/// Longest filename stem produced.
pub const MAX_FILENAME_LEN: usize = 80;

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]").expect("static regex"))
}

/// Trim, collapse whitespace runs to `_`, drop anything outside
/// `[A-Za-z0-9_-]`, cap at 80 characters. Empty results become `download`.
pub fn sanitize_filename(name: &str) -> String {
    let collapsed = whitespace().replace_all(name.trim(), "_");
    let cleaned = disallowed().replace_all(&collapsed, "");
    let capped: String = cleaned.chars().take(MAX_FILENAME_LEN).collect();
    if capped.is_empty() {
        "download".to_string()
    } else {
        capped
    }
}

/// `<sanitized stem>.<extension>`, e.g. for a generated bulksheet.
pub fn download_filename(stem: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    format!("{}.{}", sanitize_filename(stem), sanitize_filename(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_and_strips() {
        assert_eq!(sanitize_filename("  Q3 bid   test / B0TEST!  "), "Q3_bid_test__B0TEST");
        assert_eq!(sanitize_filename("ünïcode-name"), "ncode-name");
        assert_eq!(sanitize_filename("   "), "download");
    }

    #[test]
    fn caps_length() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_LEN);
        assert_eq!(download_filename("final plan", ".xlsx"), "final_plan.xlsx");
    }
}
