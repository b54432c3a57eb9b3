/// Stored ticker summaries younger than this are reused.
pub const SUMMARY_MAX_AGE_HOURS: i64 = 2;

const KEY_MOVEMENTS_MARKER: &str = "\n\n### Key Movements";

/// Condense a recap to its opening paragraph plus everything ahead of the
/// "Key Movements" section. Missing pieces are left out.
pub fn extract_key_points(text: &str) -> String {
    let first_paragraph = text.find("\n\n").map(|i| text[..i].trim());
    let before_movements = text.find(KEY_MOVEMENTS_MARKER).map(|i| text[..i].trim());

    match (first_paragraph, before_movements) {
        (Some(first), Some(before)) => format!("{first}\n\n{before}"),
        (Some(first), None) => first.to_string(),
        (None, _) => text.trim().to_string(),
    }
}
