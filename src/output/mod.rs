// Output formatting: terminal display for matches, embeddings and replies.

pub mod terminal;

/// Shorten a post to at most `max_chars` characters for display, marking
/// the cut with "...".
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
