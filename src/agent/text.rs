// SYNOID Pitch Text Helpers
// Copyright (c) 2026 Xing_The_Creator | SYNOID

/// Greedy word wrap: lines of at most `max_chars` characters (not bytes),
/// split on whitespace. A single word longer than the limit is cut hard.
/// Used both for TTS request chunking and caption layout.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if word_len <= max_chars {
            current.push_str(word);
        } else {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                lines.push(piece.iter().collect());
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
