//! Text helpers: guess normalization and definition truncation.
//!
//! Lengths are counted in Unicode scalar values, never bytes.

/// Appended to every truncated definition.
pub const ELLIPSIS: char = '…';

/// Characters stripped from both ends of a guess before comparison.
pub const GUESS_TRIM_CHARS: &[char] = &[
    '!', '?', ',', ';', ':', '.', '^', '&', '/', '\\', '\n', '\t', ' ',
];

/// Cut points, most preferred first. The last one is the fallback.
const BOUNDARIES: [char; 3] = ['\n', '.', ' '];

/// Strip punctuation and whitespace from both ends of a raw guess.
pub fn normalize_guess(raw: &str) -> &str {
    raw.trim_matches(GUESS_TRIM_CHARS)
}

/// Whether `raw` is a correct guess for `word`.
///
/// Guesses longer than twice the word are rejected before any normalization.
pub fn guess_matches(word: &str, raw: &str) -> bool {
    if word.is_empty() {
        return false;
    }

    if raw.chars().count() > word.chars().count() * 2 {
        return false;
    }

    normalize_guess(raw).to_lowercase() == word.to_lowercase()
}

/// Shorten `text` to at most `max_chars` characters, ellipsis included.
///
/// Text within budget is returned unchanged. Otherwise the cut goes at the last
/// newline, then the last period, then the last space inside the budget. A
/// newline or period is only used when the kept prefix is at least half the
/// budget; a space is used whenever the prefix is non-empty. With no usable
/// boundary the text is hard-cut at `max_chars - 1`.
pub fn truncate_definition(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let window = &chars[..max_chars];
    let half = max_chars / 2;
    let cut = BOUNDARIES
        .iter()
        .enumerate()
        .find_map(|(i, &boundary)| {
            let idx = window.iter().rposition(|&c| c == boundary)?;
            let fallback = i == BOUNDARIES.len() - 1;
            (idx >= half || (fallback && idx > 0)).then_some(idx)
        })
        .unwrap_or(max_chars - 1);

    let mut out: String = chars[..cut].iter().collect();
    out.push(ELLIPSIS);
    out
}
