/// Replacement character emitted for glyphs that carry no Unicode mapping.
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Count the characters of `text` that carry meaning: not whitespace and not
/// an unmapped glyph.
pub fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|&c| is_meaningful(c)).count()
}

fn is_meaningful(c: char) -> bool {
    !c.is_whitespace() && c != REPLACEMENT_CHAR
}

/// Decide whether a page's embedded text can be used as-is.
///
/// A page qualifies when it has at least `min_chars` meaningful characters.
/// `min_chars` of 0 is treated as 1, so an all-whitespace page never
/// qualifies.
pub fn has_usable_text(text: &str, min_chars: usize) -> bool {
    let threshold = min_chars.max(1);
    // Stop counting once the threshold is reached; pages can be large.
    text.chars()
        .filter(|&c| is_meaningful(c))
        .take(threshold)
        .count()
        >= threshold
}
