use std::ops::Range;

/// Quotation mark pairs the generation service likes to wrap quotes in.
const WRAPPING_QUOTES: &[(char, char)] = &[
    ('"', '"'),
    ('\u{201C}', '\u{201D}'),
    ('\'', '\''),
    ('\u{2018}', '\u{2019}'),
    ('\u{00AB}', '\u{00BB}'),
];

/// Case- and whitespace-folded view of a text, mapping back to char offsets.
struct FoldedText {
    chars: Vec<char>,
    origin: Vec<usize>,
}

fn fold(text: &str) -> FoldedText {
    let mut chars = Vec::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    let mut last_was_space = false;
    for (idx, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if !last_was_space {
                chars.push(' ');
                origin.push(idx);
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;
        for lower in ch.to_lowercase() {
            chars.push(lower);
            origin.push(idx);
        }
    }
    FoldedText { chars, origin }
}

/// Forward, case-insensitive literal search that stops at the end of the text.
///
/// Offsets are in chars. Whitespace runs compare equal to a single space.
/// The search starts at char offset `from`; matches before it are not found.
pub fn find_forward(haystack: &str, query: &str, from: usize) -> Option<Range<usize>> {
    let needle = fold(query.trim());
    if needle.chars.is_empty() {
        return None;
    }
    let hay = fold(haystack);
    let start = hay.origin.partition_point(|&origin| origin < from);
    if start >= hay.chars.len() {
        return None;
    }

    let offset = hay.chars[start..]
        .windows(needle.chars.len())
        .position(|window| window == needle.chars.as_slice())?;
    let first = start + offset;
    let last = first + needle.chars.len() - 1;
    Some(hay.origin[first]..hay.origin[last] + 1)
}

/// Like [`find_forward`], but wraps around to the start of the text when
/// nothing matches after `from`. `None` means the query is nowhere in the text.
pub fn find_wrapping(haystack: &str, query: &str, from: usize) -> Option<Range<usize>> {
    find_forward(haystack, query, from).or_else(|| {
        find_forward(haystack, query, 0).filter(|range| range.start < from)
    })
}

/// Returns the query without one pair of surrounding quotation marks.
pub fn strip_wrapping_quotes(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    let mut chars = trimmed.chars();
    let open = chars.next()?;
    let close = chars.next_back()?;
    if !WRAPPING_QUOTES.contains(&(open, close)) {
        return None;
    }
    let inner = chars.as_str().trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}
