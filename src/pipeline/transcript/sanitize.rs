use std::sync::LazyLock;

use regex::Regex;

/// Leading speaker tag on a capture: `Doctor:`, `Patient:`, `Dr. Smith:`.
static SPEAKER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:doctor|patient|physician|nurse|provider|pt|dr\.?\s*[a-z'-]+)\s*:\s*")
        .expect("Invalid speaker label regex")
});

const TRAILING_CONNECTIVES: &[&str] = &[" and", " but", " so", " or", " then", " which"];

/// Normalize a raw transcript before extraction.
/// Collapses all whitespace (newlines included) to single spaces, straightens
/// typographic quotes and trims. Idempotent.
pub fn normalize_transcript(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean a regex capture for display: drops a leading speaker tag, edge
/// punctuation and dangling connectives.
pub fn clean_capture(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(m) = SPEAKER_LABEL.find(text) {
        text = &text[m.end()..];
    }

    let mut text = text
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '.' | '!' | '?' | '"')
        })
        .to_string();

    loop {
        let Some(cut) = TRAILING_CONNECTIVES.iter().find_map(|w| {
            let cut = text.len().checked_sub(w.len())?;
            (text.is_char_boundary(cut) && text[cut..].eq_ignore_ascii_case(w)).then_some(cut)
        }) else {
            break;
        };
        text.truncate(cut);
        text = text.trim_end_matches([' ', ',', ';']).to_string();
    }

    text
}

/// Uppercase the first character, leaving the rest untouched.
pub fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Byte spans of the sentences in normalized text.
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text,
/// so decimals such as `98.6` stay intact.
pub fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if start.is_none() && !c.is_whitespace() {
            start = Some(i);
        }
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            if let Some(s) = start.take() {
                spans.push((s, i + c.len_utf8()));
            }
        }
    }

    if let Some(s) = start {
        let end = text.trim_end().len();
        if end > s {
            spans.push((s, end));
        }
    }

    spans
}

/// Windows of up to `size` consecutive sentences, one starting at each sentence.
pub fn sentence_windows(text: &str, size: usize) -> Vec<&str> {
    let spans = sentence_spans(text);
    let size = size.max(1);
    (0..spans.len())
        .map(|i| {
            let last = (i + size - 1).min(spans.len() - 1);
            &text[spans[i].0..spans[last].1]
        })
        .collect()
}
