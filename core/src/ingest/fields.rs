//! Tokenizer for the `key=value` payloads shared by both log encodings.
//!
//! Recognized value forms:
//!
//! * `key="quoted value"`: the text between the quotes
//! * `key=(a,b)` or `key=(WxH)`: the text between the parentheses
//! * `key=value`: up to the next whitespace or separator
//!
//! Tuple values are stored as their inner text; [`parse_pair`] and
//! [`parse_number`] turn them into numbers on demand.

use std::collections::BTreeMap;

pub type Fields = BTreeMap<String, String>;

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_bare_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | ')' | ']' | '}')
}

/// Splits `input` into a field map. Later duplicates win.
pub fn tokenize(input: &str) -> Fields {
    let mut fields = Fields::new();
    let mut cursor = 0;

    while let Some(offset) = input[cursor..].find('=') {
        let eq = cursor + offset;
        let key_start = input[cursor..eq]
            .char_indices()
            .rev()
            .find(|(_, c)| !is_key_char(*c))
            .map(|(idx, c)| cursor + idx + c.len_utf8())
            .unwrap_or(cursor);
        let key = &input[key_start..eq];
        let rest = &input[eq + 1..];

        let (value, consumed) = match rest.chars().next() {
            Some('"') => match rest[1..].find('"') {
                Some(end) => (Some(&rest[1..1 + end]), end + 2),
                None => (Some(&rest[1..]), rest.len()),
            },
            Some('(') => match rest.find(')') {
                Some(end) => (Some(rest[1..end].trim()), end + 1),
                None => (None, rest.len()),
            },
            Some(c) if !is_bare_terminator(c) => {
                let end = rest.find(is_bare_terminator).unwrap_or(rest.len());
                (Some(&rest[..end]), end)
            }
            _ => (None, 0),
        };

        if let (false, Some(value)) = (key.is_empty(), value) {
            fields.insert(key.to_string(), value.to_string());
        }
        cursor = eq + 1 + consumed;
    }

    fields
}

/// Parses a finite number, tolerating surrounding whitespace.
pub fn parse_number(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Parses `a,b` or `WxH`, with or without surrounding parentheses.
pub fn parse_pair(raw: &str) -> Option<(f32, f32)> {
    let inner = raw.trim().trim_start_matches('(').trim_end_matches(')');
    let (lhs, rhs) = inner
        .split_once(',')
        .or_else(|| inner.split_once(|c: char| c == 'x' || c == 'X'))?;
    Some((parse_number(lhs)?, parse_number(rhs)?))
}
