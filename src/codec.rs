#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Comma-separated wire codec.
//!
//! Values are joined with `,`. A value containing a quote, space, comma, CR
//! or LF is wrapped in quotes after every literal quote has been doubled.
//! The decoder collapses any `""` into one literal quote, inside or outside a
//! quoted field, before it considers toggling the quoted state.

use itertools::Itertools;

const QUOTE: char = '"';
const SEPARATOR: char = ',';
const NEEDS_QUOTING: [char; 5] = ['"', ' ', ',', '\r', '\n'];

/// Encodes an ordered sequence of values as one CSV line.
pub fn encode<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| encode_value(value.as_ref()))
        .join(",")
}

fn encode_value(value: &str) -> String {
    let escaped = value.replace(QUOTE, "\"\"");

    // A quote-only value must stay unwrapped: the decoder would pair the
    // opening quote with the first escaped quote and read one quote too many.
    if !value.is_empty() && value.chars().all(|c| c == QUOTE) {
        return escaped;
    }

    if escaped.contains(NEEDS_QUOTING) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Splits a CSV line into its values.
///
/// The last token is always yielded, so `a,b,` decodes to three values.
#[must_use]
pub fn decode(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE if chars.peek() == Some(&QUOTE) => {
                chars.next();
                current.push(QUOTE);
            }
            QUOTE => quoted = !quoted,
            SEPARATOR if !quoted => tokens.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }

    tokens.push(current);
    tokens
}

/// Decodes a CSV line into successive key/value pairs.
///
/// An unpaired trailing token is discarded and a pair is dropped only when
/// both its key and its value are empty.
#[must_use]
pub fn decode_key_value(text: &str) -> Vec<(String, String)> {
    decode(text)
        .into_iter()
        .tuples::<(String, String)>()
        .filter(|(key, value)| !key.is_empty() || !value.is_empty())
        .collect()
}

/// Flattens key/value pairs and encodes them as one CSV line.
pub fn encode_key_value<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .flat_map(|(key, value)| [encode_value(key.as_ref()), encode_value(value.as_ref())])
        .join(",")
}

/// Case-insensitive lookup of `key` in a raw message; the last occurrence wins.
#[must_use]
pub fn key_value_get(key: &str, text: &str) -> Option<String> {
    decode_key_value(text)
        .into_iter()
        .filter(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .last()
        .map(|(_, value)| value)
}
