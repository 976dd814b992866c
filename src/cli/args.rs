#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub const KNOWN_FLAGS: &[&str] = &[
    "--config",
    "--json",
    "--line",
    "--help",
    "-h",
    "--version",
    "-v",
];

#[must_use]
pub fn suggest_flag(typo: &str) -> Option<&'static str> {
    KNOWN_FLAGS
        .iter()
        .filter(|flag| flag.starts_with("--"))
        .map(|flag| (*flag, strsim::levenshtein(typo, flag)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(flag, _)| flag)
}
