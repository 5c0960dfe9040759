//! Legacy escape and marker cleansing.
//!
//! The target service hex-escapes punctuation in column names
//! (`_x0020_` for a space and so on), prefixes internal columns with
//! `ows_`, and embeds ordinal lookup markers (`3;#Alpha`) in multi-value
//! cells. All of that is scrubbed here before anything reaches the caller.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Fixed substitution table: bracketed hex escape to literal character.
const ESCAPE_TABLE: &[(&str, &str)] = &[
    ("_x007e_", "~"),
    ("_x0021_", "!"),
    ("_x0040_", "@"),
    ("_x0023_", "#"),
    ("_x0024_", "$"),
    ("_x0025_", "%"),
    ("_x005e_", "^"),
    ("_x0026_", "&"),
    ("_x002a_", "*"),
    ("_x0028_", "("),
    ("_x0029_", ")"),
    ("_x002b_", "+"),
    ("_x002d_", "-"),
    ("_x003d_", "="),
    ("_x007b_", "{"),
    ("_x007d_", "}"),
    ("_x003a_", ":"),
    ("_x0022_", "\""),
    ("_x007c_", "|"),
    ("_x003b_", ";"),
    ("_x0027_", "'"),
    ("_x005c_", "\\"),
    ("_x003c_", "<"),
    ("_x003e_", ">"),
    ("_x003f_", "?"),
    ("_x002c_", ","),
    ("_x002e_", "."),
    ("_x002f_", "/"),
    ("_x0060_", "`"),
    ("_x0020_", " "),
];

const LEGACY_PREFIX: &str = "ows_";

static ESCAPE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_x00[0-9a-f]{2}_").expect("escape token pattern"));

/// `;#<digits>;#` separates entries in multi-author cells.
static AUTHOR_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*;#\d*;#\s*").expect("author separator pattern"));

static ORDINAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d*;#)+").expect("ordinal prefix pattern"));

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(;#\d*)+").expect("ordinal suffix pattern"));

fn decode_escapes(value: &str) -> String {
    let decoded = ESCAPE_TOKEN.replace_all(value, |captures: &Captures<'_>| {
        let token = captures[0].to_ascii_lowercase();
        ESCAPE_TABLE
            .iter()
            .find(|(key, _)| *key == token)
            .map(|(_, replacement)| (*replacement).to_owned())
            .unwrap_or_else(|| captures[0].to_owned())
    });

    decoded.replace("::", "")
}

/// Cleanse a column or element name: decode escapes, drop the double-colon
/// separator, strip one leading `ows_`.
pub fn cleanup_name(name: &str) -> String {
    let decoded = decode_escapes(name.trim());
    match decoded.strip_prefix(LEGACY_PREFIX) {
        Some(stripped) => stripped.to_owned(),
        None => decoded,
    }
}

/// Cleanse a value: decode escapes, then strip the ordinal list-lookup
/// markers, joining multi-author entries with `|`.
pub fn cleanup_value(value: &str) -> String {
    let decoded = decode_escapes(value.trim());
    let joined = AUTHOR_SEPARATOR.replace_all(&decoded, "|");
    let stripped = ORDINAL_PREFIX.replace_all(&joined, "");
    let stripped = ORDINAL_SUFFIX.replace_all(&stripped, "");

    match stripped.strip_prefix('#') {
        Some(rest) => rest.to_owned(),
        None => stripped.into_owned(),
    }
}
