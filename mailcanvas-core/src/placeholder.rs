//! `{{name}}` placeholder tokens embedded in template text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `{{word}}`; the literal is covered by the tests below.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

/// Names of the placeholders in `text`, in order of appearance (duplicates kept).
#[must_use]
pub fn names(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace every `{{key}}` whose key has a non-empty value in `data`.
///
/// Unknown keys and keys mapped to an empty string are left verbatim.
#[must_use]
pub fn substitute(text: &str, data: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| match data.get(&caps[1]) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}
