//! `{name}` placeholder substitution for task descriptions

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("valid placeholder regex"));

/// Replace each `{key}` with `values[key]` verbatim.
///
/// Unknown placeholders are left as written. Substituted text is not
/// scanned again, so outputs containing braces are inserted unchanged.
pub fn render(template: &str, values: &HashMap<&str, &str>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => (*value).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
