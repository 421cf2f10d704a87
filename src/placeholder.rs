//! `${key}` / `${key:default}` placeholder substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{ConfigError, Result};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(?P<body>[^${}]+)\}").expect("placeholder pattern is valid")
});

const MAX_PASSES: usize = 32;

pub trait PlaceholderResolver {
    /// Substitutes every resolvable placeholder; unresolvable ones are left as written.
    fn resolve_placeholders(&self, text: &str) -> Result<String>;
}

/// Resolves placeholders against `lookup`, repeating until nothing changes so
/// values that themselves contain placeholders are expanded too.
pub fn resolve_with<F>(text: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !text.contains("${") {
        return Ok(text.to_string());
    }
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let mut circular = false;
        let next = PLACEHOLDER
            .replace_all(&current, |captures: &Captures<'_>| {
                let whole = &captures[0];
                let body = &captures["body"];
                let (key, default) = match body.split_once(':') {
                    Some((key, default)) => (key.trim(), Some(default)),
                    None => (body.trim(), None),
                };
                match lookup(key) {
                    Some(value) => {
                        if value.contains(whole) {
                            circular = true;
                        }
                        value
                    }
                    None => default.map(str::to_string).unwrap_or_else(|| whole.to_string()),
                }
            })
            .into_owned();
        if circular {
            return Err(ConfigError::CircularPlaceholder(text.to_string()));
        }
        if next == current {
            return Ok(next);
        }
        current = next;
    }
    Err(ConfigError::CircularPlaceholder(text.to_string()))
}
