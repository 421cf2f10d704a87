//! Reading typed values out of property sources.

use crate::error::Result;
use crate::placeholder::PlaceholderResolver;
use crate::property_source::PropertySource;

pub trait Binder {
    /// Binds `name` as a list of strings from the first source that defines it,
    /// either as a comma-delimited value or as indexed `name[i]` entries.
    /// `None` means no source defines the key.
    fn bind_list(
        &self,
        sources: &[&PropertySource],
        name: &str,
        placeholders: &dyn PlaceholderResolver,
    ) -> Result<Option<Vec<String>>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyBinder;

impl Binder for PropertyBinder {
    fn bind_list(
        &self,
        sources: &[&PropertySource],
        name: &str,
        placeholders: &dyn PlaceholderResolver,
    ) -> Result<Option<Vec<String>>> {
        for source in sources {
            if let Some(value) = source.get(name) {
                let resolved = placeholders.resolve_placeholders(&value.value)?;
                return Ok(Some(split_list(&resolved)));
            }
            let mut items = Vec::new();
            while let Some(value) = source.get(&format!("{}[{}]", name, items.len())) {
                items.push(placeholders.resolve_placeholders(&value.value)?);
            }
            if !items.is_empty() {
                let items = items
                    .into_iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                return Ok(Some(items));
            }
        }
        Ok(None)
    }
}

/// Splits a comma-delimited value, trimming items and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::resolve_with;

    struct Fixed;

    impl PlaceholderResolver for Fixed {
        fn resolve_placeholders(&self, text: &str) -> Result<String> {
            resolve_with(text, |key| (key == "env").then(|| "prod".to_string()))
        }
    }

    #[test]
    fn binds_comma_lists_with_placeholders() {
        let source = PropertySource::from_pairs("s", [("profiles.active", "dev, ${env} ,")]);
        let bound = PropertyBinder
            .bind_list(&[&source], "profiles.active", &Fixed)
            .expect("bind");
        assert_eq!(bound, Some(vec!["dev".to_string(), "prod".to_string()]));
    }

    #[test]
    fn binds_indexed_entries() {
        let source = PropertySource::from_pairs(
            "s",
            [("profiles.include[0]", "metrics"), ("profiles.include[1]", "tracing")],
        );
        let bound = PropertyBinder
            .bind_list(&[&source], "profiles.include", &Fixed)
            .expect("bind");
        assert_eq!(
            bound,
            Some(vec!["metrics".to_string(), "tracing".to_string()])
        );
    }

    #[test]
    fn first_defining_source_wins() {
        let high = PropertySource::from_pairs("high", [("other", "x")]);
        let low = PropertySource::from_pairs("low", [("profiles", "a")]);
        let bound = PropertyBinder
            .bind_list(&[&high, &low], "profiles", &Fixed)
            .expect("bind");
        assert_eq!(bound, Some(vec!["a".to_string()]));
        let missing = PropertyBinder
            .bind_list(&[&high], "profiles", &Fixed)
            .expect("bind");
        assert_eq!(missing, None);
    }
}
