//! Document format loaders and their registry.
//!
//! A loader turns one resource into zero or more property sources. The
//! registry is built explicitly at startup; the order of registration decides
//! which loader claims an extension that two loaders both declare.

mod json;
mod properties;
mod toml;
mod yaml;

use serde_json::Value;

pub use self::json::JsonLoader;
pub use self::properties::PropertiesLoader;
pub use self::toml::TomlLoader;
pub use self::yaml::YamlLoader;

use crate::error::Result;
use crate::property_source::{Origin, PropertySource, PropertyValue};
use crate::resource::Resource;

pub trait DocumentFormatLoader {
    fn name(&self) -> &'static str;

    /// Extensions handled by this loader, without the leading dot.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parses `resource` into property sources named after `name`.
    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>>;

    fn can_load(&self, location: &str) -> bool {
        let location = location.to_ascii_lowercase();
        self.file_extensions()
            .iter()
            .any(|extension| location.ends_with(&format!(".{extension}")))
    }
}

#[derive(Default)]
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DocumentFormatLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties first, then YAML, TOML and JSON.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(PropertiesLoader)
            .register(YamlLoader)
            .register(TomlLoader)
            .register(JsonLoader)
    }

    pub fn register<L>(mut self, loader: L) -> Self
    where
        L: DocumentFormatLoader + 'static,
    {
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn get(&self, index: usize) -> Option<&dyn DocumentFormatLoader> {
        self.loaders.get(index).map(|loader| loader.as_ref())
    }

    /// Loaders paired with their registry index, which doubles as their identity.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &dyn DocumentFormatLoader)> {
        self.loaders
            .iter()
            .enumerate()
            .map(|(index, loader)| (index, loader.as_ref()))
    }

    /// First registered loader able to read a fully qualified file location.
    pub fn for_location(&self, location: &str) -> Option<usize> {
        self.iter()
            .find(|(_, loader)| loader.can_load(location))
            .map(|(index, _)| index)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.loaders.iter().map(|loader| loader.name()))
            .finish()
    }
}

/// Names the `index`-th of `total` documents in one resource.
pub(crate) fn document_name(name: &str, index: usize, total: usize) -> String {
    if total == 1 {
        name.to_string()
    } else {
        format!("{name} (document #{index})")
    }
}

/// Builds one property source per non-empty structured document, flattening
/// nested maps to dotted keys and sequences to `key[i]`.
pub(crate) fn structured_sources(
    name: &str,
    resource: &Resource,
    documents: Vec<Value>,
) -> Vec<PropertySource> {
    let flattened: Vec<Vec<(String, String)>> = documents
        .iter()
        .map(|document| {
            let mut entries = Vec::new();
            match document {
                Value::Object(_) => flatten(document, "", &mut entries),
                other => flatten(other, "document", &mut entries),
            }
            entries
        })
        .filter(|entries| !entries.is_empty())
        .collect();
    let total = flattened.len();
    flattened
        .into_iter()
        .enumerate()
        .map(|(index, entries)| {
            let mut source = PropertySource::new(document_name(name, index, total));
            for (key, value) in entries {
                let origin = Origin::in_document(resource.location(), index);
                source.insert(key, PropertyValue::with_origin(value, origin));
            }
            source
        })
        .collect()
}

pub(crate) fn flatten(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            if map.is_empty() && !prefix.is_empty() {
                out.push((prefix.to_string(), String::new()));
            }
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, &path, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push((prefix.to_string(), String::new()));
            }
            for (index, item) in items.iter().enumerate() {
                flatten(item, &format!("{prefix}[{index}]"), out);
            }
        }
        Value::String(text) => out.push((prefix.to_string(), text.clone())),
        Value::Null => out.push((prefix.to_string(), String::new())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_structures() {
        let document = serde_json::json!({
            "server": { "port": 8080, "hosts": ["a", "b"], "tls": {} },
            "debug": true,
            "empty": null
        });
        let mut entries = Vec::new();
        flatten(&document, "", &mut entries);
        entries.sort();
        assert_eq!(
            entries,
            vec![
                ("debug".to_string(), "true".to_string()),
                ("empty".to_string(), String::new()),
                ("server.hosts[0]".to_string(), "a".to_string()),
                ("server.hosts[1]".to_string(), "b".to_string()),
                ("server.port".to_string(), "8080".to_string()),
                ("server.tls".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn registry_resolves_by_extension_in_order() {
        let registry = LoaderRegistry::with_defaults();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.for_location("file:./custom.YML"), Some(1));
        assert_eq!(registry.for_location("classpath:/app.properties"), Some(0));
        assert_eq!(registry.for_location("file:./custom.ini"), None);
        assert_eq!(registry.for_location("file:./config/"), None);
    }

    #[test]
    fn document_names_only_numbered_when_several() {
        assert_eq!(document_name("cfg", 0, 1), "cfg");
        assert_eq!(document_name("cfg", 1, 3), "cfg (document #1)");
    }
}
