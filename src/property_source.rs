//! Named key/value sources and the ordered chain they are merged into.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Where a value came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<usize>,
}

impl Origin {
    pub fn at(resource: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            resource: resource.into(),
            line: Some(line),
            column: Some(column),
            document: None,
        }
    }

    pub fn in_document(resource: impl Into<String>, document: usize) -> Self {
        Self {
            resource: resource.into(),
            line: None,
            column: None,
            document: Some(document),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, ":{line}:{column}")?;
        }
        if let Some(document) = self.document {
            write!(f, " (document #{document})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    pub value: String,
    pub origin: Option<Origin>,
}

impl PropertyValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: None,
        }
    }

    pub fn with_origin(value: impl Into<String>, origin: Origin) -> Self {
        Self {
            value: value.into(),
            origin: Some(origin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Map,
    /// Keys also match their `UPPER_SNAKE` environment-variable form.
    SystemEnvironment,
}

/// An insertion-ordered, named mapping of dotted keys to values.
#[derive(Debug, Clone)]
pub struct PropertySource {
    name: String,
    kind: SourceKind,
    entries: Vec<(String, PropertyValue)>,
    index: HashMap<String, usize>,
}

impl PropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Map,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_pairs<I, K, V>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new(name);
        for (key, value) in pairs {
            source.insert(key, PropertyValue::new(value));
        }
        source
    }

    /// Snapshot of the process environment, matched with relaxed key rules.
    pub fn system_environment() -> Self {
        let mut source = Self::from_pairs("systemEnvironment", std::env::vars());
        source.kind = SourceKind::SystemEnvironment;
        source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Inserts or replaces a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        if let Some(&position) = self.index.get(key) {
            return Some(&self.entries[position].1);
        }
        if self.kind == SourceKind::SystemEnvironment {
            let relaxed = environment_variable_name(key);
            return self
                .index
                .get(&relaxed)
                .map(|&position| &self.entries[position].1);
        }
        None
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).map(|value| value.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy under the same name with the given keys removed.
    pub fn without_keys(&self, keys: &[&str]) -> PropertySource {
        let mut filtered = PropertySource::new(self.name.clone());
        filtered.kind = self.kind;
        for (key, value) in &self.entries {
            if !keys.contains(&key.as_str()) {
                filtered.insert(key.clone(), value.clone());
            }
        }
        filtered
    }
}

fn environment_variable_name(key: &str) -> String {
    key.chars()
        .filter(|c| *c != ']')
        .map(|c| match c {
            '.' | '-' | '[' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Ordered chain of property sources; earlier sources take precedence.
/// Names are unique: adding a source removes any existing one of that name.
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
    sources: Vec<Arc<PropertySource>>,
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_first(&mut self, source: Arc<PropertySource>) {
        self.remove(source.name());
        self.sources.insert(0, source);
    }

    pub fn add_last(&mut self, source: Arc<PropertySource>) {
        self.remove(source.name());
        self.sources.push(source);
    }

    /// Returns `false` (and inserts nothing) when `relative` is absent.
    pub fn add_before(&mut self, relative: &str, source: Arc<PropertySource>) -> bool {
        if !self.contains(relative) || relative == source.name() {
            return false;
        }
        self.remove(source.name());
        let Some(position) = self.position(relative) else {
            return false;
        };
        self.sources.insert(position, source);
        true
    }

    /// Returns `false` (and inserts nothing) when `relative` is absent.
    pub fn add_after(&mut self, relative: &str, source: Arc<PropertySource>) -> bool {
        if !self.contains(relative) || relative == source.name() {
            return false;
        }
        self.remove(source.name());
        let Some(position) = self.position(relative) else {
            return false;
        };
        self.sources.insert(position + 1, source);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<PropertySource>> {
        let position = self.position(name)?;
        Some(self.sources.remove(position))
    }

    /// Swaps the source named like `source` in place, returning the old one.
    pub fn replace(&mut self, source: Arc<PropertySource>) -> Option<Arc<PropertySource>> {
        let position = self.position(source.name())?;
        Some(std::mem::replace(&mut self.sources[position], source))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PropertySource>> {
        self.sources.iter().find(|source| source.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PropertySource>> {
        self.sources.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The value from the highest-precedence source that has `key`.
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|source| source.name() == name)
    }
}
