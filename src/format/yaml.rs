use serde::Deserialize;

use super::{DocumentFormatLoader, structured_sources};
use crate::error::{ConfigError, Result};
use crate::property_source::PropertySource;
use crate::resource::Resource;

/// Multi-document YAML; empty documents are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlLoader;

impl DocumentFormatLoader for YamlLoader {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>> {
        let contents = resource.read_to_string()?;
        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(&contents) {
            let mut value = serde_yaml::Value::deserialize(document)
                .map_err(|e| ConfigError::parse(resource.location(), e))?;
            if value.is_null() {
                continue;
            }
            value
                .apply_merge()
                .map_err(|e| ConfigError::parse(resource.location(), e))?;
            let json = serde_json::to_value(&value)
                .map_err(|e| ConfigError::parse(resource.location(), e))?;
            documents.push(json);
        }
        Ok(structured_sources(name, resource, documents))
    }
}
