use super::{DocumentFormatLoader, structured_sources};
use crate::error::{ConfigError, Result};
use crate::property_source::PropertySource;
use crate::resource::Resource;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoader;

impl DocumentFormatLoader for JsonLoader {
    fn name(&self) -> &'static str {
        "json"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>> {
        let contents = resource.read_to_string()?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::parse(resource.location(), e))?;
        Ok(structured_sources(name, resource, vec![value]))
    }
}
