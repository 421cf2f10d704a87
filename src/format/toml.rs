use serde_json::{Map, Number, Value};

use super::{DocumentFormatLoader, structured_sources};
use crate::error::{ConfigError, Result};
use crate::property_source::PropertySource;
use crate::resource::Resource;

#[derive(Debug, Default, Clone, Copy)]
pub struct TomlLoader;

impl DocumentFormatLoader for TomlLoader {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>> {
        let contents = resource.read_to_string()?;
        let table: ::toml::Table = contents
            .parse()
            .map_err(|e: ::toml::de::Error| ConfigError::parse(resource.location(), e))?;
        let document = to_json(::toml::Value::Table(table));
        Ok(structured_sources(name, resource, vec![document]))
    }
}

fn to_json(value: ::toml::Value) -> Value {
    match value {
        ::toml::Value::String(text) => Value::String(text),
        ::toml::Value::Integer(number) => Value::Number(number.into()),
        ::toml::Value::Float(number) => Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(number.to_string())),
        ::toml::Value::Boolean(flag) => Value::Bool(flag),
        ::toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        ::toml::Value::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        ::toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, to_json(value)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
