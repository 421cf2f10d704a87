use java_properties::{LineContent, PropertiesIter};

use super::DocumentFormatLoader;
use crate::error::{ConfigError, Result};
use crate::property_source::{Origin, PropertySource, PropertyValue};
use crate::resource::Resource;

/// `key=value` files. Values keep the line and column of their key.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertiesLoader;

impl DocumentFormatLoader for PropertiesLoader {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["properties"]
    }

    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>> {
        let contents = resource.read_to_string()?;
        let raw_lines: Vec<&str> = contents.lines().collect();
        let mut source = PropertySource::new(name);
        let lines = PropertiesIter::new_with_encoding(contents.as_bytes(), encoding_rs::UTF_8);
        for line in lines {
            let line = line.map_err(|err| ConfigError::parse(resource.location(), err))?;
            let number = line.line_number();
            if let LineContent::KVPair(key, value) = line.consume_content() {
                let origin = Origin::at(resource.location(), number, key_column(&raw_lines, number));
                source.insert(key, PropertyValue::with_origin(value, origin));
            }
        }
        if source.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![source])
    }
}

/// One-based column of the first non-blank character on a one-based line.
fn key_column(raw_lines: &[&str], line: usize) -> usize {
    line.checked_sub(1)
        .and_then(|index| raw_lines.get(index))
        .map(|raw| raw.chars().take_while(|c| c.is_whitespace()).count() + 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn load(content: &str) -> Result<Vec<PropertySource>> {
        let resource = Resource::in_memory(
            "classpath:/application.properties",
            Some(Arc::from(content)),
        );
        PropertiesLoader.load("applicationConfig: [classpath:/application.properties]", &resource)
    }

    #[test]
    fn parses_separators_comments_and_origins() {
        let sources = load("# comment\nx=1\n  y : two words\n! other\nz 3\nempty=\n")
            .expect("load");
        assert_eq!(sources.len(), 1);
        let source = &sources[0];
        assert_eq!(source.get_str("x"), Some("1"));
        assert_eq!(source.get_str("y"), Some("two words"));
        assert_eq!(source.get_str("z"), Some("3"));
        assert_eq!(source.get_str("empty"), Some(""));
        let origin = source.get("y").and_then(|v| v.origin.clone()).expect("origin");
        assert_eq!((origin.line, origin.column), (Some(3), Some(3)));
    }

    #[test]
    fn handles_continuations_and_escapes() {
        let sources = load("list=a,\\\n    b,\\\n    c\nkey\\=with\\:sep=v\\tx\nsnow=\\u2603\n")
            .expect("load");
        let source = &sources[0];
        assert_eq!(source.get_str("list"), Some("a,b,c"));
        let origin = source.get("snow").and_then(|v| v.origin.clone()).expect("origin");
        assert_eq!(origin.line, Some(5));
        assert_eq!(source.get_str("key=with:sep"), Some("v\tx"));
        assert_eq!(source.get_str("snow"), Some("\u{2603}"));
    }

    #[test]
    fn empty_file_yields_no_documents() {
        assert!(load("# only comments\n\n").expect("load").is_empty());
    }

    #[test]
    fn malformed_unicode_escape_is_a_parse_error() {
        assert!(matches!(load("a=\\u12"), Err(ConfigError::Parse { .. })));
    }
}
