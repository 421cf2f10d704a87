//! Which locations and file names a load probes, in probe order.
//!
//! Configured lists read from lowest to highest precedence (later wins, like
//! a map merge). The resolved lists are reversed so the first probed entry is
//! the highest-precedence one, matching how loaded sources are appended.

use crate::environment::Environment;
use crate::error::{ConfigError, Result};
use crate::placeholder::PlaceholderResolver;
use crate::resource::{CLASSPATH_PREFIX, FILE_PREFIX};

pub const CONFIG_NAME_PROPERTY: &str = "config.name";
pub const CONFIG_LOCATION_PROPERTY: &str = "config.location";
pub const CONFIG_ADDITIONAL_LOCATION_PROPERTY: &str = "config.additional-location";

pub const DEFAULT_SEARCH_LOCATIONS: &str = "classpath:/,classpath:/config/,file:./,file:./config/";
pub const DEFAULT_NAMES: &str = "application";

const CLASSPATH_ALL_PREFIX: &str = "classpath*:";

#[derive(Debug, Clone, Default)]
pub struct SearchPathResolver {
    locations: Option<String>,
    names: Option<String>,
}

impl SearchPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the built-in default locations (still overridden by `config.location`).
    pub fn with_locations(mut self, locations: impl Into<String>) -> Self {
        self.locations = Some(locations.into());
        self
    }

    /// Replaces the built-in default names (still overridden by `config.name`).
    pub fn with_names(mut self, names: impl Into<String>) -> Self {
        self.names = Some(names.into());
        self
    }

    /// Locations in probe order: additional locations first, then either
    /// `config.location` or the configured defaults.
    pub fn locations(&self, environment: &Environment) -> Result<Vec<String>> {
        let mut locations = override_locations(environment, CONFIG_ADDITIONAL_LOCATION_PROPERTY)?;
        let rest = if environment.contains_property(CONFIG_LOCATION_PROPERTY) {
            let overridden = override_locations(environment, CONFIG_LOCATION_PROPERTY)?;
            if overridden.is_empty() {
                return Err(blank(CONFIG_LOCATION_PROPERTY));
            }
            overridden
        } else {
            let configured = non_empty(&self.locations, "search locations")?;
            resolved_set(environment, configured.unwrap_or(DEFAULT_SEARCH_LOCATIONS))?
        };
        for location in rest {
            if !locations.contains(&location) {
                locations.push(location);
            }
        }
        Ok(locations)
    }

    /// File stems in probe order.
    pub fn names(&self, environment: &Environment) -> Result<Vec<String>> {
        if let Some(value) = environment.get_property(CONFIG_NAME_PROPERTY)? {
            let names = resolved_set(environment, &value)?;
            if names.is_empty() {
                return Err(blank(CONFIG_NAME_PROPERTY));
            }
            return Ok(names);
        }
        let configured = non_empty(&self.names, "search names")?;
        resolved_set(environment, configured.unwrap_or(DEFAULT_NAMES))
    }
}

/// Directories end in `/` and are combined with every search name.
pub fn is_directory(location: &str) -> bool {
    location.ends_with('/')
}

fn blank(what: &str) -> ConfigError {
    ConfigError::InvalidSearchPath(format!("{what} must not be empty"))
}

fn non_empty<'a>(value: &'a Option<String>, what: &str) -> Result<Option<&'a str>> {
    match value {
        Some(text) if text.trim().is_empty() => Err(blank(what)),
        Some(text) => Ok(Some(text)),
        None => Ok(None),
    }
}

fn override_locations(environment: &Environment, property: &str) -> Result<Vec<String>> {
    let Some(value) = environment.get_property(property)? else {
        return Ok(Vec::new());
    };
    let mut locations = Vec::new();
    for path in resolved_set(environment, &value)? {
        let path = if path.contains('$') {
            path
        } else {
            let cleaned = clean_path(&path);
            if cleaned.starts_with(CLASSPATH_ALL_PREFIX) {
                return Err(ConfigError::WildcardLocation(cleaned));
            }
            if is_url(&cleaned) {
                cleaned
            } else {
                format!("{FILE_PREFIX}{cleaned}")
            }
        };
        if !locations.contains(&path) {
            locations.push(path);
        }
    }
    Ok(locations)
}

/// Placeholder-resolves, splits on commas, trims, drops blanks, reverses and
/// removes duplicates keeping the first occurrence.
fn resolved_set(environment: &Environment, value: &str) -> Result<Vec<String>> {
    let resolved = environment.resolve_placeholders(value)?;
    let mut items: Vec<String> = resolved
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    items.reverse();
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    Ok(unique)
}

fn is_url(path: &str) -> bool {
    path.starts_with(CLASSPATH_PREFIX) || path.starts_with(FILE_PREFIX) || path.contains("://")
}

/// Normalizes separators and collapses `.` and `dir/..` segments, keeping any
/// `prefix:`, the `//` authority marker of a URL and the trailing `/` that
/// marks a directory.
pub fn clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (prefix, rest) = match path.split_once(':') {
        Some((prefix, rest)) if !prefix.contains('/') => (format!("{prefix}:"), rest.to_string()),
        _ => (String::new(), path.clone()),
    };
    let slashes = rest.len() - rest.trim_start_matches('/').len();
    let kept = match slashes {
        0 | 1 => slashes,
        _ if prefix.is_empty() => 1,
        _ => slashes.min(3),
    };
    let (root, body) = (&rest[..kept], &rest[slashes..]);
    let directory = body.ends_with('/') || (body.is_empty() && !root.is_empty());
    let mut segments: Vec<&str> = Vec::new();
    for segment in body.split('/') {
        match segment {
            "" | "." => {}
            ".." if segments.last().is_some_and(|last| *last != "..") => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut cleaned = segments.join("/");
    if directory && !cleaned.is_empty() {
        cleaned.push('/');
    }
    if !root.is_empty() {
        cleaned.insert_str(0, root);
    } else if cleaned.is_empty() && directory {
        cleaned.push_str("./");
    }
    format!("{prefix}{cleaned}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::property_source::PropertySource;

    fn environment(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        env.property_sources_mut().add_last(Arc::new(PropertySource::from_pairs(
            "commandLineArgs",
            pairs.iter().copied(),
        )));
        env
    }

    #[test]
    fn default_locations_are_reversed() {
        let locations = SearchPathResolver::new()
            .locations(&environment(&[]))
            .expect("locations");
        assert_eq!(
            locations,
            vec!["file:./config/", "file:./", "classpath:/config/", "classpath:/"]
        );
    }

    #[test]
    fn config_location_replaces_defaults_and_additional_prepends() {
        let env = environment(&[
            ("config.location", "classpath:/one/, ${base}/two/"),
            ("config.additional-location", "file:/etc/app/"),
            ("base", "/opt"),
        ]);
        let locations = SearchPathResolver::new().locations(&env).expect("locations");
        assert_eq!(
            locations,
            vec!["file:/etc/app/", "file:/opt/two/", "classpath:/one/"]
        );
    }

    #[test]
    fn wildcard_locations_are_rejected() {
        let env = environment(&[("config.location", "classpath*:/nope/")]);
        let err = SearchPathResolver::new()
            .locations(&env)
            .expect_err("wildcard");
        assert!(matches!(err, ConfigError::WildcardLocation(_)));
    }

    #[test]
    fn names_from_property_override_configured_ones() {
        let resolver = SearchPathResolver::new().with_names("app, service");
        assert_eq!(
            resolver.names(&environment(&[])).expect("names"),
            vec!["service", "app"]
        );
        let env = environment(&[("config.name", "custom")]);
        assert_eq!(resolver.names(&env).expect("names"), vec!["custom"]);
    }

    #[test]
    fn empty_configured_locations_are_invalid() {
        let resolver = SearchPathResolver::new().with_locations("  ");
        assert!(matches!(
            resolver.locations(&environment(&[])),
            Err(ConfigError::InvalidSearchPath(_))
        ));
    }

    #[test]
    fn blank_config_location_is_invalid() {
        let env = environment(&[("config.location", " , ")]);
        assert!(matches!(
            SearchPathResolver::new().locations(&env),
            Err(ConfigError::InvalidSearchPath(_))
        ));
    }

    #[test]
    fn blank_config_name_is_invalid() {
        let env = environment(&[("config.name", "")]);
        assert!(matches!(
            SearchPathResolver::new().names(&env),
            Err(ConfigError::InvalidSearchPath(_))
        ));
    }

    #[test]
    fn url_locations_keep_their_authority() {
        assert_eq!(
            clean_path("https://config.example.com/app/"),
            "https://config.example.com/app/"
        );
        assert_eq!(clean_path("file:///etc/./app/"), "file:///etc/app/");
        let env = environment(&[("config.location", "https://config.example.com/app/")]);
        assert_eq!(
            SearchPathResolver::new().locations(&env).expect("locations"),
            vec!["https://config.example.com/app/"]
        );
    }

    #[test]
    fn cleans_paths() {
        assert_eq!(clean_path("file:./config/"), "file:config/");
        assert_eq!(clean_path("file:./"), "file:./");
        assert_eq!(clean_path("a\\b\\..\\c.yml"), "a/c.yml");
        assert_eq!(clean_path("/etc/./app/"), "/etc/app/");
        assert_eq!(clean_path("../shared/"), "../shared/");
        assert!(is_directory("classpath:/config/"));
        assert!(!is_directory("file:custom.yml"));
    }
}
