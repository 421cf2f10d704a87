use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::environment::{DEFAULT_PROPERTIES, Environment};
use crate::error::{ConfigError, Result};
use crate::format::flatten;
use crate::loader::ConfigurationLoader;
use crate::property_source::{Origin, PropertySource, PropertyValue};
use crate::resource::FileSystemResourceLoader;

const SETTINGS_FILE_BASENAME: &str = "settings.yaml";

/// Settings of the engine itself, as opposed to the configuration it loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Comma list replacing the built-in search locations.
    #[serde(default)]
    pub search_locations: Option<String>,
    /// Comma list replacing the built-in `application` name.
    #[serde(default)]
    pub search_names: Option<String>,
    /// Roots searched, in order, for `classpath:` locations.
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    #[serde(default)]
    pub default_profiles: Vec<String>,
    /// Installed as the lowest-precedence `defaultProperties` source.
    #[serde(default)]
    pub default_properties: Map<String, Value>,
}

impl EngineSettings {
    /// Reads YAML, or TOML when the file ends in `.toml`. A missing file
    /// yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Settings {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let parsed = if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
            toml::from_str(&contents).map_err(|err| err.to_string())
        } else if contents.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_yaml::from_str(&contents).map_err(|err| err.to_string())
        };
        parsed.map_err(|message| ConfigError::Settings {
            path: path.to_path_buf(),
            message,
        })
    }

    /// `settings.yaml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "layercfg", "layercfg")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_BASENAME))
    }

    pub fn loader(&self) -> ConfigurationLoader {
        let mut loader = ConfigurationLoader::new();
        if let Some(locations) = &self.search_locations {
            loader = loader.with_search_locations(locations.clone());
        }
        if let Some(names) = &self.search_names {
            loader = loader.with_search_names(names.clone());
        }
        loader
    }

    /// A filesystem resource loader rooted at `base_dir` with the configured
    /// classpath roots, falling back to `base_dir` as the only root.
    pub fn resource_loader(&self, base_dir: &Path) -> FileSystemResourceLoader {
        let roots: Vec<PathBuf> = if self.classpath.is_empty() {
            vec![base_dir.to_path_buf()]
        } else {
            self.classpath
                .iter()
                .map(|root| {
                    if root.is_absolute() {
                        root.clone()
                    } else {
                        base_dir.join(root)
                    }
                })
                .collect()
        };
        roots
            .into_iter()
            .fold(FileSystemResourceLoader::new(base_dir), |loader, root| {
                loader.with_classpath_root(root)
            })
    }

    /// Installs default profiles and default properties on `environment`.
    pub fn apply_to(&self, environment: &mut Environment, origin: &str) -> Result<()> {
        if !self.default_profiles.is_empty() {
            environment.set_default_profiles(self.default_profiles.clone())?;
        }
        if !self.default_properties.is_empty() {
            let mut entries = Vec::new();
            flatten(&Value::Object(self.default_properties.clone()), "", &mut entries);
            let mut source = PropertySource::new(DEFAULT_PROPERTIES);
            for (key, value) in entries {
                source.insert(
                    key,
                    PropertyValue::with_origin(value, Origin::in_document(origin, 0)),
                );
            }
            environment.set_default_properties(source);
        }
        Ok(())
    }
}
