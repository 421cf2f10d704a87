//! The destination of a configuration load: a property-source chain plus the
//! active and default profile sets that documents are matched against.

use std::sync::Arc;

use crate::binder::split_list;
use crate::error::{ConfigError, Result};
use crate::placeholder::{PlaceholderResolver, resolve_with};
use crate::profile::ProfileExpression;
use crate::property_source::{PropertySource, PropertySources};

/// Name of the reserved lowest-precedence source of explicit defaults.
pub const DEFAULT_PROPERTIES: &str = "defaultProperties";

pub const ACTIVE_PROFILES_PROPERTY: &str = "profiles.active";
pub const INCLUDE_PROFILES_PROPERTY: &str = "profiles.include";
pub const DEFAULT_PROFILES_PROPERTY: &str = "profiles.default";

const RESERVED_DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone)]
pub struct Environment {
    sources: PropertySources,
    active_profiles: Vec<String>,
    default_profiles: Vec<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::with_sources(PropertySources::new())
    }

    pub fn with_sources(sources: PropertySources) -> Self {
        Self {
            sources,
            active_profiles: Vec::new(),
            default_profiles: vec![RESERVED_DEFAULT_PROFILE.to_string()],
        }
    }

    pub fn property_sources(&self) -> &PropertySources {
        &self.sources
    }

    pub fn property_sources_mut(&mut self) -> &mut PropertySources {
        &mut self.sources
    }

    /// Installs `properties` as the reserved `defaultProperties` source at the tail.
    pub fn set_default_properties(&mut self, mut properties: PropertySource) {
        if properties.name() != DEFAULT_PROPERTIES {
            let renamed = PropertySource::new(DEFAULT_PROPERTIES);
            properties = properties
                .entries()
                .fold(renamed, |mut acc, (key, value)| {
                    acc.insert(key, value.clone());
                    acc
                });
        }
        self.sources.add_last(Arc::new(properties));
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.sources.get_property(key).is_some()
    }

    pub fn get_property(&self, key: &str) -> Result<Option<String>> {
        match self.sources.get_property(key) {
            Some(value) => Ok(Some(self.resolve_placeholders(&value.value)?)),
            None => Ok(None),
        }
    }

    /// Explicitly set profiles, or those named by `profiles.active` when none were set.
    pub fn active_profiles(&self) -> Result<Vec<String>> {
        if !self.active_profiles.is_empty() {
            return Ok(self.active_profiles.clone());
        }
        Ok(self
            .get_property(ACTIVE_PROFILES_PROPERTY)?
            .map(|value| split_list(&value))
            .unwrap_or_default())
    }

    pub fn add_active_profile(&mut self, profile: &str) -> Result<()> {
        validate_profile(profile)?;
        if self.active_profiles.is_empty() {
            self.active_profiles = self.active_profiles()?;
        }
        if !self.active_profiles.iter().any(|p| p == profile) {
            self.active_profiles.push(profile.to_string());
        }
        Ok(())
    }

    pub fn set_active_profiles(&mut self, profiles: Vec<String>) -> Result<()> {
        let mut deduplicated: Vec<String> = Vec::with_capacity(profiles.len());
        for profile in profiles {
            validate_profile(&profile)?;
            if !deduplicated.contains(&profile) {
                deduplicated.push(profile);
            }
        }
        self.active_profiles = deduplicated;
        Ok(())
    }

    /// Explicit defaults, or `profiles.default` while only the reserved
    /// `default` profile is configured.
    pub fn default_profiles(&self) -> Result<Vec<String>> {
        if self.default_profiles == [RESERVED_DEFAULT_PROFILE]
            && let Some(value) = self.get_property(DEFAULT_PROFILES_PROPERTY)?
        {
            return Ok(split_list(&value));
        }
        Ok(self.default_profiles.clone())
    }

    pub fn set_default_profiles(&mut self, profiles: Vec<String>) -> Result<()> {
        for profile in &profiles {
            validate_profile(profile)?;
        }
        self.default_profiles = profiles;
        Ok(())
    }

    /// True when any of `expressions` matches the current profile state.
    pub fn accepts_profiles(&self, expressions: &[String]) -> Result<bool> {
        let active = self.active_profiles()?;
        let defaults = if active.is_empty() {
            self.default_profiles()?
        } else {
            Vec::new()
        };
        let is_active = |name: &str| {
            active.iter().any(|p| p == name) || defaults.iter().any(|p| p == name)
        };
        for expression in expressions {
            if ProfileExpression::parse(expression)?.matches(&is_active) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl PlaceholderResolver for Environment {
    fn resolve_placeholders(&self, text: &str) -> Result<String> {
        resolve_with(text, |key| {
            self.sources.get_property(key).map(|value| value.value.clone())
        })
    }
}

fn validate_profile(profile: &str) -> Result<()> {
    if profile.trim().is_empty() {
        return Err(ConfigError::invalid_profile(profile, "profile name must contain text"));
    }
    if profile.starts_with('!') {
        return Err(ConfigError::invalid_profile(
            profile,
            "profile name must not begin with '!' when activated",
        ));
    }
    Ok(())
}
