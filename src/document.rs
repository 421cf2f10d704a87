use std::sync::Arc;

use crate::binder::Binder;
use crate::environment::{ACTIVE_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY};
use crate::error::Result;
use crate::placeholder::PlaceholderResolver;
use crate::profile::{Profile, profiles_as_set};
use crate::property_source::PropertySource;

/// Reserved key listing the profiles a document applies to.
pub const DECLARED_PROFILES_PROPERTY: &str = "profiles";

/// One parsed unit of configuration plus the profile metadata read from its
/// own reserved keys.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: Arc<PropertySource>,
    pub declared_profiles: Vec<String>,
    pub active_profiles: Vec<Profile>,
    pub include_profiles: Vec<Profile>,
}

impl Document {
    pub fn from_source(
        source: PropertySource,
        binder: &dyn Binder,
        placeholders: &dyn PlaceholderResolver,
    ) -> Result<Self> {
        let sources = [&source];
        let declared_profiles = binder
            .bind_list(&sources, DECLARED_PROFILES_PROPERTY, placeholders)?
            .unwrap_or_default();
        let active_profiles = profiles_as_set(
            binder
                .bind_list(&sources, ACTIVE_PROFILES_PROPERTY, placeholders)?
                .unwrap_or_default(),
        );
        let include_profiles = profiles_as_set(
            binder
                .bind_list(&sources, INCLUDE_PROFILES_PROPERTY, placeholders)?
                .unwrap_or_default(),
        );
        Ok(Self {
            source: Arc::new(source),
            declared_profiles,
            active_profiles,
            include_profiles,
        })
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn is_profile_specific(&self) -> bool {
        !self.declared_profiles.is_empty()
    }
}
