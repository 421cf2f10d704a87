//! End-to-end configuration load.
//!
//! [`ConfigurationLoader`] is the reusable, immutable part: where to search,
//! which format loaders exist, how reserved keys are bound. Each call to
//! [`ConfigurationLoader::process`] runs a private [`LoadRun`] that owns the
//! profile queue, the document cache and the collected sources, so
//! concurrent loads of separate environments never share state.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::binder::{Binder, PropertyBinder};
use crate::cache::DocumentCache;
use crate::diagnostics::{DiagnosticsSink, Event};
use crate::environment::{
    ACTIVE_PROFILES_PROPERTY, DEFAULT_PROPERTIES, Environment, INCLUDE_PROFILES_PROPERTY,
};
use crate::error::{ConfigError, Result};
use crate::filter::{DocumentFilter, FilterKind};
use crate::format::{DocumentFormatLoader, LoaderRegistry};
use crate::merge::{MergeMode, PropertySourceMerger};
use crate::profile::{Profile, ProfileActivation};
use crate::resource::ResourceLoader;
use crate::search::{SearchPathResolver, is_directory};

const SOURCE_NAME_PREFIX: &str = "applicationConfig";

/// What a load looked at and what it changed.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Locations in probe order (highest precedence first).
    pub locations: Vec<String>,
    pub names: Vec<String>,
    /// Profiles in the order they were processed, starting with the unscoped one.
    pub processed_profiles: Vec<Profile>,
    /// Names of the sources spliced into the environment, in chain order.
    pub added_sources: Vec<String>,
    /// The active profiles written back to the environment.
    pub active_profiles: Vec<String>,
}

pub struct ConfigurationLoader {
    search: SearchPathResolver,
    registry: LoaderRegistry,
    binder: Box<dyn Binder>,
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigurationLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationLoader")
            .field("search", &self.search)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            search: SearchPathResolver::new(),
            registry: LoaderRegistry::with_defaults(),
            binder: Box::new(PropertyBinder),
        }
    }

    pub fn with_search_locations(mut self, locations: impl Into<String>) -> Self {
        self.search = self.search.with_locations(locations);
        self
    }

    pub fn with_search_names(mut self, names: impl Into<String>) -> Self {
        self.search = self.search.with_names(names);
        self
    }

    pub fn with_registry(mut self, registry: LoaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_binder(mut self, binder: impl Binder + 'static) -> Self {
        self.binder = Box::new(binder);
        self
    }

    /// The locations and names a load of `environment` would probe.
    pub fn search_path(&self, environment: &Environment) -> Result<(Vec<String>, Vec<String>)> {
        Ok((
            self.search.locations(environment)?,
            self.search.names(environment)?,
        ))
    }

    /// Loads every matching configuration document into `environment`.
    ///
    /// While the load runs, `defaultProperties` is swapped for a copy without
    /// the profile activation keys; the original is put back whether or not
    /// the load succeeds. On success the environment's active profiles are
    /// replaced with the final computed list.
    pub fn process(
        &self,
        environment: &mut Environment,
        resources: &dyn ResourceLoader,
        sink: &dyn DiagnosticsSink,
    ) -> Result<LoadReport> {
        let original = environment
            .property_sources()
            .get(DEFAULT_PROPERTIES)
            .cloned();
        if let Some(defaults) = &original {
            let filtered =
                defaults.without_keys(&[ACTIVE_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY]);
            environment.property_sources_mut().replace(Arc::new(filtered));
        }
        let outcome = self.run(environment, resources, sink);
        if let Some(defaults) = &original {
            environment
                .property_sources_mut()
                .replace(Arc::clone(defaults));
        }
        let (mut report, activation) = outcome?;

        let active =
            activation.final_active_profiles(original.as_deref(), self.binder.as_ref(), environment)?;
        environment.set_active_profiles(active.clone())?;
        report.active_profiles = active;
        Ok(report)
    }

    fn run(
        &self,
        environment: &mut Environment,
        resources: &dyn ResourceLoader,
        sink: &dyn DiagnosticsSink,
    ) -> Result<(LoadReport, ProfileActivation)> {
        // Resolve search paths up front so a bad location fails before any load.
        let (locations, names) = self.search_path(environment)?;
        let activation = ProfileActivation::initialize(environment, self.binder.as_ref(), sink)?;
        let run = LoadRun {
            loader: self,
            environment,
            resources,
            sink,
            locations: &locations,
            names: &names,
            activation,
            merger: PropertySourceMerger::new(),
            cache: DocumentCache::new(),
        };
        let (added_sources, activation) = run.load()?;
        let report = LoadReport {
            processed_profiles: activation.processed().to_vec(),
            locations,
            names,
            added_sources,
            active_profiles: Vec::new(),
        };
        Ok((report, activation))
    }
}

/// State of one load.
struct LoadRun<'a> {
    loader: &'a ConfigurationLoader,
    environment: &'a mut Environment,
    resources: &'a dyn ResourceLoader,
    sink: &'a dyn DiagnosticsSink,
    locations: &'a [String],
    names: &'a [String],
    activation: ProfileActivation,
    merger: PropertySourceMerger,
    cache: DocumentCache,
}

impl<'a> LoadRun<'a> {
    fn loader_ref(&self) -> &'a ConfigurationLoader {
        self.loader
    }

    fn load(mut self) -> Result<(Vec<String>, ProfileActivation)> {
        while let Some(profile) = self.activation.next_pending() {
            if profile.is_explicit()
                && let Some(name) = profile.name()
            {
                self.add_profile_to_environment(name)?;
            }
            self.load_profile(&profile, FilterKind::Positive, MergeMode::Append)?;
            self.activation.mark_processed(profile);
        }
        self.load_profile(
            &Profile::Unscoped,
            FilterKind::Negative,
            MergeMode::PrependIfAbsent,
        )?;
        let added = self
            .merger
            .splice_into(self.environment.property_sources_mut());
        Ok((added, self.activation))
    }

    fn add_profile_to_environment(&mut self, name: &str) -> Result<()> {
        if self.environment.active_profiles()?.iter().any(|p| p == name) {
            return Ok(());
        }
        self.environment.add_active_profile(name)
    }

    fn load_profile(&mut self, profile: &Profile, kind: FilterKind, mode: MergeMode) -> Result<()> {
        let locations = self.locations;
        let names = self.names;
        for location in locations {
            if is_directory(location) {
                for name in names {
                    self.load_named(location, name, profile, kind, mode)?;
                }
            } else {
                self.load_exact(location, profile, kind, mode)?;
            }
        }
        Ok(())
    }

    /// A location that names a file: one loader must claim its extension.
    fn load_exact(
        &mut self,
        location: &str,
        profile: &Profile,
        kind: FilterKind,
        mode: MergeMode,
    ) -> Result<()> {
        let registry = &self.loader_ref().registry;
        let Some(index) = registry.for_location(location) else {
            return Err(ConfigError::UnknownExtension(location.to_string()));
        };
        let Some(format) = registry.get(index) else {
            return Err(ConfigError::UnknownExtension(location.to_string()));
        };
        let filter = DocumentFilter::new(kind, profile.clone());
        self.load_resource(index, format, location, profile, &filter, mode)
    }

    /// A directory plus a file stem, probed once per known extension; the
    /// first loader to declare an extension owns it.
    fn load_named(
        &mut self,
        location: &str,
        name: &str,
        profile: &Profile,
        kind: FilterKind,
        mode: MergeMode,
    ) -> Result<()> {
        let registry = &self.loader_ref().registry;
        let prefix = format!("{location}{name}");
        let mut claimed = HashSet::new();
        for (index, format) in registry.iter() {
            for extension in format.file_extensions() {
                if claimed.insert(*extension) {
                    self.load_for_extension(index, format, &prefix, extension, profile, kind, mode)?;
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn load_for_extension(
        &mut self,
        index: usize,
        format: &dyn DocumentFormatLoader,
        prefix: &str,
        extension: &str,
        profile: &Profile,
        kind: FilterKind,
        mode: MergeMode,
    ) -> Result<()> {
        let profile_filter = DocumentFilter::new(kind, profile.clone());
        if let Some(name) = profile.name() {
            let default_filter = DocumentFilter::new(kind, Profile::Unscoped);
            let specific = format!("{prefix}-{name}.{extension}");
            self.load_resource(index, format, &specific, profile, &default_filter, mode)?;
            self.load_resource(index, format, &specific, profile, &profile_filter, mode)?;
            // Sections for this profile inside files of profiles already seen.
            let previous: Vec<String> = self
                .activation
                .processed()
                .iter()
                .filter_map(|processed| processed.name().map(str::to_string))
                .collect();
            for processed in previous {
                let location = format!("{prefix}-{processed}.{extension}");
                self.load_resource(index, format, &location, profile, &profile_filter, mode)?;
            }
        }
        let location = format!("{prefix}.{extension}");
        self.load_resource(index, format, &location, profile, &profile_filter, mode)
    }

    fn load_resource(
        &mut self,
        index: usize,
        format: &dyn DocumentFormatLoader,
        location: &str,
        profile: &Profile,
        filter: &DocumentFilter,
        mode: MergeMode,
    ) -> Result<()> {
        self.try_load_resource(index, format, location, profile, filter, mode)
            .map_err(|source| ConfigError::LoadFailed {
                location: location.to_string(),
                source: Box::new(source),
            })
    }

    fn try_load_resource(
        &mut self,
        index: usize,
        format: &dyn DocumentFormatLoader,
        location: &str,
        profile: &Profile,
        filter: &DocumentFilter,
        mode: MergeMode,
    ) -> Result<()> {
        let resource = self.resources.resource(location);
        let event_profile = profile.name().map(str::to_string);
        if !resource.exists() {
            self.sink.record(Event::SkippedMissing {
                location: location.to_string(),
                profile: event_profile,
            });
            return Ok(());
        }
        if resource.extension().is_none() {
            self.sink.record(Event::SkippedNoExtension {
                location: location.to_string(),
                profile: event_profile,
            });
            return Ok(());
        }
        let name = format!("{SOURCE_NAME_PREFIX}: [{location}]");
        let documents = self.cache.get(
            index,
            format,
            &name,
            &resource,
            self.loader.binder.as_ref(),
            &*self.environment,
        )?;
        if documents.is_empty() {
            self.sink.record(Event::SkippedEmpty {
                location: location.to_string(),
                profile: event_profile,
            });
            return Ok(());
        }
        let mut matched = Vec::new();
        for document in documents.iter() {
            if filter.matches(document, &*self.environment)? {
                self.activation
                    .activate(document.active_profiles.clone(), self.sink);
                self.activation
                    .include(document.include_profiles.clone(), self.sink);
                matched.push(Arc::clone(&document.source));
            }
        }
        if matched.is_empty() {
            return Ok(());
        }
        // The last document of a file outranks the earlier ones.
        matched.reverse();
        for source in matched {
            self.merger.accept(profile, source, mode);
        }
        self.sink.record(Event::Loaded {
            location: location.to_string(),
            profile: event_profile,
        });
        Ok(())
    }
}
