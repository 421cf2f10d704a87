//! Accumulating matched documents per profile and splicing them into the
//! environment's chain.

use std::collections::HashSet;
use std::sync::Arc;

use crate::environment::{DEFAULT_PROPERTIES, Environment};
use crate::profile::Profile;
use crate::property_source::{PropertySource, PropertySources};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Positive pass: later documents of a profile gain precedence.
    Append,
    /// Negative pass: goes to the front of the profile's list, skipped when a
    /// source of the same name was already collected under any profile.
    PrependIfAbsent,
}

/// Sources collected during one load, grouped by the profile being processed
/// when they matched. Groups keep first-insertion order.
#[derive(Debug, Default)]
pub struct PropertySourceMerger {
    loaded: Vec<(Profile, PropertySources)>,
}

impl PropertySourceMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, profile: &Profile, source: Arc<PropertySource>, mode: MergeMode) {
        if mode == MergeMode::PrependIfAbsent && self.contains(source.name()) {
            return;
        }
        let sources = self.group(profile);
        match mode {
            MergeMode::Append => sources.add_last(source),
            MergeMode::PrependIfAbsent => sources.add_first(source),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaded.iter().any(|(_, sources)| sources.contains(name))
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.iter().all(|(_, sources)| sources.is_empty())
    }

    /// Flattens the groups, last-processed profile first, and inserts them
    /// into `destination` just ahead of `defaultProperties` (or at the end).
    /// Returns the names added, in chain order.
    pub fn splice_into(&self, destination: &mut PropertySources) -> Vec<String> {
        let mut added = Vec::new();
        let mut seen = HashSet::new();
        let mut last_added: Option<String> = None;
        for (_, sources) in self.loaded.iter().rev() {
            for source in sources.iter() {
                if !seen.insert(source.name().to_string()) {
                    continue;
                }
                let placed = match &last_added {
                    Some(previous) => destination.add_after(previous, Arc::clone(source)),
                    None => destination.add_before(DEFAULT_PROPERTIES, Arc::clone(source)),
                };
                if !placed {
                    destination.add_last(Arc::clone(source));
                }
                last_added = Some(source.name().to_string());
                added.push(source.name().to_string());
            }
        }
        added
    }

    fn group(&mut self, profile: &Profile) -> &mut PropertySources {
        let index = match self.loaded.iter().position(|(key, _)| key == profile) {
            Some(index) => index,
            None => {
                self.loaded.push((profile.clone(), PropertySources::new()));
                self.loaded.len() - 1
            }
        };
        &mut self.loaded[index].1
    }
}

/// Moves `defaultProperties` to the end of the chain so it ranks below
/// everything inserted after it.
pub fn reorder_sources(environment: &mut Environment) {
    let sources = environment.property_sources_mut();
    if let Some(defaults) = sources.remove(DEFAULT_PROPERTIES) {
        sources.add_last(defaults);
    }
}
