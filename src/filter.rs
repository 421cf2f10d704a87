//! Deciding whether a parsed document applies under a profile.

use crate::document::Document;
use crate::environment::Environment;
use crate::error::Result;
use crate::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Documents for exactly this profile (or profile-less documents for the
    /// unscoped profile).
    Positive,
    /// Profile-restricted documents found in unscoped files, picked up once
    /// after every profile has been processed.
    Negative,
}

#[derive(Debug, Clone)]
pub struct DocumentFilter {
    kind: FilterKind,
    profile: Profile,
}

impl DocumentFilter {
    pub fn new(kind: FilterKind, profile: Profile) -> Self {
        Self { kind, profile }
    }

    pub fn matches(&self, document: &Document, environment: &Environment) -> Result<bool> {
        match self.kind {
            FilterKind::Positive => positive_match(&self.profile, document, environment),
            FilterKind::Negative => negative_match(&self.profile, document, environment),
        }
    }
}

pub fn positive_match(
    profile: &Profile,
    document: &Document,
    environment: &Environment,
) -> Result<bool> {
    match profile.name() {
        None => Ok(document.declared_profiles.is_empty()),
        Some(name) => Ok(document.declared_profiles.iter().any(|p| p == name)
            && environment.accepts_profiles(&document.declared_profiles)?),
    }
}

pub fn negative_match(
    profile: &Profile,
    document: &Document,
    environment: &Environment,
) -> Result<bool> {
    Ok(profile.is_unscoped()
        && !document.declared_profiles.is_empty()
        && environment.accepts_profiles(&document.declared_profiles)?)
}
