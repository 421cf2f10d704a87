//! Profiles: named configuration variants and the unscoped marker.

mod activation;
mod expression;

use std::fmt;
use std::hash::{Hash, Hasher};

pub(crate) use activation::profiles_as_set;
pub use activation::{ProfileActivation, profiles_from_property};
pub use expression::ProfileExpression;

/// A profile to load documents for.
///
/// `Unscoped` stands for "no profile": it selects documents that declare no
/// profiles and is always processed first. Named profiles compare and hash
/// by name only, so a default profile equals an explicit one of the same name.
#[derive(Debug, Clone)]
pub enum Profile {
    Unscoped,
    Named { name: String, is_default: bool },
}

impl Profile {
    pub fn named(name: impl Into<String>) -> Self {
        Profile::Named {
            name: name.into(),
            is_default: false,
        }
    }

    /// A profile queued only because nothing else was active.
    pub fn default_profile(name: impl Into<String>) -> Self {
        Profile::Named {
            name: name.into(),
            is_default: true,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Profile::Unscoped => None,
            Profile::Named { name, .. } => Some(name),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Profile::Named { is_default: true, .. })
    }

    pub fn is_unscoped(&self) -> bool {
        matches!(self, Profile::Unscoped)
    }

    /// Named and explicitly requested rather than a fallback default.
    pub fn is_explicit(&self) -> bool {
        matches!(self, Profile::Named { is_default: false, .. })
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Unscoped => write!(f, "(no profile)"),
            Profile::Named { name, .. } => write!(f, "{name}"),
        }
    }
}
