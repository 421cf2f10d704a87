//! Structured diagnostics emitted while configuration files are resolved.
//!
//! The engine never writes to a global logger. Callers hand it a
//! [`DiagnosticsSink`]; the binary uses [`LogSink`] to forward to `log`, tests
//! use [`RecordingSink`] to assert on what happened.

use std::cell::RefCell;
use std::fmt;

use log::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The probed resource does not exist.
    SkippedMissing {
        location: String,
        profile: Option<String>,
    },
    /// The resource exists but its filename carries no extension.
    SkippedNoExtension {
        location: String,
        profile: Option<String>,
    },
    /// The resource parsed into zero documents.
    SkippedEmpty {
        location: String,
        profile: Option<String>,
    },
    /// At least one document of the resource matched and was merged.
    Loaded {
        location: String,
        profile: Option<String>,
    },
    ProfilesActivated { profiles: Vec<String> },
    /// Activation was requested after profiles had already been locked.
    ActivationIgnored { profiles: Vec<String> },
    ProfilesIncluded { profiles: Vec<String> },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::SkippedMissing { .. }
            | Event::SkippedNoExtension { .. }
            | Event::SkippedEmpty { .. } => Level::Trace,
            _ => Level::Debug,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Event::SkippedMissing { location, .. }
            | Event::SkippedNoExtension { location, .. }
            | Event::SkippedEmpty { location, .. }
            | Event::Loaded { location, .. } => Some(location),
            _ => None,
        }
    }
}

fn write_located(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    location: &str,
    profile: &Option<String>,
) -> fmt::Result {
    write!(f, "{prefix} '{location}'")?;
    if let Some(profile) = profile {
        write!(f, " for profile {profile}")?;
    }
    Ok(())
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::SkippedMissing { location, profile } => {
                write_located(f, "Skipped missing config", location, profile)
            }
            Event::SkippedNoExtension { location, profile } => {
                write_located(f, "Skipped empty config extension", location, profile)
            }
            Event::SkippedEmpty { location, profile } => {
                write_located(f, "Skipped unloaded config", location, profile)
            }
            Event::Loaded { location, profile } => {
                write_located(f, "Loaded config file", location, profile)
            }
            Event::ProfilesActivated { profiles } => {
                write!(f, "Activated profiles {}", profiles.join(","))
            }
            Event::ActivationIgnored { profiles } => write!(
                f,
                "Profiles already activated, '[{}]' will not be applied",
                profiles.join(", ")
            ),
            Event::ProfilesIncluded { profiles } => {
                write!(f, "Included profiles {}", profiles.join(","))
            }
        }
    }
}

pub trait DiagnosticsSink {
    fn record(&self, event: Event);
}

/// Forwards every event to the `log` facade at the event's level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn record(&self, event: Event) {
        log::log!(target: "layercfg", event.level(), "{}", event);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: Event) {}
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}
