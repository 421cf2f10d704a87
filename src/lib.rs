//! Layered configuration loading.
//!
//! Configuration documents are discovered across search locations and file
//! names, filtered by activation profiles and merged into an ordered chain of
//! property sources on an [`Environment`]. Documents may activate or include
//! further profiles; loading continues until no new profile appears.
//!
//! ```no_run
//! use layercfg::{ConfigurationLoader, Environment, FileSystemResourceLoader, LogSink};
//!
//! let mut env = Environment::new();
//! let resources = FileSystemResourceLoader::new(".").with_classpath_root("resources");
//! let report = ConfigurationLoader::new().process(&mut env, &resources, &LogSink)?;
//! println!("active profiles: {:?}", report.active_profiles);
//! # Ok::<(), layercfg::ConfigError>(())
//! ```

pub mod binder;
pub mod cache;
pub mod diagnostics;
pub mod document;
pub mod environment;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod merge;
pub mod placeholder;
pub mod profile;
pub mod property_source;
pub mod resource;
pub mod search;
pub mod settings;

pub use binder::{Binder, PropertyBinder};
pub use diagnostics::{DiagnosticsSink, Event, LogSink, NullSink, RecordingSink};
pub use environment::{DEFAULT_PROPERTIES, Environment};
pub use error::{ConfigError, Result};
pub use format::{DocumentFormatLoader, LoaderRegistry};
pub use loader::{ConfigurationLoader, LoadReport};
pub use merge::reorder_sources;
pub use profile::Profile;
pub use property_source::{Origin, PropertySource, PropertySources, PropertyValue};
pub use resource::{FileSystemResourceLoader, MemoryResourceLoader, Resource, ResourceLoader};
pub use settings::EngineSettings;
