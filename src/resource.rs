//! Resolving location strings (`classpath:`, `file:`) to readable resources.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{ConfigError, Result};

pub const CLASSPATH_PREFIX: &str = "classpath:";
pub const FILE_PREFIX: &str = "file:";

#[derive(Debug, Clone)]
enum Backing {
    File(PathBuf),
    Memory(Option<Arc<str>>),
}

/// A configuration resource found (or not) at a location.
#[derive(Debug, Clone)]
pub struct Resource {
    location: String,
    backing: Backing,
}

impl Resource {
    pub fn file(location: impl Into<String>, path: PathBuf) -> Self {
        Self {
            location: location.into(),
            backing: Backing::File(path),
        }
    }

    pub fn in_memory(location: impl Into<String>, content: Option<Arc<str>>) -> Self {
        Self {
            location: location.into(),
            backing: Backing::Memory(content),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn exists(&self) -> bool {
        match &self.backing {
            Backing::File(path) => path.is_file(),
            Backing::Memory(content) => content.is_some(),
        }
    }

    pub fn filename(&self) -> Option<String> {
        match &self.backing {
            Backing::File(path) => path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string),
            Backing::Memory(_) => self
                .location
                .rsplit(['/', ':'])
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    pub fn extension(&self) -> Option<String> {
        let filename = self.filename()?;
        let (_, extension) = filename.rsplit_once('.')?;
        (!extension.is_empty()).then(|| extension.to_string())
    }

    /// Stable identity used to memoize parsed documents.
    pub fn identity(&self) -> String {
        match &self.backing {
            Backing::File(path) => path.display().to_string(),
            Backing::Memory(_) => self.location.clone(),
        }
    }

    pub fn read_to_string(&self) -> Result<String> {
        match &self.backing {
            Backing::File(path) => fs::read_to_string(path).map_err(|source| ConfigError::Io {
                resource: self.location.clone(),
                source,
            }),
            Backing::Memory(Some(content)) => Ok(content.to_string()),
            Backing::Memory(None) => Err(ConfigError::Io {
                resource: self.location.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

pub trait ResourceLoader {
    fn resource(&self, location: &str) -> Resource;
}

/// Maps `file:` locations onto a base directory and `classpath:` (or bare)
/// locations onto an ordered list of roots; the first root holding the file wins.
#[derive(Debug, Clone)]
pub struct FileSystemResourceLoader {
    base_dir: PathBuf,
    classpath: Vec<PathBuf>,
}

impl FileSystemResourceLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            classpath: Vec::new(),
        }
    }

    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.classpath.push(root.into());
        self
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    fn classpath_file(&self, relative: &str) -> Option<PathBuf> {
        let relative = relative.trim_start_matches('/');
        self.classpath
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
            .or_else(|| self.classpath.first().map(|root| root.join(relative)))
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn resource(&self, location: &str) -> Resource {
        let path = if let Some(rest) = location.strip_prefix(FILE_PREFIX) {
            let rest = rest.strip_prefix("//").unwrap_or(rest);
            let path = expand_home(rest);
            if path.is_absolute() {
                Some(path)
            } else {
                Some(self.base_dir.join(path))
            }
        } else {
            let rest = location.strip_prefix(CLASSPATH_PREFIX).unwrap_or(location);
            self.classpath_file(rest)
        };
        match path {
            Some(path) => Resource::file(location, path),
            None => Resource::in_memory(location, None),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Resources held in memory, keyed by location.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceLoader {
    files: BTreeMap<String, Arc<str>>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, content: &str) -> Self {
        self.insert(location, content);
        self
    }

    pub fn insert(&mut self, location: &str, content: &str) {
        self.files.insert(normalize(location), Arc::from(content));
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn resource(&self, location: &str) -> Resource {
        let content = self.files.get(&normalize(location)).cloned();
        Resource::in_memory(location, content)
    }
}

fn normalize(location: &str) -> String {
    match location.strip_prefix(CLASSPATH_PREFIX) {
        Some(rest) => format!("{CLASSPATH_PREFIX}/{}", rest.trim_start_matches('/')),
        None => location.to_string(),
    }
}
