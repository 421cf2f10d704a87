//! Per-load memo of parsed documents.
//!
//! A resource is probed once per profile, so the same file is requested
//! repeatedly during one load. Parsing happens only on the first request; the
//! cache lives as long as the load and is discarded with it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::binder::Binder;
use crate::document::Document;
use crate::error::Result;
use crate::format::DocumentFormatLoader;
use crate::placeholder::PlaceholderResolver;
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DocumentsCacheKey {
    loader: usize,
    resource: String,
}

#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<DocumentsCacheKey, Arc<Vec<Document>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents of `resource` as parsed by the loader registered at
    /// `loader_index`, parsing on first use.
    pub fn get(
        &mut self,
        loader_index: usize,
        loader: &dyn DocumentFormatLoader,
        name: &str,
        resource: &Resource,
        binder: &dyn Binder,
        placeholders: &dyn PlaceholderResolver,
    ) -> Result<Arc<Vec<Document>>> {
        let key = DocumentsCacheKey {
            loader: loader_index,
            resource: resource.identity(),
        };
        if let Some(documents) = self.entries.get(&key) {
            return Ok(Arc::clone(documents));
        }
        let documents = loader
            .load(name, resource)?
            .into_iter()
            .map(|source| Document::from_source(source, binder, placeholders))
            .collect::<Result<Vec<_>>>()?;
        let documents = Arc::new(documents);
        self.entries.insert(key, Arc::clone(&documents));
        Ok(documents)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
