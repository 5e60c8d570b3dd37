//! Document store boundary.
//!
//! The manager never parses concrete ontology syntax; it asks a
//! [`DocumentStore`] to dereference URIs into [`Document`]s and registry
//! catalogs. [`MemoryStore`] is the in-process implementation used by tests
//! and by embedders that assemble documents programmatically.

use dashmap::DashMap;

use crate::document::{Document, Uri};
use crate::error::{LoadError, SourceError};
use crate::library::Registry;

/// Lookup boundary for documents and registry catalogs.
pub trait DocumentStore: Send + Sync {
    /// Dereference a URI into a document.
    fn document(&self, uri: &Uri) -> Result<Document, SourceError>;

    /// Dereference a URI into a registry catalog.
    fn registry(&self, uri: &Uri) -> Result<Registry, LoadError>;
}

/// In-memory document store keyed by URI.
///
/// Documents are looked up by logical id first, physical location second,
/// so a reference to either form of identity resolves.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<Uri, Document>,
    registries: DashMap<Uri, Registry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, keyed by its logical id and, when present, its
    /// physical location. Identity-less documents are silently dropped.
    pub fn insert(&self, document: Document) {
        if let Some(id) = &document.id {
            self.documents.insert(id.clone(), document.clone());
        }
        if let Some(loc) = &document.physical_location {
            self.documents.insert(loc.clone(), document);
        }
    }

    /// Insert a registry catalog under its own id.
    pub fn insert_registry(&self, registry: Registry) {
        self.registries.insert(registry.id.clone(), registry);
    }

    /// Parse a JSON registry catalog and insert it. Returns the registry id.
    pub fn load_catalog_json(&self, json: &str) -> Result<Uri, LoadError> {
        let registry: Registry = serde_json::from_str(json).map_err(|e| LoadError::Parse {
            message: e.to_string(),
        })?;
        let id = registry.id.clone();
        self.insert_registry(registry);
        Ok(id)
    }

    /// Number of stored documents (ids and locations both count as keys).
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn document(&self, uri: &Uri) -> Result<Document, SourceError> {
        self.documents
            .get(uri)
            .map(|r| r.value().clone())
            .ok_or_else(|| SourceError::Missing {
                uri: uri.to_string(),
            })
    }

    fn registry(&self, uri: &Uri) -> Result<Registry, LoadError> {
        self.registries
            .get(uri)
            .map(|r| r.value().clone())
            .ok_or_else(|| LoadError::Registry {
                uri: uri.to_string(),
                message: "not present in store".into(),
            })
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.documents.len())
            .field("registries", &self.registries.len())
            .finish()
    }
}
