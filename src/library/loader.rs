//! Registry loader: resolves catalog references into concrete documents.
//!
//! Loading is partial-failure tolerant: one document that fails to resolve
//! is logged and skipped, and a library that yields nothing is skipped from
//! its registry's result. Only a registry that cannot be resolved at all
//! aborts the load.

use std::sync::Arc;

use crate::document::{Document, DocumentKey, Uri};
use crate::error::LoadError;
use crate::store::DocumentStore;

use super::model::{Library, Registry};
use super::tree::ImportGraph;

/// Resolves registry catalogs into deduplicated document sets.
pub struct RegistryLoader {
    store: Arc<dyn DocumentStore>,
}

impl RegistryLoader {
    /// Create a loader backed by the given document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Dereference a registry catalog.
    pub fn load_registry(&self, registry_uri: &Uri) -> Result<Registry, LoadError> {
        self.store.registry(registry_uri)
    }

    /// Dereference a registry catalog into its library children.
    pub fn load_libraries(&self, registry_uri: &Uri) -> Result<Vec<Library>, LoadError> {
        Ok(self.load_registry(registry_uri)?.libraries)
    }

    /// Resolve every document a library references into a flat set,
    /// deduplicated by identity.
    ///
    /// With `recurse`, each resolved document's transitive import closure is
    /// pulled through the store as well; import cycles are traversed once.
    /// Documents that fail to resolve are logged and skipped.
    pub fn gather(&self, library: &Library, recurse: bool) -> Result<Vec<Document>, LoadError> {
        let mut visited = ImportGraph::new();
        let mut gathered = Vec::new();
        let mut pending: Vec<Uri> = library.documents.clone();

        while let Some(uri) = pending.pop() {
            let document = match self.store.document(&uri) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(library = %library.id, document = %uri, error = %e,
                        "cannot resolve library document, skipping");
                    continue;
                }
            };

            let key = document
                .key()
                .unwrap_or_else(|| DocumentKey::Anonymous(uri.clone()));
            if !visited.visit(&key) {
                continue;
            }

            if recurse {
                for target in &document.imports {
                    visited.link(&key, target);
                    pending.push(target.clone());
                }
            }
            gathered.push(document);
        }

        if visited.has_cycle() {
            tracing::debug!(library = %library.id, "import closure contains a cycle");
        }

        Ok(gathered)
    }

    /// Gather every library of a registry into one deduplicated set.
    ///
    /// A library that yields zero documents is skipped from the result;
    /// the rest of the registry still loads.
    pub fn gather_registry(&self, registry: &Registry, recurse: bool) -> Result<Vec<Document>, LoadError> {
        let mut seen = ImportGraph::new();
        let mut gathered = Vec::new();

        for library in &registry.libraries {
            let documents = self.gather(library, recurse)?;
            if documents.is_empty() {
                tracing::warn!(registry = %registry.id, library = %library.id,
                    "library yielded no documents, skipping");
                continue;
            }
            for document in documents {
                let key = match document.key() {
                    Some(key) => key,
                    None => continue,
                };
                if seen.visit(&key) {
                    gathered.push(document);
                }
            }
        }

        tracing::info!(registry = %registry.id, documents = gathered.len(), "registry gathered");
        Ok(gathered)
    }
}

impl std::fmt::Debug for RegistryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLoader").finish()
    }
}
