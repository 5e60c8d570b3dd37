//! Document input sources.
//!
//! A [`DocumentSource`] is how callers hand documents to spaces and the
//! loader without the manager ever touching concrete ontology syntax. The
//! variants here mirror the ways documents enter the network: blank
//! placeholders, already-materialized documents, store dereferences, and
//! documents re-advertised under a scope-rewritten physical URI.

use std::sync::Arc;

use crate::document::{Document, Uri};
use crate::error::SourceError;
use crate::store::DocumentStore;

/// Produces a [`Document`] on demand.
pub trait DocumentSource: Send + Sync {
    /// Materialize the document.
    fn resolve(&self) -> Result<Document, SourceError>;

    /// The physical URI this source dereferences, if it has one.
    fn physical_uri(&self) -> Option<Uri>;
}

/// An empty document, named or anonymous.
#[derive(Debug, Clone)]
pub struct BlankSource {
    id: Option<Uri>,
    location: Option<Uri>,
}

impl BlankSource {
    /// Blank document with a logical id.
    pub fn named(id: impl Into<Uri>) -> Self {
        Self {
            id: Some(id.into()),
            location: None,
        }
    }

    /// Blank anonymous document known by its physical location.
    pub fn anonymous(location: impl Into<Uri>) -> Self {
        Self {
            id: None,
            location: Some(location.into()),
        }
    }
}

impl DocumentSource for BlankSource {
    fn resolve(&self) -> Result<Document, SourceError> {
        let mut doc = match &self.id {
            Some(id) => Document::named(id.clone()),
            None => Document {
                id: None,
                physical_location: None,
                axioms: Default::default(),
                imports: Default::default(),
            },
        };
        doc.physical_location = self.location.clone();
        Ok(doc)
    }

    fn physical_uri(&self) -> Option<Uri> {
        self.location.clone()
    }
}

/// Wraps an existing, already-materialized document.
#[derive(Debug, Clone)]
pub struct RootSource {
    document: Document,
}

impl RootSource {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl DocumentSource for RootSource {
    fn resolve(&self) -> Result<Document, SourceError> {
        Ok(self.document.clone())
    }

    fn physical_uri(&self) -> Option<Uri> {
        self.document.physical_location.clone()
    }
}

/// Dereferences a URI through a [`DocumentStore`], e.g. for documents
/// discovered in a registry catalog.
#[derive(Clone)]
pub struct StoreSource {
    store: Arc<dyn DocumentStore>,
    uri: Uri,
}

impl StoreSource {
    pub fn new(store: Arc<dyn DocumentStore>, uri: impl Into<Uri>) -> Self {
        Self {
            store,
            uri: uri.into(),
        }
    }
}

impl DocumentSource for StoreSource {
    fn resolve(&self) -> Result<Document, SourceError> {
        self.store.document(&self.uri)
    }

    fn physical_uri(&self) -> Option<Uri> {
        Some(self.uri.clone())
    }
}

impl std::fmt::Debug for StoreSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSource").field("uri", &self.uri).finish()
    }
}

/// Re-advertises a document at a physical URI rewritten under a prefix,
/// relocating it into a scope's own namespace. Anonymous documents keep
/// their original location; there is nothing to rewrite against.
#[derive(Debug, Clone)]
pub struct RewrittenSource {
    inner: Document,
    prefix: Uri,
}

impl RewrittenSource {
    pub fn new(inner: Document, prefix: impl Into<Uri>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }
}

impl DocumentSource for RewrittenSource {
    fn resolve(&self) -> Result<Document, SourceError> {
        let mut doc = self.inner.clone();
        doc.physical_location = self.inner.rewritten_import_target(&self.prefix);
        Ok(doc)
    }

    fn physical_uri(&self) -> Option<Uri> {
        self.inner.rewritten_import_target(&self.prefix)
    }
}
