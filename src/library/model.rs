//! Catalog model consumed by the registry loader.
//!
//! A registry is an external catalog of libraries; each library names a
//! group of documents meant to be imported together. Document references
//! are plain URIs, resolved through the document store at gather time.

use serde::{Deserialize, Serialize};

use crate::document::Uri;

/// A named group of document references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Identifier of the library.
    pub id: Uri,
    /// References to the documents this library groups together.
    pub documents: Vec<Uri>,
}

impl Library {
    /// Create an empty library.
    pub fn new(id: impl Into<Uri>) -> Self {
        Self {
            id: id.into(),
            documents: Vec::new(),
        }
    }

    /// Add a document reference.
    pub fn with_document(mut self, uri: impl Into<Uri>) -> Self {
        self.documents.push(uri.into());
        self
    }
}

/// An external catalog of libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Identifier of the registry document.
    pub id: Uri,
    /// The libraries the registry describes.
    pub libraries: Vec<Library>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(id: impl Into<Uri>) -> Self {
        Self {
            id: id.into(),
            libraries: Vec::new(),
        }
    }

    /// Add a library.
    pub fn with_library(mut self, library: Library) -> Self {
        self.libraries.push(library);
        self
    }

    /// Look up a library by id.
    pub fn library(&self, id: &Uri) -> Option<&Library> {
        self.libraries.iter().find(|l| &l.id == id)
    }

    /// Whether the registry contains a library with this id.
    pub fn has_library(&self, id: &Uri) -> bool {
        self.library(id).is_some()
    }
}
