//! Core document types for the ontology network.
//!
//! A [`Document`] is an identified, immutable unit of knowledge-base content
//! that may import other documents. Identity is carried by a [`DocumentKey`]:
//! named documents are identified by their logical URI, anonymous ones by
//! their physical location for the lifetime of the process.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A logical or physical URI, stored as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    /// Create a URI from any string-like value.
    pub fn new(raw: impl Into<String>) -> Self {
        Uri(raw.into())
    }

    /// The underlying string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a path segment onto this URI with a single `/` separator.
    pub fn join(&self, segment: &str) -> Uri {
        if self.0.ends_with('/') {
            Uri(format!("{}{segment}", self.0))
        } else {
            Uri(format!("{}/{segment}", self.0))
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(raw: &str) -> Self {
        Uri(raw.to_owned())
    }
}

impl From<String> for Uri {
    fn from(raw: String) -> Self {
        Uri(raw)
    }
}

/// Process-wide identity of a document.
///
/// Dedup and lookup logic matches on this tag explicitly: a named document is
/// always identified by its logical URI, an anonymous one by the physical
/// location it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKey {
    /// Identified by logical URI.
    Named(Uri),
    /// Identifier-less; stands in for its physical location.
    Anonymous(Uri),
}

impl DocumentKey {
    /// The URI carried by this key, whichever kind it is.
    pub fn uri(&self) -> &Uri {
        match self {
            DocumentKey::Named(uri) | DocumentKey::Anonymous(uri) => uri,
        }
    }

    /// Whether this key identifies an anonymous document.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, DocumentKey::Anonymous(_))
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKey::Named(uri) => write!(f, "{uri}"),
            DocumentKey::Anonymous(uri) => write!(f, "anon:{uri}"),
        }
    }
}

/// Opaque axiom payload of a document.
///
/// The manager never interprets axioms; it only carries them around and folds
/// them together when an import target cannot be referenced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Axioms(Vec<String>);

impl Axioms {
    /// Number of axioms.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append all axioms from `other`, skipping ones already present.
    pub fn merge(&mut self, other: &Axioms) {
        for axiom in &other.0 {
            if !self.0.contains(axiom) {
                self.0.push(axiom.clone());
            }
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Axioms {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Axioms(iter.into_iter().map(Into::into).collect())
    }
}

/// An immutable ontology document: optional logical id, optional physical
/// location, opaque axioms, and the set of URIs it imports.
///
/// Mutating operations (`with_imports`, `with_added_import`) produce a new
/// `Document` rather than editing in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Logical URI, if the document is named.
    pub id: Option<Uri>,
    /// Where the document was physically loaded from, if known.
    pub physical_location: Option<Uri>,
    /// Opaque axiom payload.
    pub axioms: Axioms,
    /// Direct import references.
    pub imports: BTreeSet<Uri>,
}

impl Document {
    /// Create an empty named document.
    pub fn named(id: impl Into<Uri>) -> Self {
        Self {
            id: Some(id.into()),
            physical_location: None,
            axioms: Axioms::default(),
            imports: BTreeSet::new(),
        }
    }

    /// Create an empty anonymous document known only by its physical location.
    pub fn anonymous(location: impl Into<Uri>) -> Self {
        Self {
            id: None,
            physical_location: Some(location.into()),
            axioms: Axioms::default(),
            imports: BTreeSet::new(),
        }
    }

    /// Attach a physical location.
    pub fn at_location(mut self, location: impl Into<Uri>) -> Self {
        self.physical_location = Some(location.into());
        self
    }

    /// Replace the axiom payload.
    pub fn with_axioms(mut self, axioms: Axioms) -> Self {
        self.axioms = axioms;
        self
    }

    /// Add a single import reference.
    pub fn with_import(mut self, target: impl Into<Uri>) -> Self {
        self.imports.insert(target.into());
        self
    }

    /// Process-wide identity of this document, or `None` if it is anonymous
    /// and has no physical location either.
    pub fn key(&self) -> Option<DocumentKey> {
        match (&self.id, &self.physical_location) {
            (Some(id), _) => Some(DocumentKey::Named(id.clone())),
            (None, Some(loc)) => Some(DocumentKey::Anonymous(loc.clone())),
            (None, None) => None,
        }
    }

    /// Whether the document has no logical id.
    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    /// The URI other documents should use to import this one: the logical id
    /// when named, the physical location when anonymous.
    pub fn import_target(&self) -> Option<Uri> {
        self.id.clone().or_else(|| self.physical_location.clone())
    }

    /// The import target under a rewrite prefix: named documents are imported
    /// as `{prefix}/{id}` (relocating the document elsewhere), anonymous ones
    /// keep their physical location untouched.
    pub fn rewritten_import_target(&self, prefix: &Uri) -> Option<Uri> {
        match &self.id {
            Some(id) => Some(prefix.join(id.as_str())),
            None => self.physical_location.clone(),
        }
    }

    /// Copy of this document with the import set replaced.
    pub fn with_imports(&self, imports: BTreeSet<Uri>) -> Document {
        let mut copy = self.clone();
        copy.imports = imports;
        copy
    }

    /// Copy of this document with one more import reference. Returns the
    /// unchanged copy if the target is already imported.
    pub fn with_added_import(&self, target: Uri) -> Document {
        let mut copy = self.clone();
        copy.imports.insert(target);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_key() {
        let doc = Document::named("http://example.org/onto/a");
        assert_eq!(
            doc.key(),
            Some(DocumentKey::Named(Uri::new("http://example.org/onto/a")))
        );
        assert!(!doc.is_anonymous());
    }

    #[test]
    fn anonymous_key_uses_location() {
        let doc = Document::anonymous("file:///tmp/anon.owl");
        let key = doc.key().unwrap();
        assert!(key.is_anonymous());
        assert_eq!(key.uri().as_str(), "file:///tmp/anon.owl");
    }

    #[test]
    fn identity_less_document_has_no_key() {
        let doc = Document {
            id: None,
            physical_location: None,
            axioms: Axioms::default(),
            imports: BTreeSet::new(),
        };
        assert!(doc.key().is_none());
    }

    #[test]
    fn named_location_still_named() {
        let doc = Document::named("http://example.org/a").at_location("file:///a.owl");
        assert!(matches!(doc.key(), Some(DocumentKey::Named(_))));
    }

    #[test]
    fn import_target_prefers_logical_id() {
        let named = Document::named("http://example.org/a").at_location("file:///a.owl");
        assert_eq!(named.import_target().unwrap().as_str(), "http://example.org/a");

        let anon = Document::anonymous("file:///b.owl");
        assert_eq!(anon.import_target().unwrap().as_str(), "file:///b.owl");
    }

    #[test]
    fn rewritten_target_only_affects_named() {
        let prefix = Uri::new("http://localhost/scope");
        let named = Document::named("http://example.org/a");
        assert_eq!(
            named.rewritten_import_target(&prefix).unwrap().as_str(),
            "http://localhost/scope/http://example.org/a"
        );

        let anon = Document::anonymous("file:///b.owl");
        assert_eq!(
            anon.rewritten_import_target(&prefix).unwrap().as_str(),
            "file:///b.owl"
        );
    }

    #[test]
    fn with_imports_leaves_original_untouched() {
        let doc = Document::named("http://example.org/a").with_import("http://example.org/b");
        let mut imports = doc.imports.clone();
        imports.insert(Uri::new("http://example.org/c"));
        let copy = doc.with_imports(imports);

        assert_eq!(doc.imports.len(), 1);
        assert_eq!(copy.imports.len(), 2);
    }

    #[test]
    fn added_import_dedups() {
        let doc = Document::named("a").with_import("b");
        let copy = doc.with_added_import(Uri::new("b"));
        assert_eq!(copy.imports.len(), 1);
    }

    #[test]
    fn axioms_merge_skips_duplicates() {
        let mut a: Axioms = ["p(x)", "q(y)"].into_iter().collect();
        let b: Axioms = ["q(y)", "r(z)"].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn uri_join() {
        assert_eq!(Uri::new("http://a/b").join("c").as_str(), "http://a/b/c");
        assert_eq!(Uri::new("http://a/b/").join("c").as_str(), "http://a/b/c");
    }
}
