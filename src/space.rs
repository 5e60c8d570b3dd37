//! Ontology spaces: ordered containers of documents with one top document.
//!
//! A space holds at most one top document plus the documents directly added
//! under it (its children). Core spaces lock permanently once their top is
//! set; custom and session spaces start unlocked and may be locked
//! explicitly. Readers operate on copy-on-write snapshots, so iteration
//! never observes a half-applied mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::document::{Document, DocumentKey, Uri};
use crate::error::SpaceError;
use crate::event::{ChangeKind, ListenerSet, SpaceEvent, SpaceListener};
use crate::library;

/// Result type for space operations.
pub type SpaceResult<T> = std::result::Result<T, SpaceError>;

/// The three kinds of ontology space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpaceKind {
    /// Immutable base layer, locked once its top document is set.
    Core,
    /// Mutable per-scope overlay.
    Custom,
    /// Mutable per-session overlay.
    Session,
}

impl SpaceKind {
    /// Path suffix used in space ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceKind::Core => "core",
            SpaceKind::Custom => "custom",
            SpaceKind::Session => "session",
        }
    }
}

impl std::fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable view of a space's contents at one point in time.
#[derive(Debug, Default, Clone)]
struct Contents {
    top: Option<Document>,
    children: Vec<Document>,
}

/// An ordered container of documents with one designated top document.
pub struct OntologySpace {
    id: String,
    scope: String,
    kind: SpaceKind,
    locked: AtomicBool,
    contents: RwLock<Arc<Contents>>,
    listeners: Arc<ListenerSet<dyn SpaceListener>>,
}

impl OntologySpace {
    /// Create a standalone space with its own listener set.
    pub fn new(scope: &str, kind: SpaceKind) -> Self {
        Self::with_listeners(scope, kind, None, Arc::new(ListenerSet::new()))
    }

    /// Create a space wired to a shared listener set; session spaces carry
    /// the session id in their path (`{scope}/session-{id}`).
    pub(crate) fn with_listeners(
        scope: &str,
        kind: SpaceKind,
        session: Option<&str>,
        listeners: Arc<ListenerSet<dyn SpaceListener>>,
    ) -> Self {
        let id = match (kind, session) {
            (SpaceKind::Session, Some(sid)) => format!("{scope}/session-{sid}"),
            _ => format!("{scope}/{kind}"),
        };
        Self {
            id,
            scope: scope.to_owned(),
            kind,
            locked: AtomicBool::new(false),
            contents: RwLock::new(Arc::new(Contents::default())),
            listeners,
        }
    }

    /// The space id, `{scope_id}/{space_type}`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the owning scope.
    pub fn scope_id(&self) -> &str {
        &self.scope
    }

    /// Which kind of space this is.
    pub fn kind(&self) -> SpaceKind {
        self.kind
    }

    /// Whether the space rejects mutation.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Mark the space read-only. Idempotent.
    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    /// Subscribe a listener for this space's document events.
    pub fn subscribe(&self, listener: Arc<dyn SpaceListener>) {
        self.listeners.subscribe(listener);
    }

    // Uniform lock guard used by every mutating entry point.
    fn ensure_unlocked(&self) -> SpaceResult<()> {
        if self.is_locked() {
            return Err(SpaceError::Unmodifiable {
                space: self.id.clone(),
            });
        }
        Ok(())
    }

    fn publish(&self, document: DocumentKey, change: ChangeKind, content: Option<Document>) -> SpaceEvent {
        let event = SpaceEvent {
            scope: self.scope.clone(),
            space: self.id.clone(),
            kind: self.kind,
            document,
            change,
            content,
        };
        self.listeners.notify(|l| l.space_changed(&event));
        event
    }

    fn resolve_keyed(&self, source: &dyn crate::source::DocumentSource) -> SpaceResult<(Document, DocumentKey)> {
        let document = source.resolve()?;
        let key = document.key().ok_or_else(|| SpaceError::Untracked {
            space: self.id.clone(),
        })?;
        Ok((document, key))
    }

    /// Set the top document. Allowed once per space while unlocked; Core
    /// spaces lock permanently on success.
    pub fn set_top(&self, source: &dyn crate::source::DocumentSource) -> SpaceResult<SpaceEvent> {
        let (document, key) = self.resolve_keyed(source)?;
        {
            let mut guard = self.contents.write().expect("space lock poisoned");
            self.ensure_unlocked()?;
            if guard.top.is_some() {
                return Err(SpaceError::TopAlreadySet {
                    space: self.id.clone(),
                });
            }
            let mut next = (**guard).clone();
            next.top = Some(document.clone());
            *guard = Arc::new(next);
        }
        if self.kind == SpaceKind::Core {
            self.lock();
        }
        tracing::debug!(space = %self.id, document = %key, "top document set");
        Ok(self.publish(key, ChangeKind::Added, Some(document)))
    }

    /// Add a document as a direct child of the top document.
    ///
    /// Re-adding a document with the same identity replaces the previous
    /// entry rather than duplicating it.
    pub fn add_document(&self, source: &dyn crate::source::DocumentSource) -> SpaceResult<SpaceEvent> {
        let (document, key) = self.resolve_keyed(source)?;
        {
            let mut guard = self.contents.write().expect("space lock poisoned");
            self.ensure_unlocked()?;
            if guard.top.as_ref().and_then(Document::key).as_ref() == Some(&key) {
                return Err(SpaceError::SelfImport {
                    space: self.id.clone(),
                });
            }
            let mut next = (**guard).clone();
            match next.children.iter().position(|d| d.key().as_ref() == Some(&key)) {
                Some(pos) => next.children[pos] = document.clone(),
                None => next.children.push(document.clone()),
            }
            *guard = Arc::new(next);
        }
        tracing::debug!(space = %self.id, document = %key, "document added");
        Ok(self.publish(key, ChangeKind::Added, Some(document)))
    }

    /// Remove a document.
    ///
    /// Only the top document and direct children are removable, and the top
    /// document only once the space defines no children.
    pub fn remove_document(&self, key: &DocumentKey) -> SpaceResult<SpaceEvent> {
        {
            let mut guard = self.contents.write().expect("space lock poisoned");
            self.ensure_unlocked()?;
            let is_top = guard.top.as_ref().and_then(Document::key).as_ref() == Some(key);
            if is_top {
                if !guard.children.is_empty() {
                    return Err(SpaceError::Irremovable {
                        document: key.to_string(),
                        space: self.id.clone(),
                    });
                }
                let mut next = (**guard).clone();
                next.top = None;
                *guard = Arc::new(next);
            } else {
                let pos = guard
                    .children
                    .iter()
                    .position(|d| d.key().as_ref() == Some(key))
                    .ok_or_else(|| SpaceError::Irremovable {
                        document: key.to_string(),
                        space: self.id.clone(),
                    })?;
                let mut next = (**guard).clone();
                next.children.remove(pos);
                *guard = Arc::new(next);
            }
        }
        tracing::debug!(space = %self.id, document = %key, "document removed");
        Ok(self.publish(key.clone(), ChangeKind::Removed, None))
    }

    fn snapshot(&self) -> Arc<Contents> {
        self.contents.read().expect("space lock poisoned").clone()
    }

    /// The top document, if set.
    pub fn top(&self) -> Option<Document> {
        self.snapshot().top.clone()
    }

    /// The direct children, in insertion order.
    pub fn children(&self) -> Vec<Document> {
        self.snapshot().children.clone()
    }

    /// Every document the space manages: top first, then children.
    pub fn documents(&self) -> Vec<Document> {
        let snap = self.snapshot();
        snap.top.iter().chain(snap.children.iter()).cloned().collect()
    }

    /// Whether the space manages a document with this identity.
    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.document(key).is_some()
    }

    /// Look up a managed document by identity.
    pub fn document(&self, key: &DocumentKey) -> Option<Document> {
        let snap = self.snapshot();
        snap.top
            .iter()
            .chain(snap.children.iter())
            .find(|d| d.key().as_ref() == Some(key))
            .cloned()
    }

    /// Number of managed documents, the top document included.
    pub fn len(&self) -> usize {
        let snap = self.snapshot();
        snap.children.len() + usize::from(snap.top.is_some())
    }

    /// Whether the space manages no documents at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synthesize this space's root document: named `{namespace}{space_id}`,
    /// importing the top document and every child.
    pub fn as_document(&self, namespace: &Uri) -> Document {
        let root = Document::named(namespace.join(&self.id));
        library::build_import_tree(&self.documents(), Some(&root))
    }
}

impl std::fmt::Debug for OntologySpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologySpace")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("locked", &self.is_locked())
            .field("documents", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BlankSource, RootSource};

    fn named_source(uri: &str) -> RootSource {
        RootSource::new(Document::named(uri))
    }

    fn key(uri: &str) -> DocumentKey {
        DocumentKey::Named(Uri::new(uri))
    }

    #[test]
    fn core_space_locks_after_set_top() {
        let space = OntologySpace::new("s1", SpaceKind::Core);
        assert!(!space.is_locked());

        space.set_top(&named_source("http://example.org/core")).unwrap();
        assert!(space.is_locked());

        let err = space.add_document(&named_source("http://example.org/x")).unwrap_err();
        assert!(matches!(err, SpaceError::Unmodifiable { .. }));
    }

    #[test]
    fn custom_space_stays_unlocked_until_told() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        space.set_top(&named_source("http://example.org/top")).unwrap();
        assert!(!space.is_locked());

        space.lock();
        space.lock(); // idempotent
        assert!(space.is_locked());

        let err = space
            .remove_document(&key("http://example.org/top"))
            .unwrap_err();
        assert!(matches!(err, SpaceError::Unmodifiable { .. }));
    }

    #[test]
    fn top_can_only_be_set_once() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        space.set_top(&named_source("http://example.org/a")).unwrap();
        let err = space.set_top(&named_source("http://example.org/b")).unwrap_err();
        assert!(matches!(err, SpaceError::TopAlreadySet { .. }));
    }

    #[test]
    fn remove_requires_top_or_direct_child() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        space.set_top(&named_source("http://example.org/top")).unwrap();
        space.add_document(&named_source("http://example.org/child")).unwrap();

        let err = space.remove_document(&key("http://example.org/stranger")).unwrap_err();
        assert!(matches!(err, SpaceError::Irremovable { .. }));

        space.remove_document(&key("http://example.org/child")).unwrap();
        assert!(!space.contains(&key("http://example.org/child")));
    }

    #[test]
    fn top_removal_waits_for_children() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        space.set_top(&named_source("http://example.org/top")).unwrap();
        space.add_document(&named_source("http://example.org/child")).unwrap();

        let err = space.remove_document(&key("http://example.org/top")).unwrap_err();
        assert!(matches!(err, SpaceError::Irremovable { .. }));

        space.remove_document(&key("http://example.org/child")).unwrap();
        space.remove_document(&key("http://example.org/top")).unwrap();
        assert!(space.is_empty());
    }

    #[test]
    fn re_adding_same_identity_replaces() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        let first = Document::named("http://example.org/a");
        let second = Document::named("http://example.org/a").with_import("http://example.org/b");

        space.add_document(&RootSource::new(first)).unwrap();
        space.add_document(&RootSource::new(second)).unwrap();

        assert_eq!(space.children().len(), 1);
        assert_eq!(space.children()[0].imports.len(), 1);
    }

    #[test]
    fn adding_the_top_document_itself_is_rejected() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        space.set_top(&named_source("http://example.org/top")).unwrap();
        let err = space.add_document(&named_source("http://example.org/top")).unwrap_err();
        assert!(matches!(err, SpaceError::SelfImport { .. }));
    }

    #[test]
    fn anonymous_documents_tracked_by_location() {
        let space = OntologySpace::new("s1", SpaceKind::Session);
        space.add_document(&BlankSource::anonymous("file:///anon.owl")).unwrap();

        let anon = DocumentKey::Anonymous(Uri::new("file:///anon.owl"));
        assert!(space.contains(&anon));
        space.remove_document(&anon).unwrap();
        assert!(space.is_empty());
    }

    #[test]
    fn identity_less_documents_are_rejected() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        let bare = Document {
            id: None,
            physical_location: None,
            axioms: Default::default(),
            imports: Default::default(),
        };
        let err = space.add_document(&RootSource::new(bare)).unwrap_err();
        assert!(matches!(err, SpaceError::Untracked { .. }));
    }

    #[test]
    fn mutations_emit_events() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        let added = space.add_document(&named_source("http://example.org/a")).unwrap();
        assert_eq!(added.scope, "s1");
        assert_eq!(added.space, "s1/custom");
        assert_eq!(added.kind, SpaceKind::Custom);
        assert_eq!(added.change, ChangeKind::Added);
        assert!(added.content.is_some());

        let removed = space.remove_document(&key("http://example.org/a")).unwrap();
        assert_eq!(removed.change, ChangeKind::Removed);
    }

    #[test]
    fn space_root_imports_top_and_children() {
        let space = OntologySpace::new("s1", SpaceKind::Custom);
        space.set_top(&named_source("http://example.org/top")).unwrap();
        space.add_document(&named_source("http://example.org/a")).unwrap();
        space.add_document(&named_source("http://example.org/b")).unwrap();

        let root = space.as_document(&Uri::new("http://localhost/net/"));
        assert_eq!(root.id.as_ref().unwrap().as_str(), "http://localhost/net/s1/custom");
        assert_eq!(root.imports.len(), 3);
        assert!(root.imports.contains(&Uri::new("http://example.org/top")));
    }
}
