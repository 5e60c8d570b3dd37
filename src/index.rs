//! Cross-scope ontology index.
//!
//! A pure projection over scope and space events: document identity →
//! the documents loaded under it and the scopes referencing it. Never the
//! source of truth — [`OntologyIndex::rebuild`] reconstructs the whole
//! projection by replaying registered scope contents.
//!
//! When the same document id is loaded into more than one scope, lookups
//! resolve to the first scope by registration order (ties within a scope go
//! core, then custom, then session spaces).

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, Weak};

use dashmap::DashMap;

use crate::document::{Document, DocumentKey};
use crate::event::{ChangeKind, ScopeEvent, ScopeListener, SpaceEvent, SpaceListener};
use crate::registry::ScopeRegistry;
use crate::scope::OntologyScope;
use crate::space::SpaceKind;

#[derive(Debug, Clone)]
struct IndexEntry {
    scope: String,
    space: String,
    kind: SpaceKind,
    seq: u64,
    document: Document,
}

/// Derived read-through index over every registered scope.
pub struct OntologyIndex {
    by_document: DashMap<DocumentKey, Vec<IndexEntry>>,
    scope_seq: DashMap<String, u64>,
    self_ref: RwLock<Weak<OntologyIndex>>,
}

impl OntologyIndex {
    /// Create an index. Call [`attach`](Self::attach) to wire it to a
    /// registry; until then it observes nothing.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            by_document: DashMap::new(),
            scope_seq: DashMap::new(),
            self_ref: RwLock::new(Weak::new()),
        })
    }

    /// Subscribe this index to a registry's scope events. Scopes registered
    /// from now on are scanned and tracked automatically; call
    /// [`rebuild`](Self::rebuild) to pick up scopes registered earlier.
    pub fn attach(self: &Arc<Self>, registry: &ScopeRegistry) {
        *self.self_ref.write().expect("index lock poisoned") = Arc::downgrade(self);
        registry.subscribe(self.clone());
    }

    fn insert(&self, entry: IndexEntry) {
        let key = match entry.document.key() {
            Some(key) => key,
            None => return,
        };
        let mut entries = self.by_document.entry(key).or_default();
        match entries.iter().position(|e| e.space == entry.space) {
            Some(pos) => entries[pos] = entry,
            None => entries.push(entry),
        }
    }

    fn remove(&self, space: &str, key: &DocumentKey) {
        if let Some(mut entries) = self.by_document.get_mut(key) {
            entries.retain(|e| e.space != space);
        }
        self.by_document.remove_if(key, |_, entries| entries.is_empty());
    }

    fn scan_space(&self, scope: &OntologyScope, space: &crate::space::OntologySpace, seq: u64) {
        for document in space.documents() {
            self.insert(IndexEntry {
                scope: scope.id().to_owned(),
                space: space.id().to_owned(),
                kind: space.kind(),
                seq,
                document,
            });
        }
    }

    fn scan_scope(&self, scope: &OntologyScope, seq: u64) {
        self.scan_space(scope, scope.core_space(), seq);
        self.scan_space(scope, scope.custom_space(), seq);
        for space in scope.session_spaces() {
            self.scan_space(scope, &space, seq);
        }
    }

    fn drop_scope(&self, id: &str) {
        self.scope_seq.remove(id);
        self.by_document.retain(|_, entries| {
            entries.retain(|e| e.scope != id);
            !entries.is_empty()
        });
    }

    /// Throw the projection away and replay every scope currently registered.
    pub fn rebuild(&self, registry: &ScopeRegistry) {
        self.by_document.clear();
        self.scope_seq.clear();
        for scope in registry.scopes() {
            let seq = registry.registration_seq(scope.id()).unwrap_or(u64::MAX);
            self.scope_seq.insert(scope.id().to_owned(), seq);
            self.scan_scope(&scope, seq);
        }
        tracing::debug!(documents = self.by_document.len(), "index rebuilt");
    }

    /// Whether any registered scope loads a document with this identity.
    pub fn is_loaded(&self, key: &DocumentKey) -> bool {
        self.by_document
            .get(key)
            .map(|e| !e.is_empty())
            .unwrap_or(false)
    }

    /// The document loaded under this identity. When several scopes load
    /// the same id, the instance from the first scope by registration order
    /// wins.
    pub fn ontology(&self, key: &DocumentKey) -> Option<Document> {
        let entries = self.by_document.get(key)?;
        entries
            .iter()
            .min_by_key(|e| (e.seq, e.kind, e.space.clone()))
            .map(|e| e.document.clone())
    }

    /// Scope-scoped lookup of a document.
    pub fn ontology_in_scope(&self, key: &DocumentKey, scope: &str) -> Option<Document> {
        let entries = self.by_document.get(key)?;
        entries
            .iter()
            .filter(|e| e.scope == scope)
            .min_by_key(|e| (e.kind, e.space.clone()))
            .map(|e| e.document.clone())
    }

    /// The scopes referencing this document, optionally counting session
    /// spaces as references.
    pub fn referencing_scopes(&self, key: &DocumentKey, include_sessions: bool) -> BTreeSet<String> {
        self.by_document
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| include_sessions || e.kind != SpaceKind::Session)
                    .map(|e| e.scope.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of distinct document identities currently indexed.
    pub fn document_count(&self) -> usize {
        self.by_document.len()
    }
}

impl SpaceListener for OntologyIndex {
    fn space_changed(&self, event: &SpaceEvent) {
        match event.change {
            ChangeKind::Added => {
                // Space events arrive only for scopes this index has seen
                // registered, so the sequence number is always on file.
                let seq = self
                    .scope_seq
                    .get(&event.scope)
                    .map(|s| *s.value())
                    .unwrap_or(u64::MAX);
                if let Some(document) = &event.content {
                    self.insert(IndexEntry {
                        scope: event.scope.clone(),
                        space: event.space.clone(),
                        kind: event.kind,
                        seq,
                        document: document.clone(),
                    });
                }
            }
            ChangeKind::Removed => self.remove(&event.space, &event.document),
        }
    }
}

impl ScopeListener for OntologyIndex {
    fn scope_changed(&self, event: &ScopeEvent) {
        match event {
            ScopeEvent::Registered { scope, seq } => {
                self.scope_seq.insert(scope.id().to_owned(), *seq);
                let me = self.self_ref.read().expect("index lock poisoned").upgrade();
                if let Some(me) = me {
                    scope.subscribe_spaces(me);
                }
                self.scan_scope(scope, *seq);
            }
            ScopeEvent::Deregistered { id } => self.drop_scope(id),
            ScopeEvent::ActivationChanged { .. } => {}
        }
    }
}

impl std::fmt::Debug for OntologyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologyIndex")
            .field("documents", &self.by_document.len())
            .field("scopes", &self.scope_seq.len())
            .finish()
    }
}
