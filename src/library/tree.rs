//! Import tree construction.
//!
//! Folds a flat set of documents into a single root document that imports
//! each of them directly. Anonymous documents are imported through their
//! physical location; an anonymous document with no location at all cannot
//! be referenced and has its axioms folded straight into the root.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::document::{Document, DocumentKey, Uri};

/// Synthesize one root document whose import set covers every input
/// document, without duplicating an import already present on the parent.
///
/// With `parent = Some(doc)` the result is a copy of `doc` with the new
/// imports appended; with `None` the root is a fresh anonymous document.
/// Input ordering does not affect the resulting import set.
pub fn build_import_tree(documents: &[Document], parent: Option<&Document>) -> Document {
    let mut root = parent.cloned().unwrap_or_else(|| Document {
        id: None,
        physical_location: None,
        axioms: Default::default(),
        imports: Default::default(),
    });

    for doc in documents {
        match doc.import_target() {
            Some(target) => {
                root.imports.insert(target);
            }
            None => {
                // No way to reference this document; carrying its content on
                // the root is the only way not to lose it.
                tracing::warn!(
                    axioms = doc.axioms.len(),
                    "anonymous document has no physical location, folding its content into the root"
                );
                root.axioms.merge(&doc.axioms);
                root.imports.extend(doc.imports.iter().cloned());
            }
        }
    }

    root
}

/// Directed graph over document identities, tracking which documents have
/// been visited during a transitive gather and how they import each other.
#[derive(Default)]
pub(crate) struct ImportGraph {
    graph: DiGraph<DocumentKey, ()>,
    nodes: HashMap<DocumentKey, NodeIndex>,
}

impl ImportGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, key: &DocumentKey) -> NodeIndex {
        if let Some(idx) = self.nodes.get(key) {
            return *idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.nodes.insert(key.clone(), idx);
        idx
    }

    /// Record a visited document. Returns false if it was already present.
    pub(crate) fn visit(&mut self, key: &DocumentKey) -> bool {
        let fresh = !self.nodes.contains_key(key);
        self.node(key);
        fresh
    }

    /// Record that `from` imports `to`.
    pub(crate) fn link(&mut self, from: &DocumentKey, to: &Uri) {
        let from = self.node(from);
        // The import target's identity is not known until the target is
        // resolved; reference it as a named key, which is how imports refer
        // to documents.
        let to = self.node(&DocumentKey::Named(to.clone()));
        self.graph.update_edge(from, to, ());
    }

    /// Whether the recorded imports form a cycle.
    pub(crate) fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }
}
