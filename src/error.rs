//! Rich diagnostic error types for the ontology network manager.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes, help text, and source chains so callers
//! know exactly which invariant was violated and how to recover.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum OntoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Space(#[from] SpaceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Document source errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("cannot resolve document from {uri}: {message}")]
    #[diagnostic(
        code(onto::source::unresolvable),
        help(
            "The document source failed to produce a document. \
             Check that the URI is reachable by the configured document store."
        )
    )]
    Unresolvable { uri: String, message: String },

    #[error("no document stored at {uri}")]
    #[diagnostic(
        code(onto::source::missing),
        help(
            "The document store has no entry for this URI. \
             Insert the document first, or verify the reference is correct."
        )
    )]
    Missing { uri: String },
}

// ---------------------------------------------------------------------------
// Ontology space errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SpaceError {
    #[error("space {space} is locked and rejects modification")]
    #[diagnostic(
        code(onto::space::unmodifiable),
        help(
            "Core spaces lock permanently once their top document is set; \
             custom and session spaces may have been locked explicitly. \
             Target an unlocked space instead."
        )
    )]
    Unmodifiable { space: String },

    #[error("document {document} is not removable from space {space}")]
    #[diagnostic(
        code(onto::space::irremovable),
        help(
            "Only the top document and its direct children can be removed, \
             and the top document only after all children are gone. \
             Remove the children first."
        )
    )]
    Irremovable { document: String, space: String },

    #[error("space {space} already has a top document")]
    #[diagnostic(
        code(onto::space::top_already_set),
        help("The top document can be set exactly once per space.")
    )]
    TopAlreadySet { space: String },

    #[error("cannot add the root document of space {space} to itself")]
    #[diagnostic(
        code(onto::space::self_import),
        help("The document's logical id collides with the space's own root URI.")
    )]
    SelfImport { space: String },

    #[error("document has neither a logical id nor a physical location")]
    #[diagnostic(
        code(onto::space::untracked),
        help(
            "A space can only manage documents with a process-wide identity. \
             Give the document a logical URI or record where it was loaded from."
        )
    )]
    Untracked { space: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),
}

// ---------------------------------------------------------------------------
// Scope errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ScopeError {
    #[error("illegal scope id: \"{id}\"")]
    #[diagnostic(
        code(onto::scope::invalid_id),
        help(
            "Scope ids must be non-empty alphanumeric sequences, \
             with optional underscores, dots or dashes."
        )
    )]
    InvalidId { id: String },

    #[error("scope {scope} already holds a session space for session {session}")]
    #[diagnostic(
        code(onto::scope::duplicate_session),
        help(
            "A scope keeps at most one space per session. \
             Detach the existing space before attaching a new one."
        )
    )]
    DuplicateSession { scope: String, session: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Space(#[from] SpaceError),
}

// ---------------------------------------------------------------------------
// Scope registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("a scope with id {id} is already registered")]
    #[diagnostic(
        code(onto::registry::duplicate_id),
        help(
            "Scope ids are unique across the registry; the existing scope was \
             left untouched. Unregister it first, or pick a different id."
        )
    )]
    DuplicateId { id: String },

    #[error("no scope registered under id {id}")]
    #[diagnostic(
        code(onto::registry::no_such_scope),
        help("Register the scope first, or check the id for typos.")
    )]
    NoSuchScope { id: String },
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("session {id} is a zombie and can no longer be referenced")]
    #[diagnostic(
        code(onto::session::non_referenceable),
        help(
            "Destroyed sessions never come back. \
             Create a new session to obtain fresh session spaces."
        )
    )]
    NonReferenceable { id: String },

    #[error("a session with id {id} is already registered")]
    #[diagnostic(
        code(onto::session::duplicate_id),
        help("Session ids are unique while the session is alive. Pick another id.")
    )]
    DuplicateId { id: String },

    #[error("session limit of {max} reached")]
    #[diagnostic(
        code(onto::session::limit),
        help(
            "Destroy an existing session, or raise max_active_sessions in the \
             manager configuration (-1 disables the limit)."
        )
    )]
    Limit { max: i32 },

    #[error("illegal session id: \"{id}\"")]
    #[diagnostic(
        code(onto::session::invalid_id),
        help(
            "Session ids must be non-empty alphanumeric sequences, \
             with optional underscores, dots or dashes."
        )
    )]
    InvalidId { id: String },
}

// ---------------------------------------------------------------------------
// Registry loader errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("cannot load registry {uri}: {message}")]
    #[diagnostic(
        code(onto::load::registry),
        help(
            "The registry catalog itself could not be resolved. \
             Individual library or document failures are skipped, but a \
             missing registry aborts the load."
        )
    )]
    Registry { uri: String, message: String },

    #[error("registry catalog parse error: {message}")]
    #[diagnostic(
        code(onto::load::parse),
        help("The catalog payload is not valid JSON for the registry model.")
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid manager configuration: {message}")]
    #[diagnostic(
        code(onto::config::parse),
        help("Check the TOML syntax and field names against ManagerConfig.")
    )]
    Parse { message: String },

    #[error("invalid namespace {namespace}: {message}")]
    #[diagnostic(
        code(onto::config::namespace),
        help(
            "Namespaces must carry no query or fragment and must not end \
             with '#'. Slash-terminated URIs are preferred."
        )
    )]
    InvalidNamespace { namespace: String, message: String },
}

/// Convenience alias for functions returning crate-level results.
pub type OntoResult<T> = std::result::Result<T, OntoError>;
