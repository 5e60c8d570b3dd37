//! # ontoscope
//!
//! Scoped, session-aware views over a shared pool of ontology documents.
//!
//! ## Architecture
//!
//! - **Spaces** (`space`): ordered document containers with one top document
//!   (core / custom / session kinds, runtime write-locking)
//! - **Scopes** (`scope`): one core space + one custom space + per-session
//!   overlay spaces under a single id
//! - **Registry** (`registry`): the process-wide id → scope map with
//!   copy-on-write snapshots for lock-free reads
//! - **Sessions** (`session`): one-way Active → Zombie lifecycle, fanned out
//!   across every active scope
//! - **Index** (`index`): derived cross-scope document lookups, fed by events
//! - **Library** (`library`): registry catalogs resolved into deduplicated
//!   import trees
//!
//! ## Library usage
//!
//! ```
//! use ontoscope::config::ManagerConfig;
//! use ontoscope::manager::NetworkManager;
//! use ontoscope::source::BlankSource;
//!
//! let manager = NetworkManager::new(ManagerConfig::default()).unwrap();
//! manager
//!     .create_scope("users", &BlankSource::named("http://example.org/users"), None, true)
//!     .unwrap();
//! let session = manager.create_session().unwrap();
//! let scope = manager.registry().get("users").unwrap();
//! assert!(scope.get_session_space(session.id()).is_some());
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod index;
pub mod library;
pub mod manager;
pub mod registry;
pub mod scope;
pub mod session;
pub mod source;
pub mod space;
pub mod store;
