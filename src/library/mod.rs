//! Registry catalogs: named groups of document references and the machinery
//! that resolves them into one deduplicated import tree.

pub mod loader;
pub mod model;
pub mod tree;

pub use loader::RegistryLoader;
pub use model::{Library, Registry};
pub use tree::build_import_tree;
