//! Network manager facade.
//!
//! Owns the scope registry, the session manager, and the ontology index,
//! and wires them together: the index observes every registry and space
//! event from construction on, and sessions fan out across active scopes.

use std::sync::Arc;

use crate::config::ManagerConfig;
use crate::document::Uri;
use crate::error::OntoResult;
use crate::index::OntologyIndex;
use crate::registry::ScopeRegistry;
use crate::scope::OntologyScope;
use crate::session::{Session, SessionManager};
use crate::source::DocumentSource;

/// Single-process authority over a network of ontology scopes.
pub struct NetworkManager {
    config: ManagerConfig,
    registry: Arc<ScopeRegistry>,
    sessions: SessionManager,
    index: Arc<OntologyIndex>,
}

impl NetworkManager {
    /// Build a manager from a validated configuration.
    pub fn new(config: ManagerConfig) -> OntoResult<Self> {
        let config = config.validated()?;

        let registry = Arc::new(ScopeRegistry::new());
        let index = OntologyIndex::new();
        index.attach(&registry);
        let sessions = SessionManager::with_limit(registry.clone(), config.max_active_sessions);

        tracing::info!(
            id = %config.id,
            namespace = %config.namespace,
            max_sessions = config.max_active_sessions,
            "ontology network manager initialized"
        );

        Ok(Self {
            config,
            registry,
            sessions,
            index,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Base namespace for scope and space references.
    pub fn namespace(&self) -> Uri {
        self.config.namespace_uri()
    }

    /// The scope registry.
    pub fn registry(&self) -> &Arc<ScopeRegistry> {
        &self.registry
    }

    /// The session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The cross-scope document index.
    pub fn index(&self) -> &Arc<OntologyIndex> {
        &self.index
    }

    /// Create a scope from its document sources, register it, and
    /// optionally mark it active for new sessions.
    pub fn create_scope(
        &self,
        id: &str,
        core_source: &dyn DocumentSource,
        custom_source: Option<&dyn DocumentSource>,
        activate: bool,
    ) -> OntoResult<Arc<OntologyScope>> {
        let scope = OntologyScope::create(id, core_source, custom_source)?;
        let scope = self.registry.register(scope)?;
        if activate {
            self.registry.set_active(id, true)?;
        }
        Ok(scope)
    }

    /// Remove a scope from the registry, discarding all its spaces.
    pub fn drop_scope(&self, id: &str) -> OntoResult<()> {
        self.registry.unregister(id)?;
        Ok(())
    }

    /// Create a session spanning every active scope.
    pub fn create_session(&self) -> OntoResult<Arc<Session>> {
        Ok(self.sessions.create()?)
    }

    /// Destroy a session across every registered scope.
    pub fn destroy_session(&self, id: &str) {
        self.sessions.destroy(id);
    }
}

impl std::fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkManager")
            .field("id", &self.config.id)
            .field("scopes", &self.registry.count())
            .field("sessions", &self.sessions.registered_count())
            .finish()
    }
}
