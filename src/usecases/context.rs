use crate::{backend::Backend, infra::config::AppConfig, infra::session::SessionStore};

/// Everything a command needs, constructed once at startup: the merged
/// config, the session store, and the per-area backend clients. No
/// ambient globals; the session token travels only through this object.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: SessionStore,
    pub backend: Backend,
}

impl AppContext {
    pub fn new(config: AppConfig, session: SessionStore, backend: Backend) -> Self {
        Self {
            config,
            session,
            backend,
        }
    }
}
