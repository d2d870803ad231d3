use std::path::Path;

use crate::{
    backend::Backend,
    infra::{
        self,
        config::FileConfigAdapter,
        contracts::ConfigAdapter,
        error::AppError,
        session::SessionStore,
        storage_layout::StorageLayout,
    },
    usecases::context::AppContext,
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(config_path)?;
    infra::logging::init(&context.config.logging)?;
    tracing::debug!(session_file = ?context.session.path(), "session store opened");

    Ok(context)
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config_adapter = FileConfigAdapter::new(config_path);
    let config = config_adapter.load().map_err(AppError::Other)?;

    let layout = StorageLayout::resolve()?;
    let session = SessionStore::open(&layout)?;
    let backend = Backend::new(&config.api, session.clone());

    Ok(AppContext::new(config, session, backend))
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;
    use crate::test_support::env_lock;

    #[test]
    fn builds_context_with_default_config_when_file_is_missing() {
        let _guard = env_lock();

        let xdg = tempfile::tempdir().expect("temp dir");
        let old_xdg = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: env is guarded by the process-wide test mutex.
        unsafe { env::set_var("XDG_CONFIG_HOME", xdg.path()) };

        let context = build_context(Some(Path::new("./missing-config.toml")))
            .expect("context should build from defaults");

        assert_eq!(context.config, crate::infra::config::AppConfig::default());
        assert!(!context.session.is_authenticated());

        match old_xdg {
            // SAFETY: restoring env while the guard is held.
            Some(value) => unsafe { env::set_var("XDG_CONFIG_HOME", value) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }
    }

    #[test]
    fn picks_up_persisted_session_token() {
        let _guard = env_lock();

        let xdg = tempfile::tempdir().expect("temp dir");
        let old_xdg = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: env is guarded by the process-wide test mutex.
        unsafe { env::set_var("XDG_CONFIG_HOME", xdg.path()) };

        let session_dir = xdg.path().join("vh3").join("session");
        fs::create_dir_all(&session_dir).expect("session dir");
        fs::write(session_dir.join("session.token"), "tok-1").expect("token fixture");

        let context = build_context(Some(Path::new("./missing-config.toml")))
            .expect("context should build");

        assert!(context.session.is_authenticated());

        match old_xdg {
            // SAFETY: restoring env while the guard is held.
            Some(value) => unsafe { env::set_var("XDG_CONFIG_HOME", value) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }
    }
}
