mod adapter;
mod app_config;
mod file_config;
mod loader;

pub use adapter::FileConfigAdapter;
pub use app_config::{ApiConfig, AppConfig, LogConfig, RealtimeConfig, SyncConfig};
pub use loader::load;
