use serde::Deserialize;

use crate::infra::config::{ApiConfig, AppConfig, LogConfig, RealtimeConfig, SyncConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub api: Option<FileApiConfig>,
    pub sync: Option<FileSyncConfig>,
    pub realtime: Option<FileRealtimeConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(api) = self.api {
            api.merge_into(&mut config.api);
        }

        if let Some(sync) = self.sync {
            sync.merge_into(&mut config.sync);
        }

        if let Some(realtime) = self.realtime {
            realtime.merge_into(&mut config.realtime);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileApiConfig {
    pub auth_base_url: Option<String>,
    pub chat_base_url: Option<String>,
    pub documents_base_url: Option<String>,
    pub dashboard_base_url: Option<String>,
}

impl FileApiConfig {
    fn merge_into(self, config: &mut ApiConfig) {
        if let Some(auth_base_url) = self.auth_base_url {
            config.auth_base_url = auth_base_url;
        }

        if let Some(chat_base_url) = self.chat_base_url {
            config.chat_base_url = chat_base_url;
        }

        if let Some(documents_base_url) = self.documents_base_url {
            config.documents_base_url = documents_base_url;
        }

        if let Some(dashboard_base_url) = self.dashboard_base_url {
            config.dashboard_base_url = dashboard_base_url;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSyncConfig {
    pub refresh_interval_secs: Option<u64>,
}

impl FileSyncConfig {
    fn merge_into(self, config: &mut SyncConfig) {
        if let Some(refresh_interval_secs) = self.refresh_interval_secs {
            config.refresh_interval_secs = refresh_interval_secs;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileRealtimeConfig {
    pub base_url: Option<String>,
    pub max_reconnect_attempts: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub ping_interval_ms: Option<u64>,
    pub base_reconnect_delay_ms: Option<u64>,
    pub max_reconnect_delay_ms: Option<u64>,
}

impl FileRealtimeConfig {
    fn merge_into(self, config: &mut RealtimeConfig) {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(max_reconnect_attempts) = self.max_reconnect_attempts {
            config.max_reconnect_attempts = max_reconnect_attempts;
        }

        if let Some(connect_timeout_ms) = self.connect_timeout_ms {
            config.connect_timeout_ms = connect_timeout_ms;
        }

        if let Some(ping_interval_ms) = self.ping_interval_ms {
            config.ping_interval_ms = ping_interval_ms;
        }

        if let Some(base_reconnect_delay_ms) = self.base_reconnect_delay_ms {
            config.base_reconnect_delay_ms = base_reconnect_delay_ms;
        }

        if let Some(max_reconnect_delay_ms) = self.max_reconnect_delay_ms {
            config.max_reconnect_delay_ms = max_reconnect_delay_ms;
        }
    }
}
