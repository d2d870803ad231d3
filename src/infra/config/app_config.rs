use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Base URLs for the backend service areas. Each area is a separate API
/// group on the VH3 Connect gateway, hence the per-area bases instead of
/// a single root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    pub auth_base_url: String,
    pub chat_base_url: String,
    pub documents_base_url: String,
    pub dashboard_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_base_url: "https://api.vh3connect.io/api:G6skVfcT".to_owned(),
            chat_base_url: "https://api.vh3connect.io/api:-2bubRTp".to_owned(),
            documents_base_url: "https://api.vh3connect.io/api:kPLLaYE-".to_owned(),
            dashboard_base_url: "https://api.vh3connect.io/api:KD8DhY1m".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    pub refresh_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtimeConfig {
    pub base_url: String,
    pub max_reconnect_attempts: u32,
    pub connect_timeout_ms: u64,
    pub ping_interval_ms: u64,
    pub base_reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: "wss://rt.vh3connect.io/ws".to_owned(),
            max_reconnect_attempts: 5,
            connect_timeout_ms: 10_000,
            ping_interval_ms: 30_000,
            base_reconnect_delay_ms: 1_000,
            max_reconnect_delay_ms: 30_000,
        }
    }
}

impl RealtimeConfig {
    /// Per-user socket endpoint: the gateway routes frames by user id path.
    pub fn url_for_user(&self, user_id: i64) -> String {
        format!("{}/{user_id}", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_url_joins_without_double_slash() {
        let config = RealtimeConfig {
            base_url: "wss://rt.example.io/ws/".to_owned(),
            ..RealtimeConfig::default()
        };

        assert_eq!(config.url_for_user(42), "wss://rt.example.io/ws/42");
    }
}
