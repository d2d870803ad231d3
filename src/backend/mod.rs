//! Backend layer: HTTP and websocket adapters for the VH3 Connect
//! gateway. Each service area runs against its own base URL but shares
//! one HTTP client and the session store.

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod documents;
pub mod error;
pub mod http;
pub mod realtime;
pub mod types;

use crate::infra::{config::ApiConfig, session::SessionStore};

use self::{
    auth::AuthApi, chat::ChatApi, dashboard::DashboardApi, documents::DocumentsApi, http::HttpApi,
};

#[derive(Debug, Clone)]
pub struct Backend {
    pub auth: AuthApi,
    pub chat: ChatApi,
    pub documents: DocumentsApi,
    pub dashboard: DashboardApi,
}

impl Backend {
    pub fn new(api: &ApiConfig, session: SessionStore) -> Self {
        let client = reqwest::Client::new();
        let area = |base_url: &str| HttpApi::new(client.clone(), base_url, session.clone());

        Self {
            auth: AuthApi::new(area(&api.auth_base_url)),
            chat: ChatApi::new(area(&api.chat_base_url)),
            documents: DocumentsApi::new(area(&api.documents_base_url)),
            dashboard: DashboardApi::new(area(&api.dashboard_base_url)),
        }
    }
}

/// Returns the backend module name for smoke checks.
pub fn module_name() -> &'static str {
    "backend"
}
