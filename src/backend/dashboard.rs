//! Dashboard statistics endpoint.

use serde::Deserialize;

use crate::backend::error::ApiError;
use crate::backend::http::HttpApi;

/// Headline numbers for one dashboard. `knowledge_base_items` comes back
/// preformatted as text, the rest as counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_calls: i64,
    #[serde(default)]
    pub tokens: i64,
    #[serde(default)]
    pub customer_feedback_calls: i64,
    #[serde(default)]
    pub knowledge_base_items: String,
    #[serde(default)]
    pub agent_call_time: i64,
    #[serde(default)]
    pub reschedules_handled: i64,
}

#[derive(Debug, Clone)]
pub struct DashboardApi {
    http: HttpApi,
}

impl DashboardApi {
    pub fn new(http: HttpApi) -> Self {
        Self { http }
    }

    pub async fn stats(&self, dashboard_id: &str) -> Result<DashboardStats, ApiError> {
        self.http
            .get_json(&format!("/dashboards/{dashboard_id}"), &[])
            .await
    }
}
