//! Thin wrapper over `reqwest` for one backend service area.
//!
//! Attaches the bearer token from the injected session store to every
//! request, logs request/response pairs, and turns non-success statuses
//! into [`ApiError::Status`] with the server's message when the error
//! body carries one.

use reqwest::{multipart::Form, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{backend::error::ApiError, infra::session::SessionStore};

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl HttpApi {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionStore,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.client.get(self.endpoint(path)).query(query);
        self.execute("GET", path, request).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.client.post(self.endpoint(path)).json(body);
        self.execute("POST", path, request).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let request = self.client.post(self.endpoint(path)).multipart(form);
        self.execute("POST", path, request).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        tracing::debug!(method, path, "api request");

        let response = self.authorize(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = error_message(status, response.text().await.unwrap_or_default());
            tracing::warn!(method, path, status = status.as_u16(), %message, "api error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(method, path, status = status.as_u16(), "api response");

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|error| ApiError::Decode(error.to_string()))
    }
}

/// Pulls the `message` field out of a JSON error body, falling back to the
/// status line.
fn error_message(status: StatusCode, body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        })
}
