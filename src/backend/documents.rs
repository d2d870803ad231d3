//! Knowledge-base document endpoints.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::backend::error::ApiError;
use crate::backend::http::HttpApi;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct DocumentsApi {
    http: HttpApi,
}

impl DocumentsApi {
    pub fn new(http: HttpApi) -> Self {
        Self { http }
    }

    /// Uploads a PDF into the knowledge base. The gateway expects the
    /// file under the `pdf` form field.
    pub async fn upload(&self, path: &Path) -> Result<Document, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_owned());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|error| ApiError::Decode(error.to_string()))?;

        self.http
            .post_multipart("/files/upload_kb", Form::new().part("pdf", part))
            .await
    }

    pub async fn get(&self, doc_id: &str) -> Result<Document, ApiError> {
        self.http
            .get_json("/document", &[("doc_id", doc_id.to_string())])
            .await
    }

    pub async fn list(&self) -> Result<Vec<Document>, ApiError> {
        self.http.get_json("/all_documents", &[]).await
    }
}
