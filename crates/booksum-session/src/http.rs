//! [`SummaryBackend`] over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use booksum_settings::BackendSettings;

use crate::backend::{ByteStream, SummaryBackend, UploadReceipt};
use crate::errors::BackendError;

/// Backend route paths.
pub mod routes {
    /// Multipart document upload.
    pub const UPLOAD: &str = "/upload";
    /// Discard the current document.
    pub const REMOVE: &str = "/remove";
    /// Start summarization; responds with the NDJSON stream.
    pub const SUMMARIZE: &str = "/summarize_book_function";
    /// Cancel the running summarization.
    pub const STOP: &str = "/stop_session";
}

/// Multipart form field carrying the document.
const UPLOAD_FIELD: &str = "file";

/// HTTP client for the summarization backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client from backend settings.
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .build()?;
        Ok(Self::with_client(client, &settings.base_url))
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL routes are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }
}

/// Map a non-2xx response to [`BackendError::Status`].
async fn ensure_success(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SummaryBackend for HttpBackend {
    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, BackendError> {
        let size = bytes.len();
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success("upload", response).await?;

        let body = response.text().await?;
        // The receipt is informational; an unexpected body is not a failure
        let receipt: UploadReceipt = serde_json::from_str(&body).unwrap_or_default();
        info!(file = file_name, size, stored_as = ?receipt.filename, "document uploaded");
        Ok(receipt)
    }

    async fn remove_document(&self) -> Result<(), BackendError> {
        let response = self.client.post(self.url(routes::REMOVE)).send().await?;
        let _ = ensure_success("remove", response).await?;
        info!("document removed");
        Ok(())
    }

    async fn start_summarization(&self) -> Result<ByteStream, BackendError> {
        let response = self
            .client
            .post(self.url(routes::SUMMARIZE))
            .send()
            .await?;
        let response = ensure_success("summarize", response).await?;
        debug!(status = response.status().as_u16(), "summary stream opened");

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(BackendError::Http)),
        ))
    }

    async fn cancel_session(&self) -> Result<(), BackendError> {
        let response = self.client.post(self.url(routes::STOP)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Nothing running; the stream already ended on the backend side
            debug!("stop requested with no active session");
            return Ok(());
        }
        let _ = ensure_success("stop", response).await?;
        debug!("stop acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = HttpBackend::with_client(reqwest::Client::new(), "http://host:5000/");
        assert_eq!(backend.base_url(), "http://host:5000");
        assert_eq!(
            backend.url(routes::SUMMARIZE),
            "http://host:5000/summarize_book_function"
        );
    }

    #[test]
    fn builds_from_settings() {
        let backend = HttpBackend::new(&BackendSettings::default()).unwrap();
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
    }
}
