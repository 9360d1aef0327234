//! The summarization backend as seen by a session.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;

use crate::errors::BackendError;

/// Raw response body of a summarization request.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

/// What the backend reports after accepting a document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    /// Human-readable confirmation.
    #[serde(default)]
    pub message: Option<String>,
    /// Name the backend stored the document under.
    #[serde(default)]
    pub filename: Option<String>,
}

/// The four backend operations a session needs.
///
/// The backend keeps one current document and at most one running
/// summarization; none of these calls take an identifier.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Send a document, replacing any previous one.
    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, BackendError>;

    /// Discard the current document.
    async fn remove_document(&self) -> Result<(), BackendError>;

    /// Begin summarizing the current document.
    ///
    /// Resolves once the backend has accepted the request; the body then
    /// arrives through the returned stream.
    async fn start_summarization(&self) -> Result<ByteStream, BackendError>;

    /// Ask the backend to stop the running summarization.
    ///
    /// Fire-and-forget: confirmation arrives in-band as a `stop` record.
    async fn cancel_session(&self) -> Result<(), BackendError>;
}
