//! In-memory backend and recording observer shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use booksum_session::{
    BackendError, ByteStream, Phase, SessionObserver, SummaryBackend, UploadReceipt,
};
use booksum_stream::TokenCounts;

pub type Chunk = Result<Bytes, BackendError>;

/// Backend whose summarization bodies are queued up front.
#[derive(Default)]
pub struct FakeBackend {
    starts: Mutex<VecDeque<Result<ByteStream, BackendError>>>,
    upload_failures: Mutex<VecDeque<BackendError>>,
    remove_failures: Mutex<VecDeque<BackendError>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub removes: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response for the next start request.
    pub fn queue(&self, start: Result<ByteStream, BackendError>) {
        self.starts.lock().push_back(start);
    }

    /// Make the next upload request fail with `err`.
    pub fn fail_next_upload(&self, err: BackendError) {
        self.upload_failures.lock().push_back(err);
    }

    /// Make the next remove request fail with `err`.
    pub fn fail_next_remove(&self, err: BackendError) {
        self.remove_failures.lock().push_back(err);
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryBackend for FakeBackend {
    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, BackendError> {
        if let Some(err) = self.upload_failures.lock().pop_front() {
            return Err(err);
        }
        self.uploads.lock().push((file_name.to_string(), bytes.len()));
        Ok(UploadReceipt {
            message: Some("File uploaded successfully".into()),
            filename: Some(file_name.to_string()),
        })
    }

    async fn remove_document(&self) -> Result<(), BackendError> {
        if let Some(err) = self.remove_failures.lock().pop_front() {
            return Err(err);
        }
        let _ = self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn start_summarization(&self) -> Result<ByteStream, BackendError> {
        self.starts.lock().pop_front().unwrap_or_else(|| {
            Err(BackendError::Other {
                message: "no response queued".into(),
            })
        })
    }

    async fn cancel_session(&self) -> Result<(), BackendError> {
        let _ = self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A body delivered as the given chunks.
pub fn body(chunks: Vec<Chunk>) -> ByteStream {
    Box::pin(futures::stream::iter(chunks))
}

/// A body made of text chunks.
pub fn text_body(chunks: &[&str]) -> ByteStream {
    body(
        chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect(),
    )
}

/// A body fed by the returned sender; it ends when the sender is dropped.
pub fn channel_body() -> (mpsc::Sender<Chunk>, ByteStream) {
    let (tx, rx) = mpsc::channel(16);
    (tx, Box::pin(ReceiverStream::new(rx)))
}

pub fn text(s: &str) -> Chunk {
    Ok(Bytes::copy_from_slice(s.as_bytes()))
}

pub fn main_record(content: &str) -> String {
    format!("{}\n", serde_json::json!({"type": "main", "content": content}))
}

pub fn tokens_record(tokens_in: u64, tokens_out: u64) -> String {
    let inner = serde_json::json!({"tokensIn": tokens_in, "tokensOut": tokens_out}).to_string();
    format!("{}\n", serde_json::json!({"type": "tokens", "content": inner}))
}

pub fn error_record(content: &str) -> String {
    format!("{}\n", serde_json::json!({"type": "error", "content": content}))
}

pub fn stop_record(content: &str) -> String {
    format!("{}\n", serde_json::json!({"type": "stop", "content": content}))
}

/// Observer that keeps every notification.
#[derive(Debug, Default)]
pub struct Recorder {
    pub phases: Vec<Phase>,
    pub renders: Vec<String>,
    pub tokens: Vec<TokenCounts>,
    pub notices: Vec<String>,
}

impl SessionObserver for Recorder {
    fn on_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn on_render(&mut self, html: &str) {
        self.renders.push(html.to_string());
    }

    fn on_tokens(&mut self, tokens: TokenCounts) {
        self.tokens.push(tokens);
    }

    fn on_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
