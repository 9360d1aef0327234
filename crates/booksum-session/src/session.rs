//! The session: one document, one attempt at a time.
//!
//! [`Session::summarize`] drives an attempt from start request to terminal
//! phase. Records are read and applied strictly one at a time; once an
//! `error` or `stop` record is applied nothing further is read.
//!
//! Cancellation goes through a [`CancelHandle`], which can be used from
//! another task while `summarize` holds the session. A cancel sends the stop
//! request to the backend and keeps draining the stream for up to the
//! configured grace period so the backend's own `stop` record can end the
//! attempt. If none arrives in time the read is abandoned and a local
//! notice is rendered instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use booksum_settings::{BooksumSettings, StreamSettings, UploadSettings};
use booksum_stream::{RecordStreamOptions, StreamError, TokenCounts, parse_record, record_stream};

use crate::backend::SummaryBackend;
use crate::dispatcher::{Flow, dispatch, report_rejected, settle};
use crate::errors::{Result, SessionError};
use crate::export::write_export;
use crate::observer::SessionObserver;
use crate::state::{DocumentInfo, Outcome, Phase, SessionState};

/// Rendered when the stream fails locally (transport error or stall).
pub const LOCAL_ERROR_NOTICE: &str = "Error generating summary. Please try again.";

/// Rendered when a cancel is not confirmed by the backend in time.
pub const LOCAL_STOP_NOTICE: &str = "Stopped.";

/// Summary of one finished attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptReport {
    /// How the attempt ended.
    pub outcome: Outcome,
    /// Last token counts received.
    pub tokens: TokenCounts,
    /// Records parsed and applied.
    pub records_applied: usize,
    /// Records rejected by the parser.
    pub records_rejected: usize,
}

type ActiveSlot = Arc<Mutex<Option<CancellationToken>>>;
type StopSlot = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Requests cancellation of the running attempt from anywhere.
#[derive(Clone)]
pub struct CancelHandle {
    active: ActiveSlot,
    stop_request: StopSlot,
    backend: Arc<dyn SummaryBackend>,
}

impl CancelHandle {
    /// Cancel the running attempt.
    ///
    /// Returns `false` when nothing is running or a cancel is already under
    /// way. The backend stop request is sent from a spawned task (see
    /// [`wait_for_stop_request`](Self::wait_for_stop_request)); its failure
    /// is logged and otherwise ignored.
    pub fn cancel(&self) -> bool {
        let Some(token) = self.active.lock().clone() else {
            debug!("cancel requested with no attempt running");
            return false;
        };
        if token.is_cancelled() {
            return false;
        }
        token.cancel();
        info!("cancelling summarization");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let backend = Arc::clone(&self.backend);
                let task = runtime.spawn(async move {
                    if let Err(e) = backend.cancel_session().await {
                        warn!(error = %e, category = e.category(), "stop request failed");
                    }
                });
                *self.stop_request.lock() = Some(task);
            }
            Err(_) => warn!("no async runtime, stop request not sent"),
        }
        true
    }

    /// Whether an attempt is currently running.
    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Wait up to `limit` for the last stop request to reach the backend.
    ///
    /// Returns `true` when no request is outstanding or it finished in time.
    /// A request still in flight at the limit keeps running.
    pub async fn wait_for_stop_request(&self, limit: Duration) -> bool {
        let Some(mut task) = self.stop_request.lock().take() else {
            return true;
        };
        match tokio::time::timeout(limit, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                warn!(?limit, "stop request still pending");
                *self.stop_request.lock() = Some(task);
                false
            }
        }
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Clears the active slot when the attempt ends, however it ends.
struct ActiveAttempt {
    slot: ActiveSlot,
}

impl ActiveAttempt {
    fn register(slot: &ActiveSlot) -> (Self, CancellationToken) {
        let token = CancellationToken::new();
        *slot.lock() = Some(token.clone());
        (
            Self {
                slot: Arc::clone(slot),
            },
            token,
        )
    }
}

impl Drop for ActiveAttempt {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

enum Step {
    CancelRequested,
    GraceExpired,
    Record(String),
    ReadFailed(String),
    Stalled,
    Ended,
}

/// A summarization session against one backend.
pub struct Session {
    backend: Arc<dyn SummaryBackend>,
    upload: UploadSettings,
    stream: StreamSettings,
    state: SessionState,
    active: ActiveSlot,
    stop_request: StopSlot,
}

impl Session {
    /// Create an idle session with no document.
    pub fn new(backend: Arc<dyn SummaryBackend>, settings: &BooksumSettings) -> Self {
        Self {
            backend,
            upload: settings.upload.clone(),
            stream: settings.stream.clone(),
            state: SessionState::default(),
            active: Arc::new(Mutex::new(None)),
            stop_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// A handle that cancels whichever attempt is running when it is used.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            active: Arc::clone(&self.active),
            stop_request: Arc::clone(&self.stop_request),
            backend: Arc::clone(&self.backend),
        }
    }

    /// Check a document against the local upload rules.
    pub fn validate_document(&self, file_name: &str, size: u64) -> Result<()> {
        if !self.upload.accepts(file_name) {
            return Err(SessionError::UnsupportedDocument {
                name: file_name.to_string(),
                allowed: self.upload.allowed_extensions.join(", "),
            });
        }
        if size > self.upload.max_bytes {
            return Err(SessionError::DocumentTooLarge {
                name: file_name.to_string(),
                size,
                limit: self.upload.max_bytes,
            });
        }
        Ok(())
    }

    /// Upload a document, replacing the current one.
    ///
    /// On success the session is `Idle` with the new document and nothing
    /// exportable. On failure the state is unchanged.
    pub async fn upload_document(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<DocumentInfo> {
        let size = bytes.len() as u64;
        self.validate_document(file_name, size)?;

        let receipt = self
            .backend
            .upload_document(file_name, bytes)
            .await
            .inspect_err(|e| warn!(file = file_name, error = %e, "upload failed"))?;

        let document = DocumentInfo {
            name: file_name.to_string(),
            size,
            stored_as: receipt.filename,
        };
        self.state.set_document(document.clone());
        Ok(document)
    }

    /// Read a file from disk and upload it.
    ///
    /// Name and size are checked before the file is read.
    pub async fn upload_file(&mut self, path: &Path) -> Result<DocumentInfo> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = tokio::fs::metadata(path).await?.len();
        self.validate_document(&file_name, size)?;

        let bytes = tokio::fs::read(path).await?;
        self.upload_document(&file_name, bytes).await
    }

    /// Ask the backend to drop the current document.
    ///
    /// On success the session is `Idle` with no document.
    pub async fn remove_document(&mut self) -> Result<()> {
        self.backend
            .remove_document()
            .await
            .inspect_err(|e| warn!(error = %e, "remove failed"))?;
        self.state.clear_document();
        Ok(())
    }

    /// Run one summarization attempt to its terminal phase.
    ///
    /// Errors only when the attempt never started: no document, or the
    /// backend refused the start request (the session is then back to
    /// `Idle`). Failures once the stream is open end the attempt with
    /// [`Outcome::Errored`] instead.
    pub async fn summarize(&mut self, observer: &mut dyn SessionObserver) -> Result<AttemptReport> {
        let Some(document) = self.state.document() else {
            return Err(SessionError::NoDocument);
        };
        let span = info_span!("summarize", document = %document.name);

        let (_attempt, token) = ActiveAttempt::register(&self.active);
        self.run_attempt(&token, observer).instrument(span).await
    }

    /// Write the rendered output to `dir` as an HTML document.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let Some(document) = self.state.document().filter(|_| self.state.can_download()) else {
            return Err(SessionError::DownloadUnavailable);
        };
        let path = write_export(dir, &document.name, self.state.rendered())?;
        info!(path = %path.display(), "summary exported");
        Ok(path)
    }

    async fn run_attempt(
        &mut self,
        token: &CancellationToken,
        observer: &mut dyn SessionObserver,
    ) -> Result<AttemptReport> {
        self.state.begin_attempt();
        observer.on_phase(Phase::Summarizing);
        observer.on_render("");
        observer.on_tokens(TokenCounts::default());

        let body = match self.backend.start_summarization().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, category = e.category(), "summarization start refused");
                self.state.abandon_attempt();
                observer.on_phase(Phase::Idle);
                observer.on_notice(&format!("Could not start summarization: {e}"));
                return Err(e.into());
            }
        };
        info!("summary stream opened");

        let options = RecordStreamOptions {
            warn_on_truncated_record: self.stream.warn_on_truncated_record,
            buffer_capacity: self.stream.buffer_capacity,
        };
        let mut records = Box::pin(record_stream(body, &options));
        let read_timeout = self.stream.read_timeout_ms.map(Duration::from_millis);
        let grace = Duration::from_millis(self.stream.cancel_grace_ms);

        let mut applied = 0;
        let mut rejected = 0;
        let mut grace_deadline: Option<Instant> = None;

        let outcome = loop {
            // biased: a pending cancel is noticed before the next record is read
            let step = tokio::select! {
                biased;
                () = token.cancelled(), if grace_deadline.is_none() => Step::CancelRequested,
                () = tokio::time::sleep_until(grace_deadline.unwrap_or_else(Instant::now)),
                    if grace_deadline.is_some() => Step::GraceExpired,
                step = next_step(&mut records, read_timeout) => step,
            };

            match step {
                Step::CancelRequested => {
                    self.state.cancel_requested = true;
                    if grace.is_zero() {
                        info!("aborting summary stream");
                        break self.end_locally(observer, Outcome::Cancelled);
                    }
                    debug!(grace_ms = self.stream.cancel_grace_ms, "draining until stop");
                    grace_deadline = Some(Instant::now() + grace);
                }
                Step::GraceExpired => {
                    warn!(
                        grace_ms = self.stream.cancel_grace_ms,
                        "no stop confirmation within grace period, aborting"
                    );
                    break self.end_locally(observer, Outcome::Cancelled);
                }
                Step::Record(record) => match parse_record(&record) {
                    Ok(None) => {}
                    Ok(Some(event)) => {
                        applied += 1;
                        if let Flow::Terminal(outcome) = dispatch(event, &mut self.state, observer) {
                            break outcome;
                        }
                    }
                    Err(failure) => {
                        rejected += 1;
                        report_rejected(&failure);
                    }
                },
                Step::ReadFailed(message) if self.state.cancel_requested => {
                    debug!(error = %message, "summary stream closed after cancel");
                    break self.end_locally(observer, Outcome::Cancelled);
                }
                Step::ReadFailed(message) => {
                    warn!(error = %message, "summary stream failed");
                    break self.end_locally(observer, Outcome::Errored);
                }
                Step::Stalled if self.state.cancel_requested => {
                    debug!(timeout_ms = ?self.stream.read_timeout_ms, "summary stream stalled after cancel");
                    break self.end_locally(observer, Outcome::Cancelled);
                }
                Step::Stalled => {
                    warn!(timeout_ms = ?self.stream.read_timeout_ms, "summary stream stalled");
                    break self.end_locally(observer, Outcome::Errored);
                }
                Step::Ended => {
                    let outcome = if self.state.cancel_requested {
                        Outcome::Cancelled
                    } else {
                        Outcome::Completed
                    };
                    self.state.finish(outcome);
                    observer.on_phase(self.state.phase());
                    break outcome;
                }
            }
        };

        info!(
            outcome = outcome.as_str(),
            records_applied = applied,
            records_rejected = rejected,
            tokens_in = self.state.tokens.tokens_in,
            tokens_out = self.state.tokens.tokens_out,
            "summarization finished"
        );
        Ok(AttemptReport {
            outcome,
            tokens: self.state.tokens,
            records_applied: applied,
            records_rejected: rejected,
        })
    }

    /// End the attempt without a terminal record from the backend.
    fn end_locally(&mut self, observer: &mut dyn SessionObserver, outcome: Outcome) -> Outcome {
        let notice = match outcome {
            Outcome::Errored => LOCAL_ERROR_NOTICE,
            Outcome::Completed | Outcome::Cancelled => LOCAL_STOP_NOTICE,
        };
        settle(&mut self.state, observer, outcome, notice.to_string())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

async fn next_step<S>(records: &mut S, read_timeout: Option<Duration>) -> Step
where
    S: Stream<Item = std::result::Result<String, StreamError>> + Unpin,
{
    let next = match read_timeout {
        Some(limit) => match tokio::time::timeout(limit, records.next()).await {
            Ok(next) => next,
            Err(_) => return Step::Stalled,
        },
        None => records.next().await,
    };
    match next {
        Some(Ok(record)) => Step::Record(record),
        Some(Err(e)) => Step::ReadFailed(e.to_string()),
        None => Step::Ended,
    }
}
