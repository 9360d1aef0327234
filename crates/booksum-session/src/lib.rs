//! # booksum-session
//!
//! One document's upload → summarize → export cycle.
//!
//! - [`backend`]: the four backend operations as the [`SummaryBackend`] trait
//! - [`http`]: [`HttpBackend`], the `reqwest` implementation
//! - [`state`]: [`SessionState`] and its phases
//! - [`dispatcher`]: applies parsed stream events to the state
//! - [`session`]: [`Session`], which drives attempts and owns cancellation
//! - [`export`]: writes the rendered summary out as an HTML document

#![deny(unsafe_code)]

pub mod backend;
pub mod dispatcher;
pub mod errors;
pub mod export;
pub mod http;
pub mod observer;
pub mod session;
pub mod state;

pub use backend::{ByteStream, SummaryBackend, UploadReceipt};
pub use dispatcher::{Flow, dispatch, report_rejected};
pub use errors::{BackendError, SessionError};
pub use http::HttpBackend;
pub use observer::{NullObserver, SessionObserver};
pub use session::{AttemptReport, CancelHandle, LOCAL_ERROR_NOTICE, LOCAL_STOP_NOTICE, Session};
pub use state::{DocumentInfo, Outcome, Phase, SessionState};
