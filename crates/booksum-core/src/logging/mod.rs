//! Structured logging with `tracing`.
//!
//! - [`init_subscriber`] installs the process-wide stderr subscriber
//! - [`capture_logs`] installs a thread-local capture layer for tests
//!
//! The stderr filter can be swapped after installation through
//! [`LogFilterHandle`], so a binary can start logging before its settings
//! are loaded and apply the configured level once they are.

pub mod test_utils;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Changes the level of the installed stderr subscriber.
#[derive(Clone, Debug)]
pub struct LogFilterHandle {
    inner: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilterHandle {
    fn new(level: &str) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let env = EnvFilter::try_from_default_env().ok();
        let from_env = env.is_some();
        let filter = env.unwrap_or_else(|| EnvFilter::new(level));
        let (layer, inner) = reload::Layer::new(filter);
        (layer, Self { inner, from_env })
    }

    /// Replace the filter with `level`. Ignored when `RUST_LOG` is set.
    pub fn set_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        if let Err(e) = self.inner.reload(EnvFilter::new(level)) {
            tracing::warn!(error = %e, level, "failed to change log level");
        }
    }
}

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `level` when set. Returns `None` when a
/// global subscriber is already installed.
pub fn init_subscriber(level: &str) -> Option<LogFilterHandle> {
    let (filter, handle) = LogFilterHandle::new(level);
    let fmt = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails if a global subscriber is already set
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .try_init()
        .ok()
        .map(|()| handle)
}
