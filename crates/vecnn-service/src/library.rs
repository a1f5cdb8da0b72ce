//! Process-wide library initialization.
//!
//! Logging is off until a host calls [`init_library`]. The subscriber is
//! installed once per process behind a reloadable filter; dropping the
//! returned [`LibraryGuard`] turns the filter off again, and a later
//! `init_library` reloads it instead of installing a second subscriber.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};
use vecnn_types::{Result, VecnnError};

/// Where library log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Human-readable lines on stderr. `RUST_LOG` overrides `level`.
    Stderr { level: String },
    /// Discard everything.
    None,
}

impl LogTarget {
    fn filter(&self) -> Result<EnvFilter> {
        match self {
            LogTarget::Stderr { level } => EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(level))
                .map_err(|e| VecnnError::Parameter(format!("invalid log level '{}': {}", level, e))),
            LogTarget::None => Ok(EnvFilter::new("off")),
        }
    }
}

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Initialize the library. Only one guard may be alive at a time.
pub fn init_library(target: LogTarget) -> Result<LibraryGuard> {
    if ACTIVE
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(VecnnError::State(
            "library is already initialized".to_string(),
        ));
    }

    if let Err(e) = target.filter().and_then(apply_filter) {
        ACTIVE.store(false, Ordering::SeqCst);
        return Err(e);
    }
    info!(log_target = ?target, version = env!("CARGO_PKG_VERSION"), "vecnn library initialized");
    Ok(LibraryGuard { _private: () })
}

/// Whether a [`LibraryGuard`] is currently alive.
pub fn is_initialized() -> bool {
    ACTIVE.load(Ordering::SeqCst)
}

fn apply_filter(filter: EnvFilter) -> Result<()> {
    if let Some(handle) = FILTER.get() {
        return handle
            .reload(filter)
            .map_err(|e| VecnnError::State(format!("cannot reload log filter: {}", e)));
    }

    let (layer, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| VecnnError::State(format!("cannot install log subscriber: {}", e)))?;
    let _ = FILTER.set(handle);
    Ok(())
}

/// Keeps the library initialized; dropping it tears logging down.
#[must_use = "dropping the guard immediately tears the library down"]
#[derive(Debug)]
pub struct LibraryGuard {
    _private: (),
}

impl LibraryGuard {
    /// Explicit teardown, equivalent to dropping the guard.
    pub fn shutdown(self) {}
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        info!("vecnn library shutting down");
        if let Some(handle) = FILTER.get() {
            let _ = handle.reload(EnvFilter::new("off"));
        }
        ACTIVE.store(false, Ordering::SeqCst);
    }
}
