//! Process-wide collaborators threaded through every public call: allocation
//! hooks, diagnostic reporters, and the cooperative interrupt flag.
//!
//! The upstream C core (see `original_source/librtgeom_internal.h` in the
//! retrieval pack this crate was distilled from) threads a `RTCTX` pointer
//! through every function so that two unrelated callers never share global
//! mutable state. A [`Context`] plays the same role here, but the allocator
//! hooks collapse to nothing (Rust's global allocator already gives every
//! thread a safe, shared allocator) and the reporter hooks default to the
//! `log` crate rather than requiring the host to supply function pointers.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Diagnostic severities a [`Context`] can be asked to report.
///
/// `Error` is contractually non-returning from the caller's perspective:
/// reporting one always corresponds to an `Err(_)` unwind back through the
/// public API (see `planargeom-types::error::Error`), never a silent return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Notice,
    Debug(u8),
}

/// Receives diagnostics raised while a [`Context`] is in use.
///
/// The default reporter forwards to the `log` crate at the matching level
/// (`log::error!`, `log::warn!` for notices, `log::debug!` for debug
/// levels), mirroring `RTDEBUG`/`RTDEBUGF` in `rtgeom_log.h`. Hosts that want
/// diagnostics routed elsewhere (a GIS toolkit's own log sink, a test
/// harness that collects messages) can supply their own.
pub trait Reporter: fmt::Debug {
    fn report(&self, severity: Severity, message: &str);
}

/// The `log`-crate-backed reporter used when a [`Context`] isn't given one
/// explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => log::error!("{message}"),
            Severity::Notice => log::warn!("{message}"),
            Severity::Debug(level) => log::debug!("[level {level}] {message}"),
        }
    }
}

/// A process- or thread-local handle threaded through every public
/// operation: the reporter hook and the cooperative interrupt flag.
///
/// Two threads sharing one `Context` race only on the interrupt flag (which
/// is an [`AtomicBool`] for exactly this reason); two threads each holding
/// their own `Context` never race on anything. There is no process-wide
/// singleton: callers construct a `Context` (or use [`Context::default`])
/// and pass it to every entry point that needs one.
#[derive(Clone)]
pub struct Context {
    reporter: Arc<dyn Reporter + Send + Sync>,
    interrupted: Arc<AtomicBool>,
    debug_level: Arc<AtomicU8>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("interrupted", &self.is_interrupted())
            .field("debug_level", &self.debug_level.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context {
            reporter: Arc::new(LogReporter),
            interrupted: Arc::new(AtomicBool::new(false)),
            debug_level: Arc::new(AtomicU8::new(0)),
        }
    }
}

impl Context {
    /// Builds a context backed by a custom [`Reporter`].
    pub fn with_reporter(reporter: impl Reporter + Send + Sync + 'static) -> Self {
        Context {
            reporter: Arc::new(reporter),
            ..Context::default()
        }
    }

    /// Sets the debug verbosity used to gate `self.debug(level, ...)` calls.
    pub fn set_debug_level(&self, level: u8) {
        self.debug_level.store(level, Ordering::Relaxed);
    }

    pub fn notice(&self, message: impl fmt::Display) {
        self.reporter.report(Severity::Notice, &message.to_string());
    }

    pub fn debug(&self, level: u8, message: impl fmt::Display) {
        if level <= self.debug_level.load(Ordering::Relaxed) {
            self.reporter
                .report(Severity::Debug(level), &message.to_string());
        }
    }

    pub(crate) fn report_error(&self, message: impl fmt::Display) {
        self.reporter.report(Severity::Error, &message.to_string());
    }

    /// Sets the cooperative interrupt flag. Safe to call from another
    /// thread sharing this `Context`, or from a signal handler.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Clears the interrupt flag, e.g. before starting a new top-level call.
    pub fn clear_interrupt(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Polled at the head of long loops (Simplify, Subdivide, Distance,
    /// Stroke). Never preempted -- the current iteration always completes
    /// before the check is observed.
    pub fn check_interrupt(&self) -> crate::error::Result<()> {
        if self.is_interrupted() {
            self.report_error("interrupted");
            Err(crate::error::Error::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_not_interrupted() {
        let ctx = Context::default();
        assert!(!ctx.is_interrupted());
        assert!(ctx.check_interrupt().is_ok());
    }

    #[test]
    fn interrupt_is_observed_and_clearable() {
        let ctx = Context::default();
        ctx.interrupt();
        assert!(ctx.check_interrupt().is_err());
        ctx.clear_interrupt();
        assert!(ctx.check_interrupt().is_ok());
    }
}
