//! Debug/info logging macros shared across the `pyata` workspace.
//!
//! Modeled on the teacher's `chalk-macros` crate: a small, dependency-light
//! logging facility gated by a single process-wide boolean, rather than a
//! full structured-logging framework. `spec.md` §6 calls for exactly this: "a
//! single process-wide boolean DEBUG flag gates additional broadcast
//! instrumentation." The flag is read once from the environment via
//! `lazy_static`, matching the original Python's `Settings().DEBUG`
//! (`pyata/config.py`), which is also read once at import time.

#[macro_use]
extern crate lazy_static;

use std::cell::Cell;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

lazy_static! {
    static ref DEBUG_ENV: bool = {
        env::var("PYATA_DEBUG")
            .map(|v| v != "0" && !v.is_empty())
            .unwrap_or(false)
    };
}

static DEBUG_OVERRIDE: AtomicBool = AtomicBool::new(false);
static DEBUG_OVERRIDE_SET: AtomicBool = AtomicBool::new(false);

thread_local! {
    static INDENT: Cell<usize> = Cell::new(0);
}

/// Whether debug-mode instrumentation (hierarchical facet-mutation
/// broadcasts, proof-search tracing) is active for this process.
///
/// Checks a manual override first (set via [`set_debug`], used by tests that
/// want deterministic control over the flag) and otherwise falls back to the
/// `PYATA_DEBUG` environment variable read once at first use.
pub fn debug_enabled() -> bool {
    if DEBUG_OVERRIDE_SET.load(Ordering::Relaxed) {
        DEBUG_OVERRIDE.load(Ordering::Relaxed)
    } else {
        *DEBUG_ENV
    }
}

/// Force debug mode on or off for the remainder of the process, overriding
/// `PYATA_DEBUG`. Intended for tests that assert on debug-only behavior
/// (e.g. hierarchical broadcast firing) without relying on process
/// environment.
pub fn set_debug(enabled: bool) {
    DEBUG_OVERRIDE_SET.store(true, Ordering::Relaxed);
    DEBUG_OVERRIDE.store(enabled, Ordering::Relaxed);
}

#[doc(hidden)]
pub fn current_indent() -> usize {
    INDENT.with(|i| i.get())
}

#[doc(hidden)]
pub fn push_indent() {
    INDENT.with(|i| i.set(i.get() + 1));
}

#[doc(hidden)]
pub fn pop_indent() {
    INDENT.with(|i| i.set(i.get().saturating_sub(1)));
}

/// RAII guard that keeps the log indent level bumped for its lifetime.
/// Used by `debug_heading!`/`info_heading!` so every log line emitted while
/// a named phase is in progress is visually nested under it.
#[doc(hidden)]
pub struct IndentGuard(());

impl IndentGuard {
    pub fn new() -> Self {
        push_indent();
        IndentGuard(())
    }
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        pop_indent();
    }
}

#[doc(hidden)]
pub fn indent_guard() -> IndentGuard {
    IndentGuard::new()
}

#[doc(hidden)]
pub fn write_line(level: &str, args: std::fmt::Arguments) {
    let indent = current_indent();
    eprintln!("{:indent$}[{}] {}", "", level, args, indent = indent * 2);
}

/// Emit a debug-level line when debug mode is enabled. No-op (and the
/// format arguments are not even evaluated for their side effects beyond
/// normal `format_args!` rules) otherwise.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug_enabled() {
            $crate::write_line("debug", format_args!($($arg)*));
        }
    };
}

/// Like [`debug!`], but also opens an indent scope for the remainder of the
/// enclosing block: use as a statement (`debug_heading!("...", x);`), not an
/// expression.
#[macro_export]
macro_rules! debug_heading {
    ($($arg:tt)*) => {
        let __pyata_indent_guard = if $crate::debug_enabled() {
            $crate::write_line("debug", format_args!($($arg)*));
            Some($crate::indent_guard())
        } else {
            None
        };
    };
}

/// Emit an info-level line unconditionally — informational milestones
/// (solver start/stop, goal-stream exhaustion) that are useful even without
/// `PYATA_DEBUG` set, matching the teacher's `info!`/`info_heading!` split
/// from debug-only tracing.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::write_line("info", format_args!($($arg)*));
    };
}

/// Like [`info!`], but opens an indent scope; see [`debug_heading!`].
#[macro_export]
macro_rules! info_heading {
    ($($arg:tt)*) => {
        $crate::write_line("info", format_args!($($arg)*));
        let __pyata_indent_guard = $crate::indent_guard();
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_forces_state_regardless_of_env() {
        set_debug(true);
        assert!(debug_enabled());
        set_debug(false);
        assert!(!debug_enabled());
    }

    #[test]
    fn indent_guard_restores_depth_on_drop() {
        let base = current_indent();
        {
            let _g = indent_guard();
            assert_eq!(current_indent(), base + 1);
        }
        assert_eq!(current_indent(), base);
    }
}
