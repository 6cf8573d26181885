use std::fmt;

use log::{Level, LevelFilter};

/// Target used for every finder diagnostic.
pub const LOG_TARGET: &str = "waygraph";

/// Leveled diagnostics filtered by a per-finder threshold.
///
/// The threshold is applied before the global `log` filter, so two finders in
/// the same process can run with different verbosity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Diagnostics {
    threshold: LevelFilter,
}

impl Diagnostics {
    pub(crate) fn new(threshold: LevelFilter) -> Self {
        Self { threshold }
    }

    /// Whether events at `level` pass the threshold. Check this before
    /// building expensive messages.
    #[inline]
    pub(crate) fn enabled(&self, level: Level) -> bool {
        level <= self.threshold
    }

    pub(crate) fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: LOG_TARGET, level, "{args}");
        }
    }

    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub(crate) fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }
}
