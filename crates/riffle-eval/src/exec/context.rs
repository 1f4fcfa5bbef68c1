//! Evaluation context for row pipelines.
//!
//! The context carries cooperative cancellation, runtime configuration, and
//! execution statistics. One context serves one pipeline execution; the
//! cancellation flag may be shared with other threads through a
//! [`CancellationToken`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{EvalError, EvalResult};

/// How unresolved names and mistyped path steps surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypingMode {
    /// An unbound variable or a path into a non-struct is an error.
    #[default]
    Strict,
    /// Both produce `Missing` instead of failing.
    Permissive,
}

/// Evaluation context for one pipeline execution.
///
/// The context provides:
/// - Cancellation support, checked at row boundaries
/// - Execution statistics
/// - Runtime configuration
#[derive(Debug)]
pub struct EvalContext {
    /// Whether evaluation has been cancelled.
    cancelled: Arc<AtomicBool>,
    /// Execution statistics.
    stats: EvalStats,
    /// Configuration options.
    config: EvalConfig,
}

impl EvalContext {
    /// Creates a new evaluation context with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            stats: EvalStats::new(),
            config: EvalConfig::default(),
        }
    }

    /// Sets the evaluation configuration.
    #[must_use]
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Cancels the evaluation.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Checks if the evaluation has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`EvalError::Interrupted`] if cancellation was requested.
    ///
    /// Called at row boundaries only, never while a row's registers are
    /// partially written.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Interrupted`] once [`cancel`](Self::cancel) has
    /// been called.
    #[inline]
    pub fn check_interrupted(&self) -> EvalResult<()> {
        if self.is_cancelled() {
            return Err(EvalError::Interrupted);
        }
        Ok(())
    }

    /// Returns a token sharing this context's cancellation flag.
    ///
    /// The token can be moved to another thread to cancel a running
    /// pipeline from outside.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Returns the execution statistics.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Returns mutable configuration.
    pub fn config_mut(&mut self) -> &mut EvalConfig {
        &mut self.config
    }

    /// Returns the typing mode.
    #[inline]
    #[must_use]
    pub fn typing(&self) -> TypingMode {
        self.config.typing
    }

    /// Returns the partition buffering limit.
    ///
    /// Returns 0 if the limit is disabled.
    #[inline]
    #[must_use]
    pub fn max_partition_rows(&self) -> usize {
        self.config.max_partition_rows
    }

    /// Records that a window partition was fully evaluated.
    #[inline]
    pub fn record_partition_evaluated(&self) {
        self.stats
            .partitions_evaluated
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Records that rows were buffered for window evaluation.
    #[inline]
    pub fn record_rows_buffered(&self, count: u64) {
        self.stats.rows_buffered.fetch_add(count, Ordering::Relaxed);
    }

    /// Records that an overload dispatch took place.
    #[inline]
    pub fn record_dispatch(&self) {
        self.stats.dispatch_calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics collected during pipeline evaluation.
#[derive(Debug)]
pub struct EvalStats {
    /// When evaluation started.
    start_time: Instant,
    /// Number of window partitions evaluated.
    partitions_evaluated: AtomicU64,
    /// Number of rows buffered for window evaluation.
    rows_buffered: AtomicU64,
    /// Number of runtime overload dispatches.
    dispatch_calls: AtomicU64,
}

impl EvalStats {
    /// Creates new evaluation statistics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            partitions_evaluated: AtomicU64::new(0),
            rows_buffered: AtomicU64::new(0),
            dispatch_calls: AtomicU64::new(0),
        }
    }

    /// Returns the number of window partitions evaluated.
    #[inline]
    #[must_use]
    pub fn partitions_evaluated(&self) -> u64 {
        self.partitions_evaluated.load(Ordering::Relaxed)
    }

    /// Returns the number of rows buffered for window evaluation.
    #[inline]
    #[must_use]
    pub fn rows_buffered(&self) -> u64 {
        self.rows_buffered.load(Ordering::Relaxed)
    }

    /// Returns the number of runtime overload dispatches.
    #[inline]
    #[must_use]
    pub fn dispatch_calls(&self) -> u64 {
        self.dispatch_calls.load(Ordering::Relaxed)
    }

    /// Returns the elapsed evaluation time.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for EvalStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Default partition buffering limit (1 million rows).
pub const DEFAULT_MAX_PARTITION_ROWS: usize = 1_000_000;

/// Configuration options for pipeline evaluation.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Typing mode for name resolution and path steps.
    pub typing: TypingMode,
    /// Maximum number of rows one window partition may buffer.
    ///
    /// The window splice materializes a whole partition before evaluating
    /// it; exceeding this limit fails the pipeline with
    /// [`EvalError::PartitionLimitExceeded`]. Set to 0 to disable the
    /// limit. Default: 1,000,000 rows.
    pub max_partition_rows: usize,
    /// Whether to collect detailed statistics.
    pub collect_stats: bool,
}

impl EvalConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            typing: TypingMode::Strict,
            max_partition_rows: DEFAULT_MAX_PARTITION_ROWS,
            collect_stats: false,
        }
    }

    /// Sets the typing mode.
    #[must_use]
    pub const fn with_typing(mut self, typing: TypingMode) -> Self {
        self.typing = typing;
        self
    }

    /// Sets the partition buffering limit.
    ///
    /// Set to 0 to disable the limit.
    #[must_use]
    pub const fn with_max_partition_rows(mut self, limit: usize) -> Self {
        self.max_partition_rows = limit;
        self
    }

    /// Enables statistics collection.
    #[must_use]
    pub const fn with_stats(mut self) -> Self {
        self.collect_stats = true;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for cancelling pipeline evaluation.
///
/// Can be shared between threads to allow cancellation from outside the
/// evaluating thread.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new standalone cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancels the associated evaluation.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Checks if cancellation was requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
