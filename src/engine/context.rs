//! Per-conversion bookkeeping: cooperative deadline and node count
//!
//! The deadline is cooperative, not preemptive. Rendering has to reach a
//! checkpoint to notice it:
//!
//! 1. after parsing
//! 2. every 100 DOM nodes during rendering
//! 3. after output normalization
//!
//! Nothing is spawned, so an expired conversion stops at the next checkpoint
//! and leaves no work running in the background.

use std::time::{Duration, Instant};

use crate::error::ConversionError;

/// Nodes rendered between deadline checks
const CHECKPOINT_INTERVAL: u64 = 100;

/// Tracks elapsed time and rendered nodes for one conversion
///
/// ```rust
/// use std::time::Duration;
/// use html_md_converter::engine::ConversionContext;
///
/// let mut ctx = ConversionContext::new(Duration::from_secs(5));
/// for _ in 0..1000 {
///     ctx.increment_and_check()?;
/// }
/// assert_eq!(ctx.node_count(), 1000);
/// # Ok::<(), html_md_converter::ConversionError>(())
/// ```
#[derive(Debug)]
pub struct ConversionContext {
    start_time: Instant,
    /// Zero disables the deadline
    timeout: Duration,
    node_count: u64,
}

impl ConversionContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            start_time: Instant::now(),
            timeout,
            node_count: 0,
        }
    }

    /// Fail with [`ConversionError::Timeout`] once the deadline has passed.
    pub fn check_timeout(&self) -> Result<(), ConversionError> {
        if !self.timeout.is_zero() && self.start_time.elapsed() > self.timeout {
            return Err(ConversionError::Timeout);
        }
        Ok(())
    }

    /// Count one rendered node, checking the deadline at every checkpoint.
    pub fn increment_and_check(&mut self) -> Result<(), ConversionError> {
        self.node_count += 1;
        if self.node_count.is_multiple_of(CHECKPOINT_INTERVAL) {
            self.check_timeout()?;
        }
        Ok(())
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn node_count(&self) -> u64 {
        self.node_count
    }
}
