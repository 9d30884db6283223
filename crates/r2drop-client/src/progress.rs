//! Upload progress as a lazy, restartable sequence.

/// Chunk size used when none is given: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes sent so far out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTick {
    /// Cumulative bytes handed to the transport.
    pub sent: u64,
    /// Size of the whole body.
    pub total: u64,
}

impl ProgressTick {
    /// Completion in percent, `100` for an empty body.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        // sent <= total, so the quotient fits in 0..=100.
        u8::try_from(self.sent.saturating_mul(100) / self.total).unwrap_or(100)
    }

    /// Whether this is the final tick.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.sent == self.total
    }
}

/// How a body of `total` bytes is cut into chunks.
///
/// A plan is a value; [`ProgressPlan::ticks`] can be called any number of
/// times and every call starts from zero.
///
/// # Examples
///
/// ```
/// use r2drop_client::ProgressPlan;
///
/// let plan = ProgressPlan::new(10, 4);
/// let sent: Vec<u64> = plan.ticks().map(|t| t.sent).collect();
/// assert_eq!(sent, vec![4, 8, 10]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPlan {
    total: u64,
    chunk_size: u64,
}

impl ProgressPlan {
    /// Plan `total` bytes in chunks of `chunk_size` (at least one byte).
    #[must_use]
    pub fn new(total: u64, chunk_size: usize) -> Self {
        Self {
            total,
            chunk_size: u64::try_from(chunk_size.max(1)).unwrap_or(u64::MAX),
        }
    }

    /// Plan `total` bytes with [`DEFAULT_CHUNK_SIZE`].
    #[must_use]
    pub fn with_default_chunks(total: u64) -> Self {
        Self::new(total, DEFAULT_CHUNK_SIZE)
    }

    /// Total bytes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes per chunk.
    #[must_use]
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of ticks [`ProgressPlan::ticks`] yields.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.total.div_ceil(self.chunk_size).max(1)
    }

    /// A fresh tick sequence.
    #[must_use]
    pub fn ticks(&self) -> ProgressTicks {
        ProgressTicks {
            plan: *self,
            sent: 0,
            done: false,
        }
    }
}

/// Iterator over the ticks of a [`ProgressPlan`].
///
/// Ticks are strictly increasing except for an empty body, which yields a
/// single `0 / 0` tick. The last tick always has `sent == total`.
#[derive(Debug, Clone)]
pub struct ProgressTicks {
    plan: ProgressPlan,
    sent: u64,
    done: bool,
}

impl Iterator for ProgressTicks {
    type Item = ProgressTick;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.sent = self
            .sent
            .saturating_add(self.plan.chunk_size)
            .min(self.plan.total);
        if self.sent == self.plan.total {
            self.done = true;
        }
        Some(ProgressTick {
            sent: self.sent,
            total: self.plan.total,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = (self.plan.total - self.sent)
            .div_ceil(self.plan.chunk_size)
            .max(1);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ProgressTicks {}

impl std::iter::FusedIterator for ProgressTicks {}
