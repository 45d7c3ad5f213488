//! Specialized collection types
//!
//! [`DeferredQueue`] is the mark-then-flush primitive shared by the scene and
//! the ECS world: structural changes requested while a collection is being
//! iterated are queued and applied at a safe point afterwards.

/// Upper bound on flush passes when applied operations queue further operations
pub const MAX_FLUSH_PASSES: usize = 16;

/// Queue of structural operations waiting for a flush point
#[derive(Debug)]
pub struct DeferredQueue<Op> {
    ops: Vec<Op>,
}

impl<Op> DeferredQueue<Op> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Queue an operation
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Current queue position, for a later [`rollback_to`](Self::rollback_to)
    pub fn checkpoint(&self) -> usize {
        self.ops.len()
    }

    /// Discard everything queued after `checkpoint`, returning the discarded operations
    pub fn rollback_to(&mut self, checkpoint: usize) -> Vec<Op> {
        if checkpoint >= self.ops.len() {
            return Vec::new();
        }
        self.ops.split_off(checkpoint)
    }

    /// Operations queued after `checkpoint`
    pub fn since(&self, checkpoint: usize) -> &[Op] {
        self.ops.get(checkpoint..).unwrap_or(&[])
    }

    /// Remove and return every queued operation
    pub fn take(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    /// Queued operations in submission order
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Drop every queued operation
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl<Op> Default for DeferredQueue<Op> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of flushing a deferred queue
#[derive(Debug)]
pub struct FlushOutcome<E> {
    /// Operations applied successfully
    pub applied: usize,
    /// Operations that failed, in application order
    pub errors: Vec<E>,
    /// Operations still queued after the pass limit was reached
    pub leftover: usize,
}

impl<E> Default for FlushOutcome<E> {
    fn default() -> Self {
        Self { applied: 0, errors: Vec::new(), leftover: 0 }
    }
}

impl<E> FlushOutcome<E> {
    /// Whether every operation applied cleanly
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.leftover == 0
    }
}

/// A collection that owns a [`DeferredQueue`] of its own operations
pub trait DeferredTarget {
    /// Operation type stored in the queue
    type Op;
    /// Error produced when an operation cannot be applied
    type Error;

    /// The collection's queue
    fn deferred_queue(&mut self) -> &mut DeferredQueue<Self::Op>;

    /// Apply one operation immediately
    fn apply_deferred(&mut self, op: Self::Op) -> Result<(), Self::Error>;

    /// Apply everything queued, including operations queued by the flush itself
    ///
    /// A failing operation does not stop the flush; its error is collected.
    fn flush_deferred(&mut self) -> FlushOutcome<Self::Error> {
        let mut outcome = FlushOutcome::default();
        for _ in 0..MAX_FLUSH_PASSES {
            let ops = self.deferred_queue().take();
            if ops.is_empty() {
                return outcome;
            }
            for op in ops {
                match self.apply_deferred(op) {
                    Ok(()) => outcome.applied += 1,
                    Err(error) => outcome.errors.push(error),
                }
            }
        }
        outcome.leftover = self.deferred_queue().len();
        outcome
    }
}
