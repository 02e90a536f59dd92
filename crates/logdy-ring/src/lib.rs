//! A fixed-capacity FIFO that overwrites its oldest element once full.
//!
//! Capacity is fixed at construction and the backing storage never
//! reallocates; a push past capacity silently evicts the oldest retained
//! element rather than growing the container or failing.

use thiserror::Error;

/// Errors raised by out-of-range reads. `push` never fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("index {0} out of bounds")]
    IndexOutOfBounds(usize),
    #[error("buffer is empty")]
    Empty,
}

/// Bounded ring buffer with overwrite-oldest semantics.
///
/// Logical index 0 always names the oldest currently-retained element;
/// `size() - 1` names the newest. Physical storage indices are derived from
/// logical indices via `(start + i) mod capacity`.
pub struct RingBuffer<T> {
    data: Vec<Option<T>>,
    start: usize,
    end: usize,
    full: bool,
}

impl<T: Clone> RingBuffer<T> {
    /// Create a ring of the given capacity. Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            data: vec![None; capacity],
            start: 0,
            end: 0,
            full: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current element count, `0..=capacity`.
    pub fn size(&self) -> usize {
        if self.full {
            return self.data.len();
        }
        if self.end >= self.start {
            self.end - self.start
        } else {
            self.data.len() - (self.start - self.end)
        }
    }

    /// Push `elem`. If full, overwrites the oldest element and advances
    /// both ends by one slot; otherwise appends. Always succeeds.
    pub fn push(&mut self, elem: T) {
        let cap = self.data.len();
        if self.full {
            self.data[self.end] = Some(elem);
            self.end = (self.end + 1) % cap;
            self.start = self.end;
            return;
        }

        self.data[self.end] = Some(elem);
        self.end = (self.end + 1) % cap;
        self.full = self.end == self.start;
    }

    /// Element at logical index `i` (0 = oldest retained).
    pub fn peek_idx(&self, i: usize) -> Result<T, RingError> {
        if i >= self.size() {
            return Err(RingError::IndexOutOfBounds(i));
        }
        let idx = (self.start + i) % self.data.len();
        Ok(self.data[idx].clone().expect("slot within size() is occupied"))
    }

    /// The newest retained element.
    pub fn peek_tail(&self) -> Result<T, RingError> {
        let sz = self.size();
        if sz == 0 {
            return Err(RingError::Empty);
        }
        self.peek_idx(sz - 1)
    }

    /// Fresh copy of every retained element from logical index `from` to the tail.
    pub fn peek_slice(&self, from: usize) -> Result<Vec<T>, RingError> {
        if from > self.size() {
            return Err(RingError::IndexOutOfBounds(from));
        }
        (from..self.size()).map(|i| self.peek_idx(i)).collect()
    }

    /// Forward scan from logical index 0. `f(element, index)` returns `true`
    /// to stop scanning early.
    pub fn scan(&self, mut f: impl FnMut(&T, usize) -> bool) {
        for i in 0..self.size() {
            let idx = (self.start + i) % self.data.len();
            let elem = self.data[idx].as_ref().expect("slot within size() is occupied");
            if f(elem, i) {
                break;
            }
        }
    }
}
