//! Fixed-capacity ring buffer for samples, peaks and RR intervals
//!
//! One generic bounded ring replaces the per-buffer raw-array/modulo
//! bookkeeping. Storage is allocated inline at construction; pushing past
//! capacity silently overwrites the oldest element, which is the accepted
//! lossy policy for live biosignal data.

/// Overwrite-oldest ring buffer with inline storage.
///
/// `N` is the fixed capacity. All operations are O(1) except iteration.
#[derive(Debug, Clone)]
pub struct Ring<T, const N: usize> {
    slots: [T; N],
    /// Next write position
    head: usize,
    /// Number of live elements (<= N)
    len: usize,
    /// Total elements ever pushed, survives overwrites
    total: u64,
}

impl<T: Copy + Default, const N: usize> Ring<T, N> {
    /// Create an empty ring with pre-zeroed storage.
    pub fn new() -> Self {
        Self {
            slots: [T::default(); N],
            head: 0,
            len: 0,
            total: 0,
        }
    }

    /// Fixed capacity of the ring.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no element has been pushed since construction or `clear`.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total elements ever pushed, including overwritten ones.
    pub fn total_pushed(&self) -> u64 {
        self.total
    }

    /// Append an element, overwriting the oldest when full.
    pub fn push(&mut self, item: T) {
        self.slots[self.head] = item;
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
        self.total += 1;
    }

    /// Most recently pushed element, if any.
    pub fn last(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        Some(&self.slots[(self.head + N - 1) % N])
    }

    /// Element at logical index `i`, where 0 is the oldest live element.
    pub fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            return None;
        }
        Some(&self.slots[(self.head + N - self.len + i) % N])
    }

    /// Iterate the live elements oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Iterate the most recent `n` elements oldest-first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let take = n.min(self.len);
        let skip = self.len - take;
        (skip..self.len).filter_map(move |i| self.get(i))
    }

    /// Logically empty the ring without touching storage.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.total = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
