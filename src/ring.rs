//! Fixed-capacity ring buffer backed by an array.
//!
//! Producers append whole slices or nothing; the single consumer releases
//! from the front in FIFO order.  Occupancy is tracked by an explicit length
//! instead of comparing head and tail, so "empty" and "full" are never
//! ambiguous:
//!
//! ```text
//!   read ──▶ [ o o o o . . . . ] ◀── read + len (write position)
//! ```
//!
//! Offsets handed out by [`RingBuffer::push_slice`] are absolute positions
//! modulo `N`; they stay valid until the bytes are released.

/// Occupancy of a ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Empty,
    Partial,
    Full,
}

pub struct RingBuffer<T: Copy + Default, const N: usize> {
    buf: [T; N],
    read: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self {
            buf: [T::default(); N],
            read: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn free(&self) -> usize {
        N - self.len
    }

    pub fn fill(&self) -> Fill {
        match self.len {
            0 => Fill::Empty,
            n if n == N => Fill::Full,
            _ => Fill::Partial,
        }
    }

    /// Append `items` as one contiguous logical run.
    ///
    /// Returns the start offset of the run, or `None` (buffer untouched) if
    /// there is not enough room for all of it.
    pub fn push_slice(&mut self, items: &[T]) -> Option<usize> {
        if items.len() > self.free() {
            return None;
        }
        let start = (self.read + self.len) % N;
        for (i, item) in items.iter().enumerate() {
            self.buf[(start + i) % N] = *item;
        }
        self.len += items.len();
        Some(start)
    }

    /// Element at absolute offset `pos` (wrapped modulo `N`).
    pub fn at(&self, pos: usize) -> T {
        self.buf[pos % N]
    }

    /// Copy `len` elements starting at absolute offset `start` into `out`.
    /// Returns the number of elements copied.
    pub fn copy_out(&self, start: usize, len: usize, out: &mut [T]) -> usize {
        let n = len.min(out.len());
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.buf[(start + i) % N];
        }
        n
    }

    /// Release `count` elements from the front.
    pub fn release(&mut self, count: usize) {
        let count = count.min(self.len);
        self.read = (self.read + count) % N;
        self.len -= count;
    }

    /// Distance from `start` to `end` going forward around the ring.
    pub fn span(start: usize, end: usize) -> usize {
        (end + N - start) % N
    }

    pub fn clear(&mut self) {
        self.read = 0;
        self.len = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
