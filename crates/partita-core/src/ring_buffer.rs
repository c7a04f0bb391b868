//! Growable circular sample store.
//!
//! [`RingBuffer`] is the hand-off point between the block producer (the graph's
//! output module) and a device callback. The producer appends whole blocks with
//! [`produce()`](RingBuffer::produce); the consumer drains from the front with
//! [`consume()`](RingBuffer::consume).
//!
//! The buffer is **not** synchronized. When producer and consumer live on
//! different threads, the owner pairs it with its own lock (see
//! `partita_io::OutputQueue`).
//!
//! # Growth
//!
//! A `produce` that would overflow reallocates storage to exactly the required
//! size and re-linearizes the unconsumed elements to offset 0, so logical order
//! survives any amount of wrap-around.

/// Growable FIFO ring buffer over `Copy` elements.
///
/// Logical element `i` (0 = oldest unconsumed) lives at physical index
/// `(start + i) % capacity`. Invariant: `size <= capacity`.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer<T> {
    storage: Vec<T>,
    size: usize,
    start: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Creates an empty buffer with no backing storage.
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            size: 0,
            start: 0,
        }
    }

    /// Creates an empty buffer with `capacity` elements of backing storage.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.reserve(capacity);
        buffer
    }

    /// Returns the number of unconsumed elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the length of the backing storage.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Reallocates storage to exactly `capacity` elements.
    ///
    /// Unconsumed elements are copied to the front of the new storage in logical
    /// order. When the unconsumed region wraps past the physical end, the tail
    /// segment is copied first, then the head segment.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < size()`.
    pub fn reserve(&mut self, capacity: usize) {
        assert!(
            capacity >= self.size,
            "ring buffer reserve({capacity}) below buffered size {}",
            self.size
        );

        let mut storage = vec![T::default(); capacity];
        let tail = self.size.min(self.storage.len() - self.start);
        let head = self.size - tail;
        storage[..tail].copy_from_slice(&self.storage[self.start..self.start + tail]);
        storage[tail..self.size].copy_from_slice(&self.storage[..head]);

        self.storage = storage;
        self.start = 0;
    }

    /// Appends `data` after the newest element, growing storage if needed.
    pub fn produce(&mut self, data: &[T]) {
        let count = data.len();
        if count == 0 {
            return;
        }

        let required = self.size + count;
        if required > self.capacity() {
            self.reserve(required);
        }

        let capacity = self.capacity();
        let end = (self.start + self.size) % capacity;
        let first = count.min(capacity - end);
        self.storage[end..end + first].copy_from_slice(&data[..first]);
        self.storage[..count - first].copy_from_slice(&data[first..]);
        self.size = required;
    }

    /// Moves the `data.len()` oldest elements into `data`.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() > size()`. Callers clamp the request to what is
    /// buffered first.
    pub fn consume(&mut self, data: &mut [T]) {
        let count = data.len();
        if count == 0 {
            return;
        }
        assert!(
            count <= self.size,
            "ring buffer underflow: requested {count}, buffered {}",
            self.size
        );

        let capacity = self.capacity();
        let first = count.min(capacity - self.start);
        data[..first].copy_from_slice(&self.storage[self.start..self.start + first]);
        data[first..].copy_from_slice(&self.storage[..count - first]);
        self.start = (self.start + count) % capacity;
        self.size -= count;
    }

    /// Discards every buffered element. Capacity is kept.
    pub fn clear(&mut self) {
        self.size = 0;
        self.start = 0;
    }
}
