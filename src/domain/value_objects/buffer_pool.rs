use parking_lot::Mutex;

/// Default number of buffers retained by a pool.
pub const DEFAULT_POOL_CAPACITY: usize = 20;

/// Bounded, non-blocking cache of scratch buffers.
///
/// Neither `acquire` nor `release` ever waits: if the pool is contended,
/// empty or full, the call falls back to allocating or dropping.
#[derive(Debug)]
pub struct BufferPool {
    slots: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Take an empty buffer able to hold at least `size` bytes.
    /// Pooled buffers that are too small are discarded.
    pub fn acquire(&self, size: usize) -> Vec<u8> {
        if let Some(mut slots) = self.slots.try_lock() {
            while let Some(mut buf) = slots.pop() {
                if buf.capacity() >= size {
                    buf.clear();
                    return buf;
                }
            }
        }
        Vec::with_capacity(size)
    }

    /// Return a buffer to the pool. Dropped if the pool is full or busy.
    pub fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        if let Some(mut slots) = self.slots.try_lock() {
            if slots.len() < self.capacity {
                slots.push(buf);
            }
        }
    }

    /// Number of buffers currently pooled.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_from_empty_pool_allocates() {
        let pool = BufferPool::new(2);
        let buf = pool.acquire(64);
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 64);
    }

    #[test]
    fn test_released_buffer_is_reused_and_cleared() {
        let pool = BufferPool::new(2);
        let mut buf = pool.acquire(16);
        buf.extend_from_slice(b"secret-contents");
        let ptr = buf.as_ptr();
        pool.release(buf);
        assert_eq!(pool.len(), 1);

        let reused = pool.acquire(8);
        assert!(reused.is_empty(), "reused buffer must not leak contents");
        assert_eq!(reused.as_ptr(), ptr);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_too_small_buffers_are_discarded() {
        let pool = BufferPool::new(2);
        pool.release(Vec::with_capacity(4));
        let buf = pool.acquire(1024);
        assert!(buf.capacity() >= 1024);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_into_full_pool_drops_buffer() {
        let pool = BufferPool::new(1);
        pool.release(Vec::with_capacity(8));
        pool.release(Vec::with_capacity(8));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_acquire_does_not_block_while_pool_is_held() {
        let pool = BufferPool::new(2);
        pool.release(Vec::with_capacity(32));
        let _guard = pool.slots.lock();
        let buf = pool.acquire(32);
        assert!(buf.capacity() >= 32);
    }
}
