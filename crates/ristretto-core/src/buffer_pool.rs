/// Allocation counters for a [`BufferPool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocations: usize,
    pub reuses: usize,
    /// Released buffers dropped because the free list was full.
    pub discarded: usize,
}

/// Recycles sample vectors between pipeline or export runs.
///
/// Single-owner: the pool lives on the orchestrating thread and hands
/// buffers out by value. A released buffer keeps its capacity and is
/// reused by the next `acquire` that fits.
#[derive(Debug)]
pub struct BufferPool<T> {
    free: Vec<Vec<T>>,
    max_free: usize,
    stats: PoolStats,
}

impl<T: Copy + Default> BufferPool<T> {
    pub const DEFAULT_MAX_FREE: usize = 16;

    pub fn new() -> Self {
        Self::with_max_free(Self::DEFAULT_MAX_FREE)
    }

    pub fn with_max_free(max_free: usize) -> Self {
        Self {
            free: Vec::new(),
            max_free,
            stats: PoolStats::default(),
        }
    }

    /// A buffer of `len` default-valued elements.
    pub fn acquire(&mut self, len: usize) -> Vec<T> {
        // Prefer the smallest free buffer that already fits; otherwise grow
        // the largest one rather than allocating from scratch.
        let fitting = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, b)| b.capacity() >= len)
            .min_by_key(|(_, b)| b.capacity())
            .map(|(i, _)| i);
        let candidate = fitting.or_else(|| {
            self.free
                .iter()
                .enumerate()
                .max_by_key(|(_, b)| b.capacity())
                .map(|(i, _)| i)
        });

        let mut buf = match candidate {
            Some(i) => {
                self.stats.reuses += 1;
                self.free.swap_remove(i)
            }
            None => {
                self.stats.allocations += 1;
                Vec::with_capacity(len)
            }
        };
        buf.clear();
        buf.resize(len, T::default());
        buf
    }

    pub fn release(&mut self, buf: Vec<T>) {
        if self.free.len() >= self.max_free || buf.capacity() == 0 {
            self.stats.discarded += 1;
            return;
        }
        self.free.push(buf);
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Copy + Default> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_allocates_when_empty() {
        let mut pool = BufferPool::<u16>::new();
        let buf = pool.acquire(12);
        assert_eq!(buf, vec![0; 12]);
        assert_eq!(pool.stats().allocations, 1);
        assert_eq!(pool.stats().reuses, 0);
    }

    #[test]
    fn released_buffer_is_reused_and_zeroed() {
        let mut pool = BufferPool::<u8>::new();
        let mut buf = pool.acquire(64);
        buf.fill(9);
        let ptr = buf.as_ptr();
        pool.release(buf);

        let again = pool.acquire(32);
        assert_eq!(again.as_ptr(), ptr);
        assert!(again.iter().all(|&b| b == 0));
        assert_eq!(again.len(), 32);
        assert_eq!(pool.stats().reuses, 1);
        assert_eq!(pool.free_len(), 0);
    }

    #[test]
    fn picks_smallest_fitting_buffer() {
        let mut pool = BufferPool::<u8>::new();
        pool.release(Vec::with_capacity(1000));
        pool.release(Vec::with_capacity(100));
        let buf = pool.acquire(50);
        assert!(buf.capacity() >= 100 && buf.capacity() < 1000);
        assert_eq!(pool.free_len(), 1);
    }

    #[test]
    fn free_list_is_bounded() {
        let mut pool = BufferPool::<u8>::with_max_free(2);
        for _ in 0..3 {
            pool.release(vec![0; 4]);
        }
        assert_eq!(pool.free_len(), 2);
        assert_eq!(pool.stats().discarded, 1);
    }
}
