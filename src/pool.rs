//! Fixed-capacity object pool for per-level frames.
//!
//! Readers and writers acquire one [`Context`](crate::context::Context) per
//! nesting level and hand it back on container exit or on close. The pool is
//! the only state shared between independent readers and writers, so it is
//! guarded by a `parking_lot` mutex. An empty pool is not an error: `acquire`
//! falls back to a fresh allocation, and `release` drops objects once the pool
//! is full.

use parking_lot::Mutex;

/// Objects that can be recycled through a [`FramePool`].
pub trait Poolable: Default {
    /// Clears per-use state while keeping reusable allocations.
    fn reset(&mut self);
}

/// A thread-safe pool holding at most `capacity` idle objects.
///
/// # Examples
///
/// ```rust
/// use dson::ContextPool;
///
/// let pool: ContextPool<String> = ContextPool::new(4);
/// let frame = pool.acquire();
/// pool.release(frame);
/// assert_eq!(pool.idle(), 1);
/// ```
#[derive(Debug)]
pub struct FramePool<T> {
    slots: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Poolable> FramePool<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        FramePool {
            slots: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Takes an idle object, or allocates one when the pool is empty.
    pub fn acquire(&self) -> T {
        match self.slots.lock().pop() {
            Some(object) => object,
            None => {
                tracing::trace!("frame pool empty, allocating");
                T::default()
            }
        }
    }

    /// Resets the object and keeps it if the pool has room.
    pub fn release(&self, mut object: T) {
        object.reset();
        let mut slots = self.slots.lock();
        if slots.len() < self.capacity {
            slots.push(object);
        }
    }

    /// Number of idle objects currently held.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Scratch {
        data: Vec<u8>,
    }

    impl Poolable for Scratch {
        fn reset(&mut self) {
            self.data.clear();
        }
    }

    #[test]
    fn test_release_resets_and_reuses() {
        let pool = FramePool::<Scratch>::new(2);
        let mut scratch = pool.acquire();
        scratch.data.extend_from_slice(&[1, 2, 3]);
        pool.release(scratch);
        assert_eq!(pool.idle(), 1);

        let scratch = pool.acquire();
        assert!(scratch.data.is_empty());
        assert!(scratch.data.capacity() >= 3);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let pool = FramePool::<Scratch>::new(1);
        pool.release(Scratch::default());
        pool.release(Scratch::default());
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = Arc::new(FramePool::<Scratch>::new(16));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let scratch = pool.acquire();
                        pool.release(scratch);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.idle() <= 4);
        assert!(pool.idle() >= 1);
    }
}
