//! Heap and stack bookkeeping
//!
//! The heap grows up from the end of static data and the stack grows down
//! from the top of RAM. The allocator (not part of this crate) reports each
//! new heap end through [`HeapTracker::record_end`]; the gap between that end
//! and the current stack depth is the free space.
//!
//! Only meaningful on the single-stack, single-threaded boot environment:
//! with several stacks the probe measures whichever one is running.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Current heap extent
pub struct HeapTracker {
    start: usize,
    end: AtomicUsize,
}

impl HeapTracker {
    /// Empty heap beginning at `start`
    pub const fn new(start: usize) -> Self {
        Self {
            start,
            end: AtomicUsize::new(start),
        }
    }

    /// Heap starting at the linker's `_end` symbol
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    pub fn from_linker() -> Self {
        extern "C" {
            static _end: u8;
        }
        // SAFETY: only the symbol's address is taken, never its contents.
        let start = unsafe { core::ptr::addr_of!(_end) } as usize;
        Self::new(start)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Current heap end
    pub fn end(&self) -> usize {
        self.end.load(Ordering::Relaxed)
    }

    /// Record a new heap end after the allocator grew or shrank the heap
    pub fn record_end(&self, end: usize) {
        trace!("heap: end {:x}", end);
        self.end.store(end, Ordering::Relaxed);
    }

    /// Bytes handed out so far
    pub fn used(&self) -> usize {
        self.end().saturating_sub(self.start)
    }

    /// Bytes between the heap end and the caller's stack frame
    #[inline(never)]
    pub fn free(&self) -> usize {
        let probe = 0u8;
        self.free_below(core::ptr::addr_of!(probe) as usize)
    }

    /// Bytes between the heap end and `stack_addr`; zero once they meet
    pub fn free_below(&self, stack_addr: usize) -> usize {
        stack_addr.saturating_sub(self.end())
    }
}
