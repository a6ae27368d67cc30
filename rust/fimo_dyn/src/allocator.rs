//! Allocators for control blocks.
use crate::error::{Error, Result};
use std::{alloc::Layout, ptr::NonNull};

/// An allocator of memory blocks.
///
/// # Safety
///
/// Memory returned by [`allocate`](Allocator::allocate) must be valid for the requested
/// layout until it is passed to [`deallocate`](Allocator::deallocate), and clones of the
/// allocator must be able to deallocate it.
pub unsafe trait Allocator {
    /// Allocates a block of memory fitting the layout.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Deallocates a block of memory.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this allocator with `layout`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global memory allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Global;

// Safety: We forward to the global allocator.
unsafe impl Allocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        // A size of zero would be undefined behavior for the global allocator.
        if layout.size() == 0 {
            // Safety: Alignments are never zero.
            return Ok(unsafe { NonNull::new_unchecked(layout.align() as *mut u8) });
        }

        // Safety: The size is non-zero.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(Error::Alloc)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            // Safety: By the contract of `deallocate` this is sound.
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
        }
    }
}

crate::sa::assert_impl_all!(Global: Send, Sync);
