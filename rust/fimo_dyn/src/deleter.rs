//! Deleters of owning pointers.
use crate::list::InterfaceList;
use std::ptr::NonNull;

/// Deallocation strategy of an owning pointer.
///
/// A deleter is either non-destroying, in which case the pointer runs the in-place
/// destructor of the object before invoking the deleter, or destroying, in which case the
/// deleter both destroys and deallocates the object. Owned arrays can only be released by
/// array deleters.
///
/// # Safety
///
/// A non-destroying deleter must not access the object, as it has already been dropped. A
/// destroying deleter must drop the object exactly once. An array deleter must drop every
/// element of the array.
pub unsafe trait Deleter {
    /// Whether the deleter destroys the object.
    const DESTROYING: bool;

    /// Whether the deleter releases arrays of objects.
    ///
    /// Array deleters must be destroying.
    const ARRAY: bool = false;

    /// Returns the number of elements released by an array deleter.
    fn array_len(&self) -> usize {
        0
    }

    /// Deletes the object.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an object whose tables are `tables` and which is owned by the
    /// caller. If the deleter is not destroying, the object must have already been dropped.
    unsafe fn delete<L: InterfaceList>(&mut self, ptr: NonNull<()>, tables: &L::Tables);
}

/// Deleters capable of releasing objects allocated by a [`Box`].
///
/// # Safety
///
/// Deleting an object allocated by a `Box<T>` with a default constructed deleter must
/// release the allocation of the box.
pub unsafe trait BoxCompatible: Deleter + Default {}

/// Non-destroying deleter for objects allocated by the global allocator.
///
/// Only the memory is released, with the layout recorded in the tables.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDelete;

// Safety: Only the memory is released.
unsafe impl Deleter for DefaultDelete {
    const DESTROYING: bool = false;

    unsafe fn delete<L: InterfaceList>(&mut self, ptr: NonNull<()>, tables: &L::Tables) {
        let layout = L::head(tables).layout();
        if layout.size() != 0 {
            // Safety: The object was allocated with the global allocator and the layout of `T`.
            unsafe { std::alloc::dealloc(ptr.as_ptr().cast(), layout) }
        }
    }
}

// Safety: A `Box<T>` allocates with the global allocator and the layout of `T`.
unsafe impl BoxCompatible for DefaultDelete {}

/// Destroying deleter for objects allocated by a [`Box`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoxDelete;

// Safety: The object is dropped by the drop glue of the box.
unsafe impl Deleter for BoxDelete {
    const DESTROYING: bool = true;

    unsafe fn delete<L: InterfaceList>(&mut self, ptr: NonNull<()>, tables: &L::Tables) {
        // Safety: The object was allocated by a `Box`.
        unsafe { L::head(tables).drop_box(ptr.as_ptr()) }
    }
}

// Safety: See above.
unsafe impl BoxCompatible for BoxDelete {}

/// Destroying deleter for slices allocated by a [`Box`].
///
/// Arrays are always deleted in one step.
#[cfg(feature = "array")]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDelete {
    len: usize,
}

#[cfg(feature = "array")]
impl ArrayDelete {
    /// Constructs a deleter for a slice of `len` elements.
    pub const fn new(len: usize) -> Self {
        Self { len }
    }

    /// Returns the number of elements.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the slice is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Safety: The elements are dropped by the drop glue of the boxed slice.
#[cfg(feature = "array")]
unsafe impl Deleter for ArrayDelete {
    const DESTROYING: bool = true;
    const ARRAY: bool = true;

    fn array_len(&self) -> usize {
        self.len
    }

    unsafe fn delete<L: InterfaceList>(&mut self, ptr: NonNull<()>, tables: &L::Tables) {
        // Safety: The slice was allocated by a `Box<[T]>` of `len` elements.
        unsafe { L::head(tables).drop_array(ptr.as_ptr(), self.len) }
    }
}

/// Deleter that never releases anything.
///
/// Used by borrowed pointers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoDelete;

// Safety: Does nothing.
unsafe impl Deleter for NoDelete {
    const DESTROYING: bool = false;

    unsafe fn delete<L: InterfaceList>(&mut self, _ptr: NonNull<()>, _tables: &L::Tables) {}
}

crate::sa::const_assert!(!DefaultDelete::ARRAY && !BoxDelete::ARRAY && !NoDelete::ARRAY);
#[cfg(feature = "array")]
crate::sa::const_assert!(ArrayDelete::ARRAY && ArrayDelete::DESTROYING);
