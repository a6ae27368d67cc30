//! Capability tables.
use crate::{
    interface::{Interface, MarkerCompatible},
    method::This,
};
use std::{alloc::Layout, fmt::Debug, marker::PhantomData, ops::Deref};

/// Header shared by all capability tables.
///
/// Contains the data required for destroying and deallocating the concrete object, and its
/// name for diagnostics. The header is identical in every table built for the same type.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct VTableHead {
    drop_in_place: unsafe fn(*mut ()),
    drop_box: unsafe fn(*mut ()),
    #[cfg(feature = "array")]
    drop_array: unsafe fn(*mut (), usize),
    size: usize,
    align: usize,
    object_name: fn() -> &'static str,
    interface_name: fn() -> &'static str,
}

impl VTableHead {
    const fn new<T, I>() -> Self {
        Self {
            drop_in_place: drop_obj_in_place::<T>,
            drop_box: drop_obj_box::<T>,
            #[cfg(feature = "array")]
            drop_array: drop_obj_array::<T>,
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            object_name: type_name::<T>,
            interface_name: type_name::<I>,
        }
    }

    /// Drops the object in place, without deallocating its memory.
    ///
    /// # Safety
    ///
    /// See [`std::ptr::drop_in_place`]. `ptr` must point to an object of the type the table
    /// was built for.
    pub unsafe fn drop_in_place(&self, ptr: *mut ()) {
        // Safety: Guaranteed by the caller.
        unsafe { (self.drop_in_place)(ptr) }
    }

    /// Drops and deallocates an object allocated by a [`Box`].
    ///
    /// # Safety
    ///
    /// `ptr` must originate from [`Box::into_raw`] of a `Box<T>`, where `T` is the type the
    /// table was built for.
    pub unsafe fn drop_box(&self, ptr: *mut ()) {
        // Safety: Guaranteed by the caller.
        unsafe { (self.drop_box)(ptr) }
    }

    /// Drops and deallocates a slice of `len` objects allocated by a [`Box`].
    ///
    /// # Safety
    ///
    /// `ptr` must originate from [`Box::into_raw`] of a `Box<[T]>` containing `len` elements,
    /// where `T` is the type the table was built for.
    #[cfg(feature = "array")]
    pub unsafe fn drop_array(&self, ptr: *mut (), len: usize) {
        // Safety: Guaranteed by the caller.
        unsafe { (self.drop_array)(ptr, len) }
    }

    /// Retrieves the size of the object.
    pub fn size_of(&self) -> usize {
        self.size
    }

    /// Retrieves the alignment of the object.
    pub fn align_of(&self) -> usize {
        self.align
    }

    /// Retrieves the memory layout of the object.
    pub fn layout(&self) -> Layout {
        // Safety: Both values were taken from an existing type.
        unsafe { Layout::from_size_align_unchecked(self.size, self.align) }
    }

    /// Retrieves the name of the underlying object.
    pub fn object_name(&self) -> &'static str {
        (self.object_name)()
    }

    /// Retrieves the name of the interface the table was built for.
    pub fn interface_name(&self) -> &'static str {
        (self.interface_name)()
    }
}

impl Debug for VTableHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VTableHead")
            .field("object", &self.object_name())
            .field("interface", &self.interface_name())
            .field("size", &self.size)
            .field("align", &self.align)
            .finish_non_exhaustive()
    }
}

/// Capability table of an interface `I`, built for one concrete type.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct VTable<I: Interface> {
    head: VTableHead,
    interface: I,
}

impl<I: Interface> VTable<I> {
    /// Builds the table of `T` from the implementations of the interface.
    ///
    /// # Examples
    ///
    /// ```
    /// use fimo_dyn::{interface, VTable};
    ///
    /// interface! {
    ///     pub struct IName {
    ///         pub name: fn() -> &'static str,
    ///     }
    /// }
    ///
    /// struct Cat;
    ///
    /// static TABLE: VTable<IName> = VTable::new::<Cat>(IName {
    ///     name: fimo_dyn::DynMethod::new(|| "cat"),
    /// });
    ///
    /// assert_eq!(TABLE.name.call(), "cat");
    /// assert_eq!(TABLE.head().size_of(), 0);
    /// ```
    pub const fn new<T>(interface: I) -> Self
    where
        I::Marker: MarkerCompatible<T>,
    {
        Self {
            head: VTableHead::new::<T, I>(),
            interface,
        }
    }

    /// Returns the header of the table.
    pub const fn head(&self) -> &VTableHead {
        &self.head
    }

    /// Returns the interface instance.
    pub const fn interface(&self) -> &I {
        &self.interface
    }
}

impl<I: Interface> Deref for VTable<I> {
    type Target = I;

    fn deref(&self) -> &Self::Target {
        &self.interface
    }
}

/// View of an object through one of its interfaces.
///
/// Pairs the [`This`] handle of the object with the capability table, allowing the methods
/// of the interface to be invoked with the handle pre-supplied.
pub struct Bound<'a, I: Interface> {
    this: This,
    vtable: &'static VTable<I>,
    _phantom: PhantomData<&'a ()>,
}

impl<'a, I: Interface> Bound<'a, I> {
    pub(crate) fn new(this: This, vtable: &'static VTable<I>) -> Self {
        Self {
            this,
            vtable,
            _phantom: PhantomData,
        }
    }

    /// Returns the handle to the object.
    pub fn this(&self) -> This {
        self.this
    }

    /// Returns the capability table.
    pub fn vtable(&self) -> &'static VTable<I> {
        self.vtable
    }
}

impl<I: Interface> Clone for Bound<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: Interface> Copy for Bound<'_, I> {}

impl<I: Interface> Deref for Bound<'_, I> {
    type Target = I;

    fn deref(&self) -> &Self::Target {
        &self.vtable.interface
    }
}

impl<I: Interface> Debug for Bound<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound")
            .field("this", &self.this)
            .field("vtable", self.vtable.head())
            .finish()
    }
}

/// Drops the pointed to value.
///
/// # Safety
///
/// See [`std::ptr::drop_in_place`].
unsafe fn drop_obj_in_place<T>(ptr: *mut ()) {
    // Safety: Guaranteed by the caller.
    unsafe { std::ptr::drop_in_place::<T>(ptr.cast()) }
}

/// Drops and deallocates a boxed value.
///
/// # Safety
///
/// See [`Box::from_raw`].
unsafe fn drop_obj_box<T>(ptr: *mut ()) {
    // Safety: Guaranteed by the caller.
    drop(unsafe { Box::<T>::from_raw(ptr.cast()) })
}

/// Drops and deallocates a boxed slice.
///
/// # Safety
///
/// See [`Box::from_raw`].
#[cfg(feature = "array")]
unsafe fn drop_obj_array<T>(ptr: *mut (), len: usize) {
    let slice = std::ptr::slice_from_raw_parts_mut(ptr.cast::<T>(), len);
    // Safety: Guaranteed by the caller.
    drop(unsafe { Box::<[T]>::from_raw(slice) })
}

fn type_name<T>() -> &'static str {
    std::any::type_name::<T>()
}
