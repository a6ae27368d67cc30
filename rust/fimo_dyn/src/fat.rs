//! Fat pointer to a concrete object.
use crate::{
    interface::Interface,
    list::{Contains, InterfaceList},
    method::This,
    object::{Extends, Object},
    vtable::{Bound, VTable, VTableHead},
};
use std::{
    fmt::{Debug, Pointer},
    marker::PhantomData,
    ops::Deref,
    ptr::NonNull,
};

/// Non-owning pointer to an object, carrying a reference to its composite table.
///
/// The pointer is two words wide, regardless of the number of interfaces. It is never
/// null, an optional pointer is expressed as `Option<FatPtr>`.
pub struct FatPtr<'a, T: Object> {
    ptr: NonNull<T>,
    composite: &'static <T::Interfaces as InterfaceList>::Composite,
    _phantom: PhantomData<&'a T>,
}

impl<'a, T: Object> FatPtr<'a, T> {
    /// Constructs a fat pointer from a reference.
    pub fn new(obj: &'a T) -> Self {
        Self {
            ptr: NonNull::from(obj),
            composite: T::composite(),
            _phantom: PhantomData,
        }
    }

    /// Constructs a fat pointer to the first element of a slice.
    ///
    /// Returns `None` if the slice is empty.
    #[cfg(feature = "array")]
    pub fn from_slice(slice: &'a [T]) -> Option<Self> {
        slice.first().map(Self::new)
    }

    /// Converts the pointer to a pointer to a base object.
    ///
    /// Both objects implement the same interfaces. The base pointer keeps the composite
    /// table of `T`, therefore the methods invoked through it are the implementations of
    /// `T`.
    pub fn upcast<B>(self) -> FatPtr<'a, B>
    where
        T: Extends<B>,
        B: Object<Interfaces = T::Interfaces>,
    {
        FatPtr {
            ptr: self.ptr.cast(),
            composite: self.composite,
            _phantom: PhantomData,
        }
    }

    /// Returns the table of the interface `I`.
    pub fn vtable<I, Idx>(&self) -> &'static VTable<I>
    where
        I: Interface,
        T::Interfaces: Contains<I, Idx>,
    {
        <T::Interfaces as Contains<I, Idx>>::composite_table(self.composite)
    }

    /// Returns a view of the object through the interface `I`.
    pub fn get<I, Idx>(&self) -> Bound<'a, I>
    where
        I: Interface,
        T::Interfaces: Contains<I, Idx>,
    {
        Bound::new(self.this(), self.vtable::<I, Idx>())
    }

    /// Returns the handle to the object.
    pub fn this(&self) -> This {
        This::new(self.ptr.cast())
    }

    /// Returns the address of the object.
    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    /// Returns the header of the tables.
    pub fn head(&self) -> &'static VTableHead {
        <T::Interfaces as InterfaceList>::head(&self.tables())
    }

    /// Returns the composite table.
    pub fn composite(&self) -> &'static <T::Interfaces as InterfaceList>::Composite {
        self.composite
    }

    /// Returns the references to all tables.
    pub fn tables(&self) -> <T::Interfaces as InterfaceList>::Tables {
        <T::Interfaces as InterfaceList>::tables(self.composite)
    }

    /// Converts the pointer into the underlying reference.
    pub fn into_ref(self) -> &'a T {
        // Safety: The pointer was created from a reference valid for `'a`.
        unsafe { self.ptr.as_ref() }
    }

    /// Offsets the pointer by `count` objects of type `T`.
    ///
    /// # Safety
    ///
    /// The pointer must point into a slice of `T` and the result must point to an element
    /// of the same slice. Pointers produced by [`upcast`](FatPtr::upcast) point into a slice
    /// of the derived type and must not be offset.
    #[cfg(feature = "array")]
    pub unsafe fn add(self, count: usize) -> Self {
        Self {
            // Safety: Guaranteed by the caller.
            ptr: unsafe { self.ptr.add(count) },
            composite: self.composite,
            _phantom: PhantomData,
        }
    }
}

impl<T: Object> Clone for FatPtr<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Object> Copy for FatPtr<'_, T> {}

impl<T: Object> Deref for FatPtr<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.into_ref()
    }
}

impl<'a, T: Object> From<&'a T> for FatPtr<'a, T> {
    fn from(obj: &'a T) -> Self {
        Self::new(obj)
    }
}

impl<T: Object> Debug for FatPtr<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FatPtr")
            .field("ptr", &self.ptr)
            .field("object", &self.head().object_name())
            .finish()
    }
}

impl<T: Object> Pointer for FatPtr<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Pointer::fmt(&self.ptr, f)
    }
}

// Safety: The pointer behaves like a `&T`.
unsafe impl<T: Object + Sync> Send for FatPtr<'_, T> {}

// Safety: The pointer behaves like a `&T`.
unsafe impl<T: Object + Sync> Sync for FatPtr<'_, T> {}
