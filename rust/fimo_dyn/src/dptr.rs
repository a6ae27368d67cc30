//! Type-erased dynamic pointer.
use crate::{
    deleter::{DefaultDelete, Deleter, NoDelete},
    fat::FatPtr,
    interface::Interface,
    list::{Contains, InterfaceList, Pointee, Subset},
    method::This,
    object::Object,
    vtable::{Bound, VTable, VTableHead},
};
use std::{
    fmt::{Debug, Pointer},
    marker::PhantomData,
    mem::ManuallyDrop,
    ptr::NonNull,
};

#[cfg(feature = "array")]
use crate::deleter::ArrayDelete;

/// Ownership category of a dynamic pointer.
pub trait Ownership: private::Sealed {
    /// Whether the pointer is responsible for deleting the object.
    const OWNING: bool;
}

/// Non-owning pointer category, valid for the lifetime `'a`.
#[derive(Debug)]
pub struct Borrowed<'a> {
    _phantom: PhantomData<&'a ()>,
}

impl Ownership for Borrowed<'_> {
    const OWNING: bool = false;
}

/// Uniquely owning pointer category.
#[derive(Debug)]
pub struct Unique {
    _private: (),
}

impl Ownership for Unique {
    const OWNING: bool = true;
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Borrowed<'_> {}
    impl Sealed for super::Unique {}
}

/// Untyped object pointer together with the tables of the list `L`.
pub(crate) struct RawDyn<L: InterfaceList> {
    pub(crate) ptr: NonNull<()>,
    pub(crate) tables: L::Tables,
}

impl<L: InterfaceList> RawDyn<L> {
    pub(crate) fn new<T: Object, Idx>(ptr: NonNull<T>) -> Self
    where
        L: Subset<T::Interfaces, Idx>,
    {
        Self {
            ptr: ptr.cast(),
            tables: L::project(&T::tables()),
        }
    }

    pub(crate) fn project<L2, Idx>(self) -> RawDyn<L2>
    where
        L2: Subset<L, Idx>,
    {
        RawDyn {
            ptr: self.ptr,
            tables: L2::project(&self.tables),
        }
    }

    pub(crate) fn head(&self) -> &'static VTableHead {
        L::head(&self.tables)
    }

    pub(crate) fn get<'a, I, Idx>(&self) -> Bound<'a, I>
    where
        I: Interface,
        L: Contains<I, Idx>,
    {
        Bound::new(This::new(self.ptr), L::table(&self.tables))
    }

    /// # Safety
    ///
    /// The pointer must point into an array and `index` must be in bounds of it.
    #[cfg(feature = "array")]
    pub(crate) unsafe fn offset(self, index: usize) -> Self {
        let stride = self.head().size_of();
        // Safety: Guaranteed by the caller.
        let ptr = unsafe { self.ptr.cast::<u8>().add(index * stride) };
        Self {
            ptr: ptr.cast(),
            tables: self.tables,
        }
    }
}

impl<L: InterfaceList> Clone for RawDyn<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: InterfaceList> Copy for RawDyn<L> {}

/// Type-erased pointer to an object implementing the interfaces `P`.
///
/// `P` is either an interface list `(I1, ..., In)` or, with the `array` feature, a slice
/// `[(I1, ..., In)]` of objects sharing the same concrete type. The pointer stores the
/// address of the object and the tables of the requested interfaces, and is null or
/// non-null as a whole. The ownership category `O` determines whether the object is
/// deleted with the deleter `D` when the pointer is dropped.
///
/// A pointer may be converted to a pointer requesting a subset of its interfaces, while
/// requesting additional interfaces is rejected:
///
/// ```compile_fail
/// use fimo_dyn::{interface, object, DynMethod, DynPtr};
///
/// interface! { pub struct IA { pub a: fn() } }
/// interface! { pub struct IB { pub b: fn() } }
///
/// struct Both;
///
/// object! {
///     impl Both => (IA, IB) {
///         IA { a: DynMethod::new(|| {}) },
///         IB { b: DynMethod::new(|| {}) },
///     }
/// }
///
/// let ptr: DynPtr<(IA,)> = DynPtr::boxed(Both);
/// let ptr: DynPtr<(IA, IB)> = ptr.cast();
/// ```
pub struct DynPtr<P: ?Sized + Pointee, O: Ownership = Unique, D: Deleter = DefaultDelete> {
    pub(crate) raw: Option<RawDyn<P::List>>,
    deleter: D,
    _phantom: PhantomData<(O, *const P)>,
}

impl<P: ?Sized + Pointee, O: Ownership, D: Deleter> DynPtr<P, O, D> {
    pub(crate) fn from_parts(raw: Option<RawDyn<P::List>>, deleter: D) -> Self {
        Self {
            raw,
            deleter,
            _phantom: PhantomData,
        }
    }

    pub(crate) fn into_parts(self) -> (Option<RawDyn<P::List>>, D) {
        let this = ManuallyDrop::new(self);
        // Safety: `this` is never dropped, so the deleter is moved out exactly once.
        let deleter = unsafe { std::ptr::read(&this.deleter) };
        (this.raw, deleter)
    }

    /// Constructs a null pointer.
    pub fn null() -> Self
    where
        D: Default,
    {
        Self::from_parts(None, D::default())
    }

    /// Constructs a pointer from a raw pointer and a deleter.
    ///
    /// For slices, `ptr` points to the first element.
    ///
    /// # Safety
    ///
    /// If the pointer is owning, `ptr` must be deletable with `deleter` and must not be owned
    /// by anyone else. If it is borrowed, `ptr` must remain valid for the borrow. For
    /// slices, `ptr` must point to an array of `T`.
    ///
    /// Owned slices require an array deleter, any other deleter is rejected:
    ///
    /// ```compile_fail
    /// use fimo_dyn::{interface, object, BoxDelete, DynMethod, DynPtr, Unique};
    /// use std::ptr::NonNull;
    ///
    /// interface! { pub struct IA { pub a: fn() } }
    ///
    /// struct Single;
    ///
    /// object! {
    ///     impl Single => (IA) {
    ///         IA { a: DynMethod::new(|| {}) },
    ///     }
    /// }
    ///
    /// let slice: Box<[Single]> = vec![Single, Single].into_boxed_slice();
    /// let first = NonNull::from(Box::leak(slice)).cast::<Single>();
    /// let ptr: DynPtr<[(IA,)], Unique, BoxDelete> =
    ///     unsafe { DynPtr::from_raw_in(first, BoxDelete) };
    /// drop(ptr);
    /// ```
    pub unsafe fn from_raw_in<T, Idx>(ptr: NonNull<T>, deleter: D) -> Self
    where
        T: Object,
        P::List: Subset<T::Interfaces, Idx>,
    {
        Self::from_parts(Some(RawDyn::new(ptr)), deleter)
    }

    /// Returns whether the pointer is null.
    pub fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// Returns the address of the object.
    pub fn as_ptr(&self) -> Option<NonNull<()>> {
        self.raw.map(|raw| raw.ptr)
    }

    /// Returns the handle to the object.
    pub fn this(&self) -> Option<This> {
        self.raw.map(|raw| This::new(raw.ptr))
    }

    /// Returns the header of the tables.
    pub fn head(&self) -> Option<&'static VTableHead> {
        self.raw.as_ref().map(RawDyn::head)
    }

    /// Returns the table of the interface `I`.
    pub fn vtable<I, Idx>(&self) -> Option<&'static VTable<I>>
    where
        I: Interface,
        P::List: Contains<I, Idx>,
    {
        self.raw
            .as_ref()
            .map(|raw| <P::List as Contains<I, Idx>>::table(&raw.tables))
    }

    /// Returns a view of the object through the interface `I`.
    ///
    /// For slices, the view refers to the first element.
    pub fn get<I, Idx>(&self) -> Option<Bound<'_, I>>
    where
        I: Interface,
        P::List: Contains<I, Idx>,
    {
        self.raw.as_ref().map(RawDyn::get::<I, Idx>)
    }

    /// Returns a reference to the deleter.
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Returns a mutable reference to the deleter.
    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Nulls the pointer without destroying the object and returns its address.
    ///
    /// The caller becomes responsible for deleting the object.
    pub fn release(&mut self) -> Option<NonNull<()>> {
        self.raw.take().map(|raw| raw.ptr)
    }

    /// Runs the destruction protocol and nulls the pointer.
    ///
    /// # Safety
    ///
    /// The pointer must own the object.
    pub(crate) unsafe fn delete_in_place(&mut self) {
        const {
            assert!(
                !O::OWNING || !P::IS_ARRAY || D::ARRAY,
                "owned arrays require an array deleter"
            );
        }

        let Some(raw) = self.raw.take() else {
            return;
        };

        let head = raw.head();
        tracing::trace!(
            object = head.object_name(),
            ptr = ?raw.ptr,
            destroying = D::DESTROYING,
            "deleting object"
        );

        // Safety: The caller guarantees that the object is owned.
        unsafe {
            if !D::DESTROYING {
                head.drop_in_place(raw.ptr.as_ptr());
            }
            self.deleter.delete::<P::List>(raw.ptr, &raw.tables);
        }
    }
}

impl<L: InterfaceList, O: Ownership, D: Deleter> DynPtr<L, O, D> {
    /// Converts the pointer to a pointer requesting a subset of its interfaces.
    ///
    /// Ownership is transferred to the new pointer.
    pub fn cast<L2, Idx>(self) -> DynPtr<L2, O, D>
    where
        L2: Subset<L, Idx>,
    {
        let (raw, deleter) = self.into_parts();
        DynPtr::from_parts(raw.map(RawDyn::project), deleter)
    }

    /// Borrows the object through a subset of the interfaces.
    pub fn borrow<L2, Idx>(&self) -> DynPtr<L2, Borrowed<'_>, NoDelete>
    where
        L2: Subset<L, Idx>,
    {
        DynPtr::from_parts(self.raw.map(RawDyn::project), NoDelete)
    }

    /// Drops the object in place, without deleting it.
    ///
    /// The pointer is not nulled.
    ///
    /// # Safety
    ///
    /// The pointer must not be null, the object must not have been destroyed and the caller
    /// must be allowed to destroy it. The object must not be used afterwards.
    pub unsafe fn destroy(&mut self) {
        debug_assert!(!self.is_null(), "destroying a null pointer");
        if let Some(raw) = self.raw {
            // Safety: Guaranteed by the caller.
            unsafe { raw.head().drop_in_place(raw.ptr.as_ptr()) }
        }
    }
}

#[cfg(feature = "array")]
impl<L: InterfaceList, O: Ownership, D: Deleter> DynPtr<[L], O, D> {
    /// Converts the pointer to a pointer requesting a subset of its interfaces.
    ///
    /// Ownership is transferred to the new pointer.
    pub fn cast<L2, Idx>(self) -> DynPtr<[L2], O, D>
    where
        L2: Subset<L, Idx>,
    {
        let (raw, deleter) = self.into_parts();
        DynPtr::from_parts(raw.map(RawDyn::project), deleter)
    }

    /// Borrows the slice through a subset of the interfaces.
    pub fn borrow<L2, Idx>(&self) -> DynPtr<[L2], Borrowed<'_>, NoDelete>
    where
        L2: Subset<L, Idx>,
    {
        DynPtr::from_parts(self.raw.map(RawDyn::project), NoDelete)
    }

    /// Returns a borrowed pointer to the element at position `index`.
    ///
    /// The address of the element is computed with the size recorded in the tables.
    ///
    /// # Safety
    ///
    /// `index` must be in bounds of the slice.
    pub unsafe fn offset(&self, index: usize) -> DynPtr<L, Borrowed<'_>, NoDelete> {
        let raw = self.raw.map(|raw| {
            // Safety: Guaranteed by the caller.
            unsafe { raw.offset(index) }
        });
        DynPtr::from_parts(raw, NoDelete)
    }
}

#[cfg(feature = "array")]
impl<L: InterfaceList, O: Ownership> DynPtr<[L], O, ArrayDelete> {
    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        if self.is_null() {
            0
        } else {
            self.deleter().len()
        }
    }

    /// Returns whether the pointer contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a borrowed pointer to the element at position `index`.
    ///
    /// Returns `None` if the index is out of bounds.
    pub fn element(&self, index: usize) -> Option<DynPtr<L, Borrowed<'_>, NoDelete>> {
        if index < self.len() {
            // Safety: The index is in bounds.
            Some(unsafe { self.offset(index) })
        } else {
            None
        }
    }
}

impl<'a, L: InterfaceList> DynPtr<L, Borrowed<'a>, NoDelete> {
    /// Borrows an object.
    pub fn from_ref<T, Idx>(obj: &'a T) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        Self::from_parts(Some(RawDyn::new(NonNull::from(obj))), NoDelete)
    }

    /// Borrows an object mutably.
    ///
    /// Methods receiving the handle may mutate the object for the duration of the borrow.
    pub fn from_mut<T, Idx>(obj: &'a mut T) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        Self::from_parts(Some(RawDyn::new(NonNull::from(obj))), NoDelete)
    }

    /// Borrows the object of a fat pointer.
    ///
    /// The tables are taken from the fat pointer, so that a fat pointer to a base object
    /// still dispatches to the derived implementations.
    pub fn from_fat<T, Idx>(fat: FatPtr<'a, T>) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        let raw = RawDyn {
            ptr: fat.as_ptr().cast(),
            tables: L::project(&fat.tables()),
        };
        Self::from_parts(Some(raw), NoDelete)
    }
}

#[cfg(feature = "array")]
impl<'a, L: InterfaceList> DynPtr<[L], Borrowed<'a>, NoDelete> {
    /// Borrows a slice of objects.
    ///
    /// An empty slice results in a null pointer.
    pub fn from_slice<T, Idx>(slice: &'a [T]) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        let raw = slice.first().map(|first| RawDyn::new(NonNull::from(first)));
        Self::from_parts(raw, NoDelete)
    }
}

impl<P: ?Sized + Pointee, O: Ownership, D: Deleter> Drop for DynPtr<P, O, D> {
    fn drop(&mut self) {
        if O::OWNING {
            // Safety: The pointer owns the object.
            unsafe { self.delete_in_place() }
        }
    }
}

impl<P: ?Sized + Pointee, O: Ownership, D: Deleter + Default> Default for DynPtr<P, O, D> {
    fn default() -> Self {
        Self::null()
    }
}

impl<P: ?Sized + Pointee> Clone for DynPtr<P, Borrowed<'_>, NoDelete> {
    fn clone(&self) -> Self {
        Self::from_parts(self.raw, NoDelete)
    }
}

impl<P: ?Sized + Pointee, O: Ownership, D: Deleter> Debug for DynPtr<P, O, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.raw {
            Some(raw) => f
                .debug_struct("DynPtr")
                .field("ptr", &raw.ptr)
                .field("object", &raw.head().object_name())
                .finish(),
            None => f.write_str("DynPtr(null)"),
        }
    }
}

impl<P: ?Sized + Pointee, O: Ownership, D: Deleter> Pointer for DynPtr<P, O, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ptr = self
            .as_ptr()
            .map_or(std::ptr::null_mut(), |ptr| ptr.as_ptr());
        Pointer::fmt(&ptr, f)
    }
}

// Safety: The markers of the interfaces guarantee that the object is `Send` and `Sync`.
unsafe impl<P, O, D> Send for DynPtr<P, O, D>
where
    P: ?Sized + Pointee,
    O: Ownership,
    D: Deleter + Send,
    <P::List as InterfaceList>::Marker: Send + Sync,
{
}

// Safety: The markers of the interfaces guarantee that the object is `Send` and `Sync`.
unsafe impl<P, O, D> Sync for DynPtr<P, O, D>
where
    P: ?Sized + Pointee,
    O: Ownership,
    D: Deleter + Sync,
    <P::List as InterfaceList>::Marker: Send + Sync,
{
}
