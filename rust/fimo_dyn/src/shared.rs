//! Shared and weak dynamic pointers.
//!
//! The object owned by a [`SharedPtr`] is kept alive by a control block, which is allocated
//! once, when the ownership of a unique pointer is transferred to the first shared pointer.
//! The control block counts the number of shared pointers (strong references) and the
//! number of [`WeakPtr`]s (weak references), plus one weak reference held collectively by
//! all strong references. The object is deleted when the strong count reaches zero, while
//! the control block is deallocated once the weak count reaches zero.
use crate::{
    allocator::{Allocator, Global},
    deleter::{DefaultDelete, Deleter, NoDelete},
    dptr::{Borrowed, DynPtr, RawDyn, Unique},
    error::{Error, Result},
    interface::{Interface, MarkerCompatible},
    list::{Contains, InterfaceList, Pointee, Subset},
    method::This,
    object::Object,
    vtable::{Bound, VTable, VTableHead},
};
use std::{
    alloc::{handle_alloc_error, Layout},
    fmt::{Debug, Pointer},
    marker::PhantomData,
    mem::ManuallyDrop,
    process::abort,
    ptr::{addr_of_mut, NonNull},
    sync::atomic::{
        AtomicUsize,
        Ordering::{AcqRel, Acquire, Relaxed},
    },
};

#[cfg(test)]
mod test;

/// A soft limit on the amount of references that may be made to an object.
///
/// Going above this limit aborts the program.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Type-erased part of a control block.
#[repr(C)]
struct ControlHeader {
    strong: AtomicUsize,
    weak: AtomicUsize,
    drop_object: unsafe fn(NonNull<ControlHeader>),
    dealloc: unsafe fn(NonNull<ControlHeader>),
}

#[repr(C)]
struct ControlBlock<P: ?Sized + Pointee, D: Deleter, A: Allocator> {
    header: ControlHeader,
    owned: ManuallyDrop<DynPtr<P, Unique, D>>,
    alloc: ManuallyDrop<A>,
}

impl<P: ?Sized + Pointee, D: Deleter, A: Allocator> ControlBlock<P, D, A> {
    fn allocate(owned: DynPtr<P, Unique, D>, alloc: A) -> Result<NonNull<ControlHeader>> {
        let layout = Layout::new::<Self>();
        let block = alloc.allocate(layout)?.cast::<Self>();

        let value = Self {
            header: ControlHeader {
                strong: AtomicUsize::new(1),
                weak: AtomicUsize::new(1),
                drop_object: Self::drop_object,
                dealloc: Self::dealloc,
            },
            owned: ManuallyDrop::new(owned),
            alloc: ManuallyDrop::new(alloc),
        };
        // Safety: The memory was allocated with the layout of `Self`.
        unsafe { block.as_ptr().write(value) };

        Ok(block.cast())
    }

    /// # Safety
    ///
    /// Must be called exactly once, after the strong count reached zero.
    unsafe fn drop_object(header: NonNull<ControlHeader>) {
        let block = header.cast::<Self>().as_ptr();
        // Safety: Only the last strong reference accesses the owned pointer.
        unsafe { ManuallyDrop::drop(&mut *addr_of_mut!((*block).owned)) }
    }

    /// # Safety
    ///
    /// Must be called exactly once, after the weak count reached zero.
    unsafe fn dealloc(header: NonNull<ControlHeader>) {
        let block = header.cast::<Self>();
        // Safety: No other reference to the block exists.
        let alloc = unsafe { ManuallyDrop::take(&mut *addr_of_mut!((*block.as_ptr()).alloc)) };
        // Safety: The block was allocated by `alloc` with the layout of `Self`.
        unsafe { alloc.deallocate(block.cast(), Layout::new::<Self>()) }
    }
}

impl ControlHeader {
    /// # Safety
    ///
    /// `ctrl` must point to a live control block.
    unsafe fn acquire_strong(ctrl: NonNull<ControlHeader>) {
        // Safety: Guaranteed by the caller.
        let old = unsafe { ctrl.as_ref() }.strong.fetch_add(1, Relaxed);
        if old > MAX_REFCOUNT {
            abort();
        }
    }

    /// # Safety
    ///
    /// `ctrl` must point to a live control block.
    unsafe fn acquire_weak(ctrl: NonNull<ControlHeader>) {
        // Safety: Guaranteed by the caller.
        let old = unsafe { ctrl.as_ref() }.weak.fetch_add(1, Relaxed);
        if old > MAX_REFCOUNT {
            abort();
        }
    }

    /// # Safety
    ///
    /// The caller must own one strong reference, which is consumed.
    unsafe fn release_strong(ctrl: NonNull<ControlHeader>) {
        // Safety: The strong reference keeps the block alive.
        let header = unsafe { ctrl.as_ref() };
        if header.strong.fetch_sub(1, AcqRel) != 1 {
            return;
        }

        tracing::trace!(ctrl = ?ctrl, "destroying shared object");
        let drop_object = header.drop_object;
        // Safety: The strong count reached zero.
        unsafe {
            drop_object(ctrl);
            Self::release_weak(ctrl);
        }
    }

    /// # Safety
    ///
    /// The caller must own one weak reference, which is consumed.
    unsafe fn release_weak(ctrl: NonNull<ControlHeader>) {
        // Safety: The weak reference keeps the block alive.
        let header = unsafe { ctrl.as_ref() };
        if header.weak.fetch_sub(1, AcqRel) != 1 {
            return;
        }

        tracing::trace!(ctrl = ?ctrl, "deallocating control block");
        let dealloc = header.dealloc;
        // Safety: The weak count reached zero.
        unsafe { dealloc(ctrl) }
    }

    /// # Safety
    ///
    /// The caller must own one weak reference.
    unsafe fn try_upgrade(ctrl: NonNull<ControlHeader>) -> bool {
        // Safety: The weak reference keeps the block alive.
        let strong = unsafe { &ctrl.as_ref().strong };
        let mut n = strong.load(Relaxed);
        loop {
            if n == 0 {
                tracing::trace!(ctrl = ?ctrl, "promotion of an expired object");
                return false;
            }
            if n > MAX_REFCOUNT {
                abort();
            }

            match strong.compare_exchange_weak(n, n + 1, AcqRel, Acquire) {
                Ok(_) => return true,
                Err(old) => n = old,
            }
        }
    }

    /// # Safety
    ///
    /// `ctrl` must point to a live control block.
    unsafe fn strong_count(ctrl: NonNull<ControlHeader>) -> usize {
        // Safety: Guaranteed by the caller.
        unsafe { ctrl.as_ref() }.strong.load(Acquire)
    }

    /// # Safety
    ///
    /// `ctrl` must point to a live control block.
    unsafe fn weak_count(ctrl: NonNull<ControlHeader>) -> usize {
        // Safety: Guaranteed by the caller.
        let header = unsafe { ctrl.as_ref() };
        let weak = header.weak.load(Acquire);
        let strong = header.strong.load(Acquire);
        if strong == 0 {
            weak
        } else {
            weak.saturating_sub(1)
        }
    }
}

/// A dynamic pointer with shared ownership of its object.
///
/// Cloning the pointer increments the strong count of the object, which is deleted once
/// the last shared pointer is dropped. A shared pointer may also point to a different
/// object than the one it owns, see [`SharedPtr::aliasing`].
///
/// # Examples
///
/// ```
/// use fimo_dyn::{interface, object, DynMethod, SharedPtr, SendSyncMarker};
///
/// interface! {
///     #![marker = SendSyncMarker]
///     pub struct IName {
///         pub name: fn() -> &'static str,
///     }
/// }
///
/// struct Cat;
///
/// object! {
///     impl Cat => (IName) {
///         IName { name: DynMethod::new(|| "cat") },
///     }
/// }
///
/// let cat: SharedPtr<(IName,)> = SharedPtr::boxed(Cat);
/// let copy = cat.clone();
/// assert_eq!(cat.use_count(), 2);
///
/// let weak = cat.downgrade();
/// drop(cat);
/// drop(copy);
/// assert!(weak.expired());
/// assert!(weak.upgrade().is_err());
/// ```
pub struct SharedPtr<P: ?Sized + Pointee> {
    raw: Option<RawDyn<P::List>>,
    len: P::Len,
    ctrl: Option<NonNull<ControlHeader>>,
    _phantom: PhantomData<*const P>,
}

impl<P: ?Sized + Pointee> SharedPtr<P> {
    fn from_parts(
        raw: Option<RawDyn<P::List>>,
        len: P::Len,
        ctrl: Option<NonNull<ControlHeader>>,
    ) -> Self {
        Self {
            raw,
            len,
            ctrl,
            _phantom: PhantomData,
        }
    }

    fn into_parts(self) -> (Option<RawDyn<P::List>>, P::Len, Option<NonNull<ControlHeader>>) {
        let this = ManuallyDrop::new(self);
        (this.raw, this.len, this.ctrl)
    }

    /// Constructs an empty pointer.
    pub fn null() -> Self {
        Self::from_parts(None, P::Len::default(), None)
    }

    /// Takes the ownership of the object of a unique pointer.
    ///
    /// An empty pointer is returned if `ptr` is null.
    pub fn from_unique<D>(ptr: DynPtr<P, Unique, D>) -> Self
    where
        D: Deleter + Send + Sync + 'static,
    {
        Self::from_unique_in(ptr, Global)
    }

    /// Takes the ownership of the object of a unique pointer, allocating the control block
    /// with `alloc`.
    ///
    /// An empty pointer is returned if `ptr` is null. Calls [`handle_alloc_error`] if the
    /// control block could not be allocated.
    pub fn from_unique_in<D, A>(ptr: DynPtr<P, Unique, D>, alloc: A) -> Self
    where
        D: Deleter + Send + Sync + 'static,
        A: Allocator + Send + Sync + 'static,
    {
        match Self::try_from_unique_in(ptr, alloc) {
            Ok(ptr) => ptr,
            Err(_) => handle_alloc_error(Layout::new::<ControlBlock<P, D, A>>()),
        }
    }

    /// Takes the ownership of the object of a unique pointer, allocating the control block
    /// with `alloc`.
    ///
    /// An empty pointer is returned if `ptr` is null. If the control block could not be
    /// allocated, the object is deleted and [`Error::Alloc`] is returned.
    pub fn try_from_unique_in<D, A>(ptr: DynPtr<P, Unique, D>, alloc: A) -> Result<Self>
    where
        D: Deleter + Send + Sync + 'static,
        A: Allocator + Send + Sync + 'static,
    {
        let Some(raw) = ptr.raw else {
            return Ok(Self::null());
        };

        let len = P::len_of(ptr.deleter());
        let ctrl = ControlBlock::allocate(ptr, alloc)?;
        Ok(Self::from_parts(Some(raw), len, Some(ctrl)))
    }

    /// Constructs a pointer sharing the ownership of `owner`, but pointing to `ptr`.
    ///
    /// The new pointer keeps the object of `owner` alive. If `owner` is empty, the pointer
    /// does not own anything. Since the last aliasing pointer may destroy the object of
    /// `owner`, the markers of `P` must be compatible with the markers of `Q`, i.e. a
    /// `Send + Sync` pointer can not alias a part of an object that is not `Send + Sync`:
    ///
    /// ```compile_fail
    /// use fimo_dyn::{interface, object, DynMethod, DynPtr, SendSyncMarker, SharedPtr};
    /// use std::rc::Rc;
    ///
    /// interface! { pub struct IOwner { pub a: fn() } }
    /// interface! {
    ///     #![marker = SendSyncMarker]
    ///     pub struct IPart { pub b: fn() }
    /// }
    ///
    /// struct Part;
    /// struct Owner(Rc<()>, Part);
    ///
    /// object! { impl Part => (IPart) { IPart { b: DynMethod::new(|| {}) } } }
    /// object! { impl Owner => (IOwner) { IOwner { a: DynMethod::new(|| {}) } } }
    ///
    /// let owner: SharedPtr<(IOwner,)> = SharedPtr::boxed(Owner(Rc::new(()), Part));
    /// let part = owner.as_ptr().unwrap().cast::<Owner>();
    /// let part = unsafe { &part.as_ref().1 };
    /// let alias: SharedPtr<(IPart,)> = unsafe { SharedPtr::aliasing(&owner, DynPtr::from_ref(part)) };
    /// ```
    ///
    /// Array pointers constructed this way have a length of zero, their elements are only
    /// reachable through the unchecked `offset`.
    ///
    /// # Safety
    ///
    /// `ptr` must remain valid for as long as the object of `owner` is alive, e.g. because
    /// it is a part of it.
    pub unsafe fn aliasing<Q>(
        owner: &SharedPtr<Q>,
        ptr: DynPtr<P, Borrowed<'_>, NoDelete>,
    ) -> Self
    where
        Q: ?Sized + Pointee,
        <P::List as InterfaceList>::Marker: MarkerCompatible<<Q::List as InterfaceList>::Marker>,
    {
        if let Some(ctrl) = owner.ctrl {
            // Safety: `owner` holds a strong reference.
            unsafe { ControlHeader::acquire_strong(ctrl) };
        }
        let (raw, deleter) = ptr.into_parts();
        Self::from_parts(raw, P::len_of(&deleter), owner.ctrl)
    }

    /// Returns the number of shared pointers to the object.
    pub fn use_count(&self) -> usize {
        self.ctrl.map_or(0, |ctrl| {
            // Safety: The pointer holds a strong reference.
            unsafe { ControlHeader::strong_count(ctrl) }
        })
    }

    /// Returns the number of weak pointers to the object.
    pub fn weak_count(&self) -> usize {
        self.ctrl.map_or(0, |ctrl| {
            // Safety: The pointer holds a strong reference.
            unsafe { ControlHeader::weak_count(ctrl) }
        })
    }

    /// Creates a new weak pointer to the object.
    pub fn downgrade(&self) -> WeakPtr<P> {
        if let Some(ctrl) = self.ctrl {
            // Safety: The pointer holds a strong reference.
            unsafe { ControlHeader::acquire_weak(ctrl) };
        }
        WeakPtr::from_parts(self.raw, self.len, self.ctrl)
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
    pub fn get<I, Idx>(&self) -> Option<Bound<'_, I>>
    where
        I: Interface,
        P::List: Contains<I, Idx>,
    {
        self.raw.as_ref().map(RawDyn::get::<I, Idx>)
    }

    /// Releases the ownership of the object, leaving an empty pointer.
    pub fn reset(&mut self) {
        *self = Self::null();
    }

    /// Returns whether both pointers point to the same object.
    pub fn ptr_eq<Q: ?Sized + Pointee>(&self, other: &SharedPtr<Q>) -> bool {
        self.as_ptr() == other.as_ptr()
    }

    /// Returns whether both pointers share the ownership of the same object.
    pub fn owner_eq<Q: ?Sized + Pointee>(&self, other: &SharedPtr<Q>) -> bool {
        self.ctrl == other.ctrl
    }
}

impl<L: InterfaceList> SharedPtr<L> {
    /// Takes ownership of a boxed object.
    pub fn new<T, Idx>(obj: Box<T>) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        Self::from_unique(DynPtr::<L, Unique, DefaultDelete>::new(obj))
    }

    /// Moves an object to the heap and takes ownership of it.
    pub fn boxed<T, Idx>(obj: T) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        Self::new(Box::new(obj))
    }

    /// Converts the pointer to a pointer requesting a subset of its interfaces.
    pub fn cast<L2, Idx>(self) -> SharedPtr<L2>
    where
        L2: Subset<L, Idx>,
    {
        let (raw, len, ctrl) = self.into_parts();
        SharedPtr::from_parts(raw.map(RawDyn::project), len, ctrl)
    }

    /// Borrows the object through a subset of the interfaces.
    pub fn borrow<L2, Idx>(&self) -> DynPtr<L2, Borrowed<'_>, NoDelete>
    where
        L2: Subset<L, Idx>,
    {
        DynPtr::from_parts(self.raw.map(RawDyn::project), NoDelete)
    }
}

#[cfg(feature = "array")]
impl<L: InterfaceList> SharedPtr<[L]> {
    /// Converts the pointer to a pointer requesting a subset of its interfaces.
    pub fn cast<L2, Idx>(self) -> SharedPtr<[L2]>
    where
        L2: Subset<L, Idx>,
    {
        let (raw, len, ctrl) = self.into_parts();
        SharedPtr::from_parts(raw.map(RawDyn::project), len, ctrl)
    }

    /// Borrows the slice through a subset of the interfaces.
    pub fn borrow<L2, Idx>(&self) -> DynPtr<[L2], Borrowed<'_>, NoDelete>
    where
        L2: Subset<L, Idx>,
    {
        DynPtr::from_parts(self.raw.map(RawDyn::project), NoDelete)
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        if self.is_null() {
            0
        } else {
            self.len
        }
    }

    /// Returns whether the pointer contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a borrowed pointer to the element at position `index`.
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

impl<P: ?Sized + Pointee> Clone for SharedPtr<P> {
    fn clone(&self) -> Self {
        if let Some(ctrl) = self.ctrl {
            // Safety: The pointer holds a strong reference.
            unsafe { ControlHeader::acquire_strong(ctrl) };
        }
        Self::from_parts(self.raw, self.len, self.ctrl)
    }
}

impl<P: ?Sized + Pointee> Drop for SharedPtr<P> {
    fn drop(&mut self) {
        if let Some(ctrl) = self.ctrl.take() {
            // Safety: The pointer holds a strong reference.
            unsafe { ControlHeader::release_strong(ctrl) }
        }
    }
}

impl<P: ?Sized + Pointee> Default for SharedPtr<P> {
    fn default() -> Self {
        Self::null()
    }
}

impl<P: ?Sized + Pointee, D> From<DynPtr<P, Unique, D>> for SharedPtr<P>
where
    D: Deleter + Send + Sync + 'static,
{
    fn from(ptr: DynPtr<P, Unique, D>) -> Self {
        Self::from_unique(ptr)
    }
}

impl<P: ?Sized + Pointee> TryFrom<&WeakPtr<P>> for SharedPtr<P> {
    type Error = Error;

    fn try_from(weak: &WeakPtr<P>) -> Result<Self> {
        weak.upgrade()
    }
}

impl<P: ?Sized + Pointee> Debug for SharedPtr<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPtr")
            .field("ptr", &self.as_ptr())
            .field("object", &self.head().map(VTableHead::object_name))
            .field("use_count", &self.use_count())
            .finish()
    }
}

impl<P: ?Sized + Pointee> Pointer for SharedPtr<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ptr = self
            .as_ptr()
            .map_or(std::ptr::null_mut(), |ptr| ptr.as_ptr());
        Pointer::fmt(&ptr, f)
    }
}

// Safety: The markers of the interfaces guarantee that the object is `Send` and `Sync`, the
// deleter and allocator are required to be `Send` and `Sync`.
unsafe impl<P: ?Sized + Pointee> Send for SharedPtr<P> where
    <P::List as InterfaceList>::Marker: Send + Sync
{
}

// Safety: See above.
unsafe impl<P: ?Sized + Pointee> Sync for SharedPtr<P> where
    <P::List as InterfaceList>::Marker: Send + Sync
{
}

/// A non-owning reference to an object managed by [`SharedPtr`]s.
///
/// The object can be accessed by promoting the pointer to a [`SharedPtr`], which fails
/// once the object has been destroyed.
pub struct WeakPtr<P: ?Sized + Pointee> {
    raw: Option<RawDyn<P::List>>,
    len: P::Len,
    ctrl: Option<NonNull<ControlHeader>>,
    _phantom: PhantomData<*const P>,
}

impl<P: ?Sized + Pointee> WeakPtr<P> {
    fn from_parts(
        raw: Option<RawDyn<P::List>>,
        len: P::Len,
        ctrl: Option<NonNull<ControlHeader>>,
    ) -> Self {
        Self {
            raw,
            len,
            ctrl,
            _phantom: PhantomData,
        }
    }

    /// Constructs an empty weak pointer.
    ///
    /// The pointer is always expired.
    pub fn new() -> Self {
        Self::from_parts(None, P::Len::default(), None)
    }

    /// Returns the number of shared pointers to the object.
    pub fn use_count(&self) -> usize {
        self.ctrl.map_or(0, |ctrl| {
            // Safety: The pointer holds a weak reference.
            unsafe { ControlHeader::strong_count(ctrl) }
        })
    }

    /// Returns the number of weak pointers to the object.
    pub fn weak_count(&self) -> usize {
        self.ctrl.map_or(0, |ctrl| {
            // Safety: The pointer holds a weak reference.
            unsafe { ControlHeader::weak_count(ctrl) }
        })
    }

    /// Returns whether the object has been destroyed.
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// Attempts to promote the pointer to a [`SharedPtr`].
    ///
    /// Returns [`Error::Expired`] if the object has been destroyed.
    pub fn upgrade(&self) -> Result<SharedPtr<P>> {
        let ctrl = self.ctrl.ok_or(Error::Expired)?;
        // Safety: The pointer holds a weak reference.
        if unsafe { ControlHeader::try_upgrade(ctrl) } {
            Ok(SharedPtr::from_parts(self.raw, self.len, Some(ctrl)))
        } else {
            Err(Error::Expired)
        }
    }

    /// Promotes the pointer to a [`SharedPtr`].
    ///
    /// Returns an empty pointer if the object has been destroyed.
    pub fn lock(&self) -> SharedPtr<P> {
        self.upgrade().unwrap_or_default()
    }
}

impl<P: ?Sized + Pointee> Clone for WeakPtr<P> {
    fn clone(&self) -> Self {
        if let Some(ctrl) = self.ctrl {
            // Safety: The pointer holds a weak reference.
            unsafe { ControlHeader::acquire_weak(ctrl) };
        }
        Self::from_parts(self.raw, self.len, self.ctrl)
    }
}

impl<P: ?Sized + Pointee> Drop for WeakPtr<P> {
    fn drop(&mut self) {
        if let Some(ctrl) = self.ctrl.take() {
            // Safety: The pointer holds a weak reference.
            unsafe { ControlHeader::release_weak(ctrl) }
        }
    }
}

impl<P: ?Sized + Pointee> Default for WeakPtr<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized + Pointee> From<&SharedPtr<P>> for WeakPtr<P> {
    fn from(ptr: &SharedPtr<P>) -> Self {
        ptr.downgrade()
    }
}

impl<P: ?Sized + Pointee> Debug for WeakPtr<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakPtr")
            .field("ptr", &self.raw.map(|raw| raw.ptr))
            .field("use_count", &self.use_count())
            .finish()
    }
}

// Safety: See `SharedPtr`.
unsafe impl<P: ?Sized + Pointee> Send for WeakPtr<P> where
    <P::List as InterfaceList>::Marker: Send + Sync
{
}

// Safety: See `SharedPtr`.
unsafe impl<P: ?Sized + Pointee> Sync for WeakPtr<P> where
    <P::List as InterfaceList>::Marker: Send + Sync
{
}
