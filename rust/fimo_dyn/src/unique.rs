//! Uniquely owning dynamic pointers.
use crate::{
    deleter::{BoxCompatible, Deleter},
    dptr::{DynPtr, RawDyn, Unique},
    list::{InterfaceList, Pointee, Subset},
    object::Object,
    shared::SharedPtr,
};
use std::ptr::NonNull;

#[cfg(feature = "array")]
use crate::deleter::ArrayDelete;

/// A uniquely owning dynamic pointer.
///
/// The pointer is not `Clone`, moving it transfers the ownership of the object, and the
/// object is deleted exactly once when a non-null pointer is dropped.
///
/// ```compile_fail
/// use fimo_dyn::{interface, object, DynMethod, UniquePtr};
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
/// let ptr: UniquePtr<(IA,)> = UniquePtr::boxed(Single);
/// let copy = ptr.clone();
/// ```
pub type UniquePtr<P, D = crate::deleter::DefaultDelete> = DynPtr<P, Unique, D>;

impl<P: ?Sized + Pointee, D: Deleter> DynPtr<P, Unique, D> {
    /// Destroys and deletes the object, leaving a null pointer.
    ///
    /// Does nothing if the pointer is null.
    pub fn destroy_and_delete(&mut self) {
        // Safety: Unique pointers own their object.
        unsafe { self.delete_in_place() }
    }

    /// Deletes the owned object, leaving a null pointer.
    pub fn reset(&mut self) {
        self.destroy_and_delete();
    }

    /// Converts the pointer into a shared pointer.
    pub fn into_shared(self) -> SharedPtr<P>
    where
        D: Send + Sync + 'static,
    {
        SharedPtr::from_unique(self)
    }
}

impl<L: InterfaceList, D: Deleter> DynPtr<L, Unique, D> {
    /// Deletes the owned object and takes ownership of `ptr`.
    ///
    /// The deleter is kept.
    ///
    /// # Safety
    ///
    /// `ptr` must be deletable with the deleter of the pointer and must not be owned by
    /// anyone else. In particular, it must differ from the currently owned pointer.
    pub unsafe fn reset_raw<T, Idx>(&mut self, ptr: NonNull<T>)
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        debug_assert_ne!(
            self.as_ptr(),
            Some(ptr.cast()),
            "resetting a pointer to the owned object"
        );
        self.destroy_and_delete();
        self.raw = Some(RawDyn::new(ptr));
    }
}

impl<L: InterfaceList, D: BoxCompatible> DynPtr<L, Unique, D> {
    /// Takes ownership of a boxed object.
    pub fn new<T, Idx>(obj: Box<T>) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        let ptr = NonNull::from(Box::leak(obj));
        // Safety: The pointer was allocated by a `Box` and is uniquely owned.
        unsafe { Self::from_raw_in(ptr, D::default()) }
    }

    /// Moves an object to the heap and takes ownership of it.
    pub fn boxed<T, Idx>(obj: T) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        Self::new(Box::new(obj))
    }

    /// Deletes the owned object and takes ownership of a boxed object.
    ///
    /// The old object is deleted before the ownership of the new one is taken.
    pub fn replace<T, Idx>(&mut self, obj: Box<T>)
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        let ptr = NonNull::from(Box::leak(obj));
        // Safety: The pointer was allocated by a `Box`, which is compatible with the
        // deleter, and can not alias the owned object.
        unsafe { self.reset_raw(ptr) }
    }
}

#[cfg(feature = "array")]
impl<L: InterfaceList> DynPtr<[L], Unique, ArrayDelete> {
    /// Takes ownership of a boxed slice.
    ///
    /// An empty slice results in a null pointer.
    pub fn from_boxed_slice<T, Idx>(slice: Box<[T]>) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        let len = slice.len();
        if len == 0 {
            return Self::from_parts(None, ArrayDelete::new(0));
        }

        let ptr = NonNull::from(Box::leak(slice)).cast::<T>();
        // Safety: The slice was allocated by a `Box<[T]>` of `len` elements.
        unsafe { Self::from_raw_in(ptr, ArrayDelete::new(len)) }
    }

    /// Moves the elements of a vector to the heap and takes ownership of them.
    pub fn from_vec<T, Idx>(vec: Vec<T>) -> Self
    where
        T: Object,
        L: Subset<T::Interfaces, Idx>,
    {
        Self::from_boxed_slice(vec.into_boxed_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::UniquePtr;
    use crate::{deleter::BoxDelete, DynMethod, This};
    use std::{cell::Cell, rc::Rc};

    crate::interface! {
        struct ITag {
            tag: fn(This) -> u32,
        }
    }

    struct Tracked {
        tag: u32,
        drops: Rc<Cell<usize>>,
    }

    impl Tracked {
        fn new(tag: u32, drops: &Rc<Cell<usize>>) -> Self {
            Self {
                tag,
                drops: drops.clone(),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn tracked_tag(this: This) -> u32 {
        // Safety: The table is built for `Tracked`.
        unsafe { this.as_ref::<Tracked>().tag }
    }

    crate::object! {
        impl Tracked => (ITag) {
            ITag { tag: DynMethod::new(tracked_tag) },
        }
    }

    fn tag_of<D: crate::Deleter>(ptr: &UniquePtr<(ITag,), D>) -> Option<u32> {
        ptr.get::<ITag, _>().map(|t| t.tag.bind(t.this())())
    }

    #[test]
    fn drop_deletes_once() {
        let drops = Rc::new(Cell::new(0));
        let ptr: UniquePtr<(ITag,)> = UniquePtr::boxed(Tracked::new(1, &drops));
        let moved = ptr;
        assert_eq!(tag_of(&moved), Some(1));
        assert_eq!(drops.get(), 0);
        drop(moved);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn destroying_deleter() {
        let drops = Rc::new(Cell::new(0));
        let mut ptr: UniquePtr<(ITag,), BoxDelete> = UniquePtr::new(Box::new(Tracked::new(2, &drops)));
        ptr.destroy_and_delete();
        assert!(ptr.is_null());
        assert_eq!(drops.get(), 1);
        ptr.destroy_and_delete();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn replace_deletes_old_first() {
        let drops = Rc::new(Cell::new(0));
        let mut ptr: UniquePtr<(ITag,)> = UniquePtr::boxed(Tracked::new(1, &drops));
        ptr.replace(Box::new(Tracked::new(2, &drops)));
        assert_eq!(drops.get(), 1);
        assert_eq!(tag_of(&ptr), Some(2));

        ptr.reset();
        assert!(ptr.is_null());
        assert_eq!(drops.get(), 2);
        assert_eq!(tag_of(&ptr), None);
    }

    #[test]
    fn release_transfers_responsibility() {
        let drops = Rc::new(Cell::new(0));
        let mut ptr: UniquePtr<(ITag,)> = UniquePtr::boxed(Tracked::new(3, &drops));
        let Some(raw) = ptr.release() else {
            panic!("pointer is not null");
        };
        drop(ptr);
        assert_eq!(drops.get(), 0);

        // Safety: The object was allocated by a `Box<Tracked>`.
        drop(unsafe { Box::from_raw(raw.cast::<Tracked>().as_ptr()) });
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn destroy_then_release() {
        let drops = Rc::new(Cell::new(0));
        let mut obj = std::mem::ManuallyDrop::new(Tracked::new(4, &drops));
        let mut ptr: UniquePtr<(ITag,), crate::deleter::NoDelete> = UniquePtr::null();
        // Safety: `obj` is never dropped by anyone else and `NoDelete` frees nothing.
        unsafe { ptr.reset_raw(std::ptr::NonNull::from(&mut *obj)) };
        // Safety: The object is alive and never used afterwards.
        unsafe { ptr.destroy() };
        assert_eq!(drops.get(), 1);
        assert!(ptr.release().is_some());
        drop(ptr);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    #[cfg(feature = "array")]
    fn owned_slice() {
        use crate::deleter::ArrayDelete;

        let drops = Rc::new(Cell::new(0));
        let elems: Vec<_> = (0..4).map(|i| Tracked::new(i * 10, &drops)).collect();
        let ptr: UniquePtr<[(ITag,)], ArrayDelete> = UniquePtr::from_vec(elems);
        assert_eq!(ptr.len(), 4);
        assert!(ptr.element(4).is_none());

        let base = ptr.as_ptr().map_or(0, |p| p.as_ptr() as usize);
        let stride = ptr.head().map_or(0, |h| h.size_of());
        assert_eq!(stride, std::mem::size_of::<Tracked>());
        for i in 0..4 {
            let Some(elem) = ptr.element(i) else {
                panic!("index {i} is in bounds");
            };
            let addr = elem.as_ptr().map_or(0, |p| p.as_ptr() as usize);
            assert_eq!(addr, base + i * stride);
            let tag = elem.get::<ITag, _>().map(|t| t.tag.bind(t.this())());
            assert_eq!(tag, Some(i as u32 * 10));
        }

        drop(ptr);
        assert_eq!(drops.get(), 4);

        let empty: UniquePtr<[(ITag,)], ArrayDelete> = UniquePtr::from_vec(Vec::<Tracked>::new());
        assert!(empty.is_null());
        assert!(empty.is_empty());
    }
}
