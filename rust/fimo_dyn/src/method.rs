//! Method slots and object handles.
use std::{
    fmt::{Debug, Formatter, Pointer},
    ptr::NonNull,
};

/// Type-erased handle to the object a dynamic method is invoked on.
///
/// Stands in for the `self` parameter of the methods of an interface. A handle can only be
/// obtained from a pointer which also carries the vtables of the object, and it may only be
/// passed to the methods contained in those vtables.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct This(NonNull<()>);

impl This {
    pub(crate) const fn new(ptr: NonNull<()>) -> Self {
        Self(ptr)
    }

    /// Constructs a handle from a raw pointer.
    ///
    /// # Safety
    ///
    /// The handle may only be passed to methods of a vtable built for the pointee.
    pub const unsafe fn from_raw(ptr: NonNull<()>) -> Self {
        Self(ptr)
    }

    /// Returns the address of the object.
    pub const fn as_ptr(self) -> *mut () {
        self.0.as_ptr()
    }

    /// Casts the handle to a typed pointer.
    pub const fn cast<T>(self) -> NonNull<T> {
        self.0.cast()
    }

    /// Returns a shared reference to the object.
    ///
    /// # Safety
    ///
    /// `T` must be the type of the object and the object must remain alive and must not be
    /// mutated for the duration of `'a`. This is upheld by the implementations of a vtable
    /// built for `T`, when called with a handle produced by one of the crate's pointers.
    pub unsafe fn as_ref<'a, T>(self) -> &'a T {
        // Safety: Guaranteed by the caller.
        unsafe { self.cast::<T>().as_ref() }
    }

    /// Returns a mutable reference to the object.
    ///
    /// # Safety
    ///
    /// In addition to the requirements of [`This::as_ref`], the handle must originate from an
    /// owning or mutably borrowed pointer and no other reference to the object may exist for
    /// the duration of `'a`.
    pub unsafe fn as_mut<'a, T>(self) -> &'a mut T {
        // Safety: Guaranteed by the caller.
        unsafe { self.cast::<T>().as_mut() }
    }
}

impl Debug for This {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("This").field(&self.0).finish()
    }
}

impl Pointer for This {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Pointer::fmt(&self.0, f)
    }
}

/// A slot of an interface, containing a function pointer.
///
/// Unlike a bare function pointer, a slot has no default value and must be initialized with
/// a concrete function when the vtable is built. Slots whose first parameter is a [`This`]
/// are methods and can be bound to an object with [`bind`](DynMethod::bind). The remaining
/// slots are static methods and are invoked with [`call`](DynMethod::call).
///
/// `call` and `bind` are provided for function pointers with up to six parameters whose
/// types contain no higher-ranked lifetimes. Other signatures are invoked through
/// [`get`](DynMethod::get).
///
/// # Examples
///
/// ```
/// use fimo_dyn::DynMethod;
///
/// fn answer() -> u32 {
///     42
/// }
///
/// let slot: DynMethod<fn() -> u32> = DynMethod::new(answer);
/// assert_eq!(slot.call(), 42);
/// ```
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct DynMethod<F> {
    func: F,
}

impl<F: Copy> DynMethod<F> {
    /// Constructs a new slot from a function pointer.
    pub const fn new(func: F) -> Self {
        Self { func }
    }

    /// Returns the contained function pointer.
    pub const fn get(&self) -> F {
        self.func
    }
}

impl<F: Pointer> Debug for DynMethod<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DynMethod")
            .field(&format_args!("{:p}", self.func))
            .finish()
    }
}

macro_rules! impl_dyn_method_peel {
    () => {};
    ($head:ident $head_arg:ident $(, $tail:ident $tail_arg:ident)*) => {
        impl_dyn_method!($($tail $tail_arg),*);
    };
}

macro_rules! impl_dyn_method {
    ($($T:ident $arg:ident),*) => {
        impl<Ret, $($T),*> DynMethod<fn($($T),*) -> Ret> {
            /// Invokes the contained function.
            #[inline(always)]
            #[allow(clippy::too_many_arguments)]
            pub fn call(&self, $($arg: $T),*) -> Ret {
                (self.func)($($arg),*)
            }
        }

        impl<Ret, $($T),*> DynMethod<fn(This, $($T),*) -> Ret> {
            /// Binds the method to an object, returning a callable with the handle pre-supplied.
            #[inline(always)]
            pub fn bind(&self, this: This) -> impl Fn($($T),*) -> Ret + Copy {
                let func = self.func;
                move |$($arg: $T),*| func(this, $($arg),*)
            }
        }

        impl_dyn_method_peel!($($T $arg),*);
    };
}

impl_dyn_method!(A a, B b, C c, D d, E e, F f);

crate::sa::assert_eq_size!(This, Option<This>, *const ());
crate::sa::assert_eq_size!(DynMethod<fn(This)>, fn(This));
