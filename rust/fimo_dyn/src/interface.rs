//! Interface definitions.
use std::marker::PhantomData;

/// Makes a struct usable as an interface.
///
/// Every field of the struct is declared as a function pointer type and is wrapped into a
/// [`DynMethod`](crate::DynMethod). Methods receive the object through a [`This`](crate::This)
/// handle as their first parameter, static methods omit it. The struct derives `Copy`,
/// `Clone` and `Debug`, and implements the [`Interface`] trait. The optional `marker` key,
/// specified inside the `#![ ]` brackets preceding the struct definition, selects the
/// thread-safety marker of the interface and defaults to [`DefaultMarker`].
///
/// # Examples
///
/// ```
/// use fimo_dyn::{interface, This, SendSyncMarker};
///
/// interface! {
///     /// Interface with the default marker.
///     pub struct IName {
///         pub name: fn() -> &'static str,
///     }
/// }
///
/// interface! {
///     /// Interface that is only implementable by `Send + Sync` types.
///     #![marker = SendSyncMarker]
///     pub struct ICounter {
///         pub get: fn(This) -> usize,
///         pub add: fn(This, usize) -> usize,
///     }
/// }
/// ```
#[macro_export]
macro_rules! interface {
    (
        $(#[$attr:meta])*
        #![marker = $marker:ty]
        $vis:vis struct $name:ident {
            $(
                $(#[$elem_attr:meta])* $elem_vis:vis $elem:ident: $elem_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Debug)]
        $vis struct $name {
            $($(#[$elem_attr])* $elem_vis $elem: $crate::DynMethod<$elem_ty>),*
        }

        impl $crate::Interface for $name {
            type Marker = $marker;
        }
    };
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$elem_attr:meta])* $elem_vis:vis $elem:ident: $elem_ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::interface! {
            $(#[$attr])*
            #![marker = $crate::DefaultMarker]
            $vis struct $name {
                $($(#[$elem_attr])* $elem_vis $elem: $elem_ty),*
            }
        }
    };
}

/// An interface, i.e. a fixed set of method slots.
///
/// An interface holds no per-instance state, it only describes the surface shared by its
/// implementors. The [`interface!`] macro automatically implements this trait.
pub trait Interface: Copy + Send + Sync + 'static {
    /// Thread-safety requirements imposed on the implementors.
    type Marker;
}

/// Marker trait indicating that a type `T` is compatible with the marker.
///
/// # Safety
///
/// The compatibility with the marker can not be ensured by the compiler. Implementing the
/// trait for a `T` that does not satisfy the auto traits implemented by the marker allows
/// sending `T` across threads.
pub unsafe trait MarkerCompatible<T> {}

/// Default interface marker.
///
/// Implementable by every type. Pointers whose interfaces use this marker are neither `Send`
/// nor `Sync`.
#[derive(Debug)]
pub struct DefaultMarker {
    _phantom: PhantomData<*const ()>,
}

// Safety: `DefaultMarker` is neither `Send` nor `Sync`.
unsafe impl<T> MarkerCompatible<T> for DefaultMarker {}

/// Marker of interfaces that are only implementable by `Send + Sync` types.
#[derive(Debug)]
pub struct SendSyncMarker {
    _phantom: PhantomData<()>,
}

// Safety: `SendSyncMarker` only accepts types that are `Send` and `Sync`.
unsafe impl<T: Send + Sync> MarkerCompatible<T> for SendSyncMarker {}

crate::sa::assert_not_impl_any!(DefaultMarker: Send, Sync);
crate::sa::assert_impl_all!(SendSyncMarker: Send, Sync);
