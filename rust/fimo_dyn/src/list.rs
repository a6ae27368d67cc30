//! Interface lists and compile-time membership.
//!
//! An interface list is a tuple `(I1, ..., In)` of up to eight [`Interface`]s. The list
//! determines the composite table of an object, i.e. the tuple of the [`VTable`]s of all
//! interfaces it implements, and the tuple of table references stored inside of a pointer.
//! Membership ([`Contains`]) and subset ([`Subset`]) relations are resolved by the trait
//! solver, with the positional index inferred by the compiler. A type that appears more
//! than once in a list makes the index ambiguous and is rejected.
use crate::{
    deleter::Deleter,
    interface::{Interface, MarkerCompatible},
    vtable::{VTable, VTableHead},
};

/// Positional index of an interface inside of a list.
///
/// Only appears as an inferred type parameter.
#[derive(Debug)]
pub struct Index<const N: usize>(());

/// A tuple of interfaces.
pub trait InterfaceList: Sized + 'static {
    /// Tuple of the tables of all interfaces in the list.
    type Composite: Sync + 'static;

    /// Tuple of references to the tables of all interfaces in the list.
    type Tables: Copy + Send + Sync + 'static;

    /// Tuple of the markers of all interfaces in the list.
    type Marker;

    /// Number of interfaces in the list.
    const LEN: usize;

    /// Projects the composite table to the table references.
    fn tables(composite: &'static Self::Composite) -> Self::Tables;

    /// Returns the header of the first table.
    fn head(tables: &Self::Tables) -> &'static VTableHead;
}

/// Indicates that the list contains the interface `I` at the position `Idx`.
pub trait Contains<I: Interface, Idx>: InterfaceList {
    /// Returns the table of `I` from the composite table.
    fn composite_table(composite: &'static Self::Composite) -> &'static VTable<I>;

    /// Returns the table of `I` from the table references.
    fn table(tables: &Self::Tables) -> &'static VTable<I>;
}

/// Indicates that every interface of the list is also contained in `Super`.
///
/// Order does not matter, the relation is non-strict.
///
/// # Examples
///
/// ```
/// use fimo_dyn::{interface, list::Subset};
///
/// interface! { pub struct IA { pub a: fn() } }
/// interface! { pub struct IB { pub b: fn() } }
/// interface! { pub struct IC { pub c: fn() } }
///
/// fn is_subset<Sub: Subset<Super, Idx>, Super: fimo_dyn::InterfaceList, Idx>() {}
///
/// is_subset::<(IC, IA), (IA, IB, IC), _>();
/// is_subset::<(IA, IB), (IA, IB), _>();
/// ```
///
/// Adding an interface is rejected:
///
/// ```compile_fail
/// use fimo_dyn::{interface, list::Subset};
///
/// interface! { pub struct IA { pub a: fn() } }
/// interface! { pub struct IB { pub b: fn() } }
///
/// fn is_subset<Sub: Subset<Super, Idx>, Super: fimo_dyn::InterfaceList, Idx>() {}
///
/// is_subset::<(IA, IB), (IA,), _>();
/// ```
pub trait Subset<Super: InterfaceList, Idx>: InterfaceList {
    /// Selects the tables of the list from the tables of `Super`.
    fn project(tables: &Super::Tables) -> Self::Tables;
}

/// Types that can be pointed to by a dynamic pointer.
///
/// Implemented for interface lists and, with the `array` feature, for slices of interface
/// lists. Without the feature, slice pointers do not exist:
///
#[cfg_attr(feature = "array", doc = "```")]
#[cfg_attr(not(feature = "array"), doc = "```compile_fail")]
/// use fimo_dyn::{interface, ArrayDelete, UniquePtr};
///
/// interface! { pub struct IA { pub a: fn() } }
///
/// let ptr: UniquePtr<[(IA,)], ArrayDelete> = UniquePtr::null();
/// assert_eq!(ptr.len(), 0);
/// assert!(ptr.element(0).is_none());
/// ```
pub trait Pointee: private::Sealed {
    /// Interfaces of each element.
    type List: InterfaceList;

    /// Length metadata kept by shared pointers.
    type Len: Copy + Default + Send + Sync + 'static;

    /// Whether the pointer refers to a contiguous sequence of objects.
    const IS_ARRAY: bool;

    /// Reads the length from the deleter of an owning pointer.
    fn len_of<D: Deleter>(deleter: &D) -> Self::Len;
}

impl<L: InterfaceList> Pointee for L {
    type List = L;
    type Len = ();
    const IS_ARRAY: bool = false;

    fn len_of<D: Deleter>(_deleter: &D) -> Self::Len {}
}

#[cfg(feature = "array")]
impl<L: InterfaceList> Pointee for [L] {
    type List = L;
    type Len = usize;
    const IS_ARRAY: bool = true;

    fn len_of<D: Deleter>(deleter: &D) -> Self::Len {
        deleter.array_len()
    }
}

mod private {
    pub trait Sealed {}

    impl<L: super::InterfaceList> Sealed for L {}

    #[cfg(feature = "array")]
    impl<L: super::InterfaceList> Sealed for [L] {}
}

macro_rules! impl_interface_list {
    ($($I:ident $Idx:ident $n:tt),+) => {
        impl<$($I: Interface),+> InterfaceList for ($($I,)+) {
            type Composite = ($(VTable<$I>,)+);
            type Tables = ($(&'static VTable<$I>,)+);
            type Marker = ($($I::Marker,)+);

            const LEN: usize = [$($n),+].len();

            #[inline]
            fn tables(composite: &'static Self::Composite) -> Self::Tables {
                ($(&composite.$n,)+)
            }

            #[inline]
            fn head(tables: &Self::Tables) -> &'static VTableHead {
                tables.0.head()
            }
        }

        impl<Super: InterfaceList, $($I: Interface, $Idx),+> Subset<Super, ($($Idx,)+)>
            for ($($I,)+)
        where
            $(Super: Contains<$I, $Idx>),+
        {
            #[inline]
            fn project(tables: &Super::Tables) -> Self::Tables {
                ($(<Super as Contains<$I, $Idx>>::table(tables),)+)
            }
        }

        // Safety: Every marker of the tuple is compatible with `T`.
        unsafe impl<T, $($I: MarkerCompatible<T>),+> MarkerCompatible<T> for ($($I,)+) {}

        impl_interface_list!(@contains [$($I),+] $($I $n),+);
    };
    (@contains $all:tt $($I:ident $n:tt),+) => {
        $(impl_interface_list!(@one $all $I $n);)+
    };
    (@one [$($All:ident),+] $I:ident $n:tt) => {
        impl<$($All: Interface),+> Contains<$I, Index<$n>> for ($($All,)+) {
            #[inline]
            fn composite_table(composite: &'static Self::Composite) -> &'static VTable<$I> {
                &composite.$n
            }

            #[inline]
            fn table(tables: &Self::Tables) -> &'static VTable<$I> {
                tables.$n
            }
        }
    };
}

impl_interface_list!(A IA 0);
impl_interface_list!(A IA 0, B IB 1);
impl_interface_list!(A IA 0, B IB 1, C IC 2);
impl_interface_list!(A IA 0, B IB 1, C IC 2, D ID 3);
impl_interface_list!(A IA 0, B IB 1, C IC 2, D ID 3, E IE 4);
impl_interface_list!(A IA 0, B IB 1, C IC 2, D ID 3, E IE 4, F IF 5);
impl_interface_list!(A IA 0, B IB 1, C IC 2, D ID 3, E IE 4, F IF 5, G IG 6);
impl_interface_list!(A IA 0, B IB 1, C IC 2, D ID 3, E IE 4, F IF 5, G IG 6, H IH 7);
