//! Object definitions.
use crate::{
    fat::FatPtr,
    interface::Interface,
    list::{Contains, InterfaceList},
};

/// Implements the [`Object`] trait for a concrete type.
///
/// Takes the type, the list of implemented interfaces and one interface instance per
/// interface, in the same order. The capability tables are built for the type and stored
/// in a single `static` composite table.
///
/// # Examples
///
/// ```
/// use fimo_dyn::{interface, object, DynMethod, Object, This};
///
/// interface! {
///     pub struct IName {
///         pub name: fn() -> &'static str,
///     }
/// }
///
/// interface! {
///     pub struct IValue {
///         pub value: fn(This) -> i32,
///     }
/// }
///
/// struct Answer(i32);
///
/// fn answer_value(this: This) -> i32 {
///     // Safety: The table is built for `Answer`.
///     unsafe { this.as_ref::<Answer>().0 }
/// }
///
/// object! {
///     impl Answer => (IName, IValue) {
///         IName { name: DynMethod::new(|| "answer") },
///         IValue { value: DynMethod::new(answer_value) },
///     }
/// }
///
/// let answer = Answer(42);
/// let fat = answer.fat();
/// assert_eq!(fat.get::<IName, _>().name.call(), "answer");
/// assert_eq!(fat.get::<IValue, _>().value.bind(fat.this())(), 42);
/// ```
#[macro_export]
macro_rules! object {
    (
        impl $ty:ty => ($($iface:ty),+ $(,)?) {
            $($table:expr),+ $(,)?
        }
    ) => {
        // Safety: Every table of the composite is built for `$ty`.
        unsafe impl $crate::Object for $ty {
            type Interfaces = ($($iface,)+);

            fn composite() -> &'static <Self::Interfaces as $crate::InterfaceList>::Composite {
                static COMPOSITE: <($($iface,)+) as $crate::InterfaceList>::Composite =
                    ($($crate::VTable::<$iface>::new::<$ty>($table),)+);
                &COMPOSITE
            }
        }
    };
}

/// A concrete type implementing a list of interfaces.
///
/// # Safety
///
/// Every table of the composite table must be built for `Self`, i.e. with
/// [`VTable::new::<Self>`](crate::VTable::new), and the same composite table must be returned
/// on every call. The [`object!`] macro upholds both requirements.
pub unsafe trait Object: Sized + 'static {
    /// Interfaces implemented by the object.
    type Interfaces: InterfaceList;

    /// Returns the composite table of the object.
    fn composite() -> &'static <Self::Interfaces as InterfaceList>::Composite;

    /// Returns references to all tables of the object.
    fn tables() -> <Self::Interfaces as InterfaceList>::Tables {
        <Self::Interfaces as InterfaceList>::tables(Self::composite())
    }

    /// Constructs a fat pointer to the object.
    fn fat(&self) -> FatPtr<'_, Self> {
        FatPtr::new(self)
    }
}

/// Indicates that the object implements the interface `I`.
///
/// Implemented automatically for every [`Object`] whose interface list contains `I`.
///
/// ```compile_fail
/// use fimo_dyn::{interface, object, object::Implements, DynMethod};
///
/// interface! { pub struct IA { pub a: fn() } }
/// interface! { pub struct IB { pub b: fn() } }
///
/// struct OnlyA;
///
/// object! {
///     impl OnlyA => (IA) {
///         IA { a: DynMethod::new(|| {}) },
///     }
/// }
///
/// fn implements<T: Implements<I, Idx>, I: fimo_dyn::Interface, Idx>() {}
///
/// implements::<OnlyA, IB, _>();
/// ```
pub trait Implements<I: Interface, Idx>: Object {
    /// Returns the table of `I` built for the object.
    fn vtable() -> &'static crate::VTable<I>;
}

impl<T, I, Idx> Implements<I, Idx> for T
where
    T: Object,
    I: Interface,
    T::Interfaces: Contains<I, Idx>,
{
    fn vtable() -> &'static crate::VTable<I> {
        <T::Interfaces as Contains<I, Idx>>::composite_table(T::composite())
    }
}

/// Indicates that the object derives from the base object `B`.
///
/// A pointer to the object may be reinterpreted as a pointer to `B`, while still
/// dispatching to the implementations of `Self`.
///
/// # Safety
///
/// `Self` must be `#[repr(C)]` and its first field must be of type `B`.
pub unsafe trait Extends<B: Object>: Object {}
