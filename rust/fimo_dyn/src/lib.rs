//! Dynamic dispatch with the vtables stored in the pointer.
//!
//! An object implements a closed list of interfaces, whose capability tables are built once
//! per concrete type and stored in a `static` composite table. Instead of embedding a vtable
//! pointer into every object, the pointers referring to the object carry references to the
//! tables of the interfaces they request. Requesting a subset of the interfaces of another
//! pointer is checked at compile time.
//!
//! # Examples
//!
//! ```
//! use fimo_dyn::{interface, object, DynMethod, DynPtr, SharedPtr, This, UniquePtr};
//!
//! interface! {
//!     /// Geometric shapes.
//!     pub struct IShape {
//!         pub area: fn(This) -> f64,
//!     }
//! }
//!
//! interface! {
//!     /// Named things.
//!     pub struct IName {
//!         pub name: fn() -> &'static str,
//!     }
//! }
//!
//! pub struct Square(f64);
//!
//! fn square_area(this: This) -> f64 {
//!     // Safety: The table is built for `Square`.
//!     let square = unsafe { this.as_ref::<Square>() };
//!     square.0 * square.0
//! }
//!
//! object! {
//!     impl Square => (IShape, IName) {
//!         IShape { area: DynMethod::new(square_area) },
//!         IName { name: DynMethod::new(|| "square") },
//!     }
//! }
//!
//! let square: UniquePtr<(IShape, IName)> = UniquePtr::boxed(Square(2.0));
//! let shape = square.get::<IShape, _>().map(|s| s.area.bind(s.this())());
//! assert_eq!(shape, Some(4.0));
//!
//! let named: DynPtr<(IName,), _, _> = square.borrow();
//! assert_eq!(named.get::<IName, _>().map(|n| n.name.call()), Some("square"));
//! drop(named);
//!
//! let shared: SharedPtr<(IName,)> = SharedPtr::from_unique(square.cast());
//! assert_eq!(shared.use_count(), 1);
//! ```
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    rustdoc::broken_intra_doc_links
)]

use static_assertions as sa;

pub mod allocator;
pub mod deleter;
pub mod dptr;
pub mod error;
pub mod fat;
pub mod interface;
pub mod list;
pub mod method;
pub mod object;
pub mod shared;
pub mod unique;
pub mod vtable;

pub use allocator::{Allocator, Global};
#[cfg(feature = "array")]
pub use deleter::ArrayDelete;
pub use deleter::{BoxCompatible, BoxDelete, DefaultDelete, Deleter, NoDelete};
pub use dptr::{Borrowed, DynPtr, Ownership, Unique};
pub use error::{Error, Result};
pub use fat::FatPtr;
pub use interface::{DefaultMarker, Interface, MarkerCompatible, SendSyncMarker};
pub use list::{Contains, Index, InterfaceList, Pointee, Subset};
pub use method::{DynMethod, This};
pub use object::{Extends, Implements, Object};
pub use shared::{SharedPtr, WeakPtr};
pub use unique::UniquePtr;
pub use vtable::{Bound, VTable, VTableHead};
