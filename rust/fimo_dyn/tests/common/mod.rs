#![allow(dead_code)]

use fimo_dyn::{interface, object, DynMethod, Extends, SendSyncMarker, This};
use std::{cell::RefCell, f64::consts::PI};

interface! {
    /// Two-dimensional shapes.
    #![marker = SendSyncMarker]
    pub struct IShape {
        pub name: fn() -> String,
        pub area: fn(This) -> f64,
    }
}

interface! {
    /// Shapes with four right angles.
    #![marker = SendSyncMarker]
    pub struct IRectangular {
        pub is_square: fn(This) -> bool,
    }
}

thread_local! {
    static LAST_DROPPED: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Returns the name of the last shape dropped on the current thread.
pub fn last_dropped() -> String {
    LAST_DROPPED.with(|msg| msg.borrow().clone())
}

fn set_last_dropped(name: String) {
    LAST_DROPPED.with(|msg| *msg.borrow_mut() = name);
}

pub struct Circle {
    pub r: f64,
}

fn circle_area(this: This) -> f64 {
    // Safety: The table is built for `Circle`.
    let circle = unsafe { this.as_ref::<Circle>() };
    PI * circle.r * circle.r
}

object! {
    impl Circle => (IShape) {
        IShape {
            name: DynMethod::new(|| "circle".to_owned()),
            area: DynMethod::new(circle_area),
        },
    }
}

impl Drop for Circle {
    fn drop(&mut self) {
        set_last_dropped("circle".to_owned());
    }
}

pub struct Rectangle {
    pub w: f64,
    pub h: f64,
}

fn rectangle_area(this: This) -> f64 {
    // Safety: The table is built for `Rectangle`.
    let rect = unsafe { this.as_ref::<Rectangle>() };
    rect.w * rect.h
}

fn rectangle_is_square(this: This) -> bool {
    // Safety: The table is built for `Rectangle`.
    let rect = unsafe { this.as_ref::<Rectangle>() };
    (rect.w - rect.h).abs() < f64::EPSILON
}

object! {
    impl Rectangle => (IShape, IRectangular) {
        IShape {
            name: DynMethod::new(|| "rectangle".to_owned()),
            area: DynMethod::new(rectangle_area),
        },
        IRectangular { is_square: DynMethod::new(rectangle_is_square) },
    }
}

impl Drop for Rectangle {
    fn drop(&mut self) {
        set_last_dropped("rectangle".to_owned());
    }
}

#[repr(C)]
pub struct Square {
    pub l: f64,
}

fn square_area(this: This) -> f64 {
    // Safety: The table is built for `Square` or a type extending it.
    let square = unsafe { this.as_ref::<Square>() };
    square.l * square.l
}

object! {
    impl Square => (IShape, IRectangular) {
        IShape {
            name: DynMethod::new(|| "square".to_owned()),
            area: DynMethod::new(square_area),
        },
        IRectangular { is_square: DynMethod::new(|_| true) },
    }
}

#[repr(C)]
pub struct DottedSquare {
    pub square: Square,
    pub dots: u32,
}

object! {
    impl DottedSquare => (IShape, IRectangular) {
        IShape {
            name: DynMethod::new(|| "dotted_square".to_owned()),
            area: DynMethod::new(square_area),
        },
        IRectangular { is_square: DynMethod::new(|_| true) },
    }
}

// Safety: `DottedSquare` is `repr(C)` with a `Square` as its first field.
unsafe impl Extends<Square> for DottedSquare {}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
