//! Error types.
use thiserror::Error;

/// Errors reported by the pointers of the crate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The object referenced by a weak pointer has been destroyed.
    #[error("the referenced object has expired")]
    Expired,
    /// The control block of a shared pointer could not be allocated.
    #[error("could not allocate the control block")]
    Alloc,
}

/// Result type of the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
