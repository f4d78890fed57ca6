use thiserror::Error;

/// Errors returned by [`IntSet`](crate::IntSet) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntSetError {
    /// A mutating operation was invoked on a read-only view.
    #[error("cannot modify a read-only IntSet")]
    ReadOnly,

    /// A signed offset or count argument was below zero.
    #[error("{name} must be non-negative, got {value}")]
    NegativeArgument { name: &'static str, value: isize },

    /// The destination cannot hold `count` elements starting at `offset`.
    #[error(
        "destination of length {len} cannot hold {count} elements starting at offset {offset}"
    )]
    DestinationTooSmall {
        offset: usize,
        count: usize,
        len: usize,
    },

    /// The member count does not fit the 32-bit accessor.
    #[error("member count {0} does not fit in i32")]
    CountOverflow(u64),
}

pub type Result<T> = std::result::Result<T, IntSetError>;
