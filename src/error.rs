use thiserror::Error;

/// Errors raised by the core RIB/DP API: `create`, `modify`, and the
/// lookup-handle accessors. Deliberately small and allocation-free on the
/// variants that can occur mid-`modify`, so the hot path never has to think
/// about I/O.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum FibError {
    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error("no space: TBL8 pool exhausted")]
    NoSpace,

    #[error("prefix not found")]
    NotFound,

    #[error("allocation failed")]
    AllocFailed,
}

pub type Result<T> = std::result::Result<T, FibError>;

/// Errors from the snapshot text format (`Fib::load_rib`/`dump_rib`). Kept
/// separate from [`FibError`] so that I/O concerns never leak into the
/// `modify`/`lookup` surface.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error(transparent)]
    Fib(#[from] FibError),
}

pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;
