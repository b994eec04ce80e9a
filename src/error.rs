//! Status taxonomy shared by both lifecycle managers.

use derive_more::{Display, Error, From};

/// Opaque failure code reported by a platform backend.
///
/// Only the backend that produced a code knows its meaning; the lifecycle
/// layer passes it through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("backend error code {_0}")]
pub struct BackendError(#[error(not(source))] pub i32);

/// Failure of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error, From)]
pub enum LifecycleError {
    /// A caller-supplied argument violated the operation's contract.
    #[display("invalid argument")]
    InvalidArgument,

    /// The injected allocator could not serve the request.
    #[display("out of memory")]
    OutOfMemory,

    /// The platform backend failed; the code is propagated unchanged.
    #[display("{_0}")]
    #[from]
    Backend(BackendError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
