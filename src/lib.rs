//! Portable lifecycle layer for cross-platform synchronization primitives.
//!
//! Two primitives — a counting semaphore and a thread-local storage slot —
//! share one platform-independent wrapper layer that handles dynamic
//! allocation, initialization delegation, error normalization, and symmetric
//! teardown. The platform-specific representations stay behind the
//! [`RawSemaphore`] and [`RawTlsSlot`] contracts, one implementation per
//! target OS, selected at build time; allocation strategy is injected per
//! call through [`RawAllocator`] rather than taken from global state.
//!
//! The contract this layer establishes, uniformly across backends:
//!
//! - **All-or-nothing construction.** A create either returns a fully
//!   initialized handle or leaves no trace: no leaked allocation, no
//!   partially initialized object visible to the caller.
//! - **Teardown before release.** A destroy deallocates only after the
//!   backend confirms finalization; on backend failure the handle survives
//!   intact for retry or inspection.
//! - **Normalized errors.** Caller-contract violations surface as
//!   [`LifecycleError::InvalidArgument`], exhaustion as
//!   [`LifecycleError::OutOfMemory`], and backend codes pass through
//!   verbatim.
//!
//! Wait/post and get/set semantics are out of scope here; they belong to the
//! backends and the layers built on top of the handles.

pub mod alloc;
pub mod error;
pub mod semaphore;
pub mod tls_slot;

pub use alloc::{AllocFn, DeallocFn, DeallocError, FnPairAllocator, RawAllocator, SystemAllocator};
pub use error::{BackendError, LifecycleError, LifecycleResult};
pub use semaphore::{DestroyError, RawSemaphore, Semaphore, SemaphoreCount};
pub use tls_slot::{RawTlsSlot, SlotKey};
