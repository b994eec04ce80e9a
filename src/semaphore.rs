//! Counting-semaphore lifecycle manager.
//!
//! Allocates storage for one semaphore representation through the injected
//! allocator, delegates counter initialization to the platform backend, and
//! tears both down symmetrically. Wait/post semantics live entirely in the
//! backend and the layers above; this module only manages the handle's
//! existence.

use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;

use crate::alloc::RawAllocator;
use crate::error::{BackendError, LifecycleError};

/// Counter type shared with the backends. Signed so that out-of-range input
/// is a checkable caller error rather than a silent wrap.
pub type SemaphoreCount = i64;

/// Platform contract for one semaphore representation.
///
/// Implemented once per target operating system and selected at build time;
/// the lifecycle layer never inspects the representation, only its address.
///
/// Representations must not be zero-sized: [`create`] allocates
/// `Layout::new::<Self>()`, allocators refuse zero-size requests (the shipped
/// ones return null), and a zero-sized backend therefore reports
/// [`LifecycleError::OutOfMemory`] instead of ever constructing.
///
/// # Safety
///
/// `init` must leave the memory either fully initialized or safe to
/// deallocate without further cleanup, and `finalize` must leave it safe to
/// retry finalization on when it fails. Violating either breaks the
/// all-or-nothing guarantees of [`create`] and [`destroy`].
pub unsafe trait RawSemaphore: Sized {
    /// Largest initial count the representation can store.
    const COUNT_MAX: SemaphoreCount;

    /// Initialize the representation in place with `initial` permits.
    ///
    /// # Safety
    ///
    /// `this` must point to zeroed memory of `Self`'s size and alignment that
    /// holds no live representation.
    unsafe fn init(this: NonNull<Self>, initial: SemaphoreCount) -> Result<(), BackendError>;

    /// Release the OS resources behind an initialized representation.
    ///
    /// # Safety
    ///
    /// `this` must point to a representation that `init` completed
    /// successfully and that has not been finalized since.
    unsafe fn finalize(this: NonNull<Self>) -> Result<(), BackendError>;
}

/// Owned handle to an initialized semaphore.
///
/// Handles are created by [`create`] and must be passed back to [`destroy`]
/// with the same allocator. Dropping a handle without destroying it leaks the
/// allocation and whatever OS state the backend holds.
pub struct Semaphore<R: RawSemaphore> {
    raw: NonNull<R>,
}

impl<R: RawSemaphore> Semaphore<R> {
    /// Address of the backend representation, for the wait/post layer.
    pub fn as_raw(&self) -> NonNull<R> {
        self.raw
    }
}

impl<R: RawSemaphore> fmt::Debug for Semaphore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Semaphore").field(&self.raw).finish()
    }
}

// The handle is an exclusively owned pointer; it moves between threads
// whenever the representation itself may.
unsafe impl<R: RawSemaphore + Send> Send for Semaphore<R> {}
unsafe impl<R: RawSemaphore + Sync> Sync for Semaphore<R> {}

/// Failed teardown. Hands the still-valid handle back to the caller for a
/// retry or for diagnostic inspection.
pub struct DestroyError<R: RawSemaphore> {
    /// The handle, untouched; the backend refused to finalize it.
    pub semaphore: Semaphore<R>,
    /// Why finalization failed.
    pub error: LifecycleError,
}

impl<R: RawSemaphore> fmt::Debug for DestroyError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestroyError")
            .field("semaphore", &self.semaphore)
            .field("error", &self.error)
            .finish()
    }
}

impl<R: RawSemaphore> fmt::Display for DestroyError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<R: RawSemaphore> std::error::Error for DestroyError<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Create a semaphore with `initial` permits.
///
/// Construction is all-or-nothing: on any failure the caller receives no
/// handle and no allocation survives. The success path performs exactly one
/// allocation; the backend-failure path performs one allocation and one
/// deallocation; the invalid-argument path touches the allocator not at all.
pub fn create<R, A>(initial: SemaphoreCount, allocator: &A) -> Result<Semaphore<R>, LifecycleError>
where
    R: RawSemaphore,
    A: RawAllocator,
{
    if initial < 0 || initial > R::COUNT_MAX {
        return Err(LifecycleError::InvalidArgument);
    }

    let layout = Layout::new::<R>();
    let Some(raw) = NonNull::new(allocator.allocate_zeroed(layout).cast::<R>()) else {
        return Err(LifecycleError::OutOfMemory);
    };

    match unsafe { R::init(raw, initial) } {
        Ok(()) => Ok(Semaphore { raw }),
        Err(backend) => {
            // Unwind the allocation so no partial object escapes. The pointer
            // came from this allocator moments ago, so a rejected release is
            // a broken allocator, not a recoverable condition.
            let released = unsafe { allocator.deallocate(raw.cast(), layout) };
            assert!(
                released.is_ok(),
                "allocator rejected a pointer it just handed out"
            );
            Err(LifecycleError::Backend(backend))
        }
    }
}

/// Destroy a semaphore created by [`create`].
///
/// The backend finalizes first; only after it confirms teardown is the memory
/// released. If finalization fails the handle is returned intact inside
/// [`DestroyError`] — releasing memory the backend could not cleanly tear
/// down would risk leaking or corrupting OS-level state.
pub fn destroy<R, A>(semaphore: Semaphore<R>, allocator: &A) -> Result<(), DestroyError<R>>
where
    R: RawSemaphore,
    A: RawAllocator,
{
    let raw = semaphore.raw;
    match unsafe { R::finalize(raw) } {
        Ok(()) => {
            let released = unsafe { allocator.deallocate(raw.cast(), Layout::new::<R>()) };
            assert!(
                released.is_ok(),
                "allocator rejected a pointer it previously handed out"
            );
            Ok(())
        }
        Err(backend) => Err(DestroyError {
            semaphore,
            error: LifecycleError::Backend(backend),
        }),
    }
}
