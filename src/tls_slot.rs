//! Thread-local-slot lifecycle manager.
//!
//! Structurally the mirror of the semaphore manager, with one extra
//! discipline: the caller-held [`SlotKey`] is itself part of the state
//! machine (uninitialized → initialized → uninitialized). Every failure path
//! of [`create`] leaves the key holding the uninitialized sentinel, and a
//! successful [`destroy`] resets it, so a stale key is always detectable.

use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};

use crate::alloc::RawAllocator;
use crate::error::{BackendError, LifecycleError, LifecycleResult};

/// Platform contract for one thread-local-slot registration.
///
/// Implemented once per target operating system and selected at build time.
/// Get/set operations live in the backend and the layers above.
///
/// Representations must not be zero-sized, for the same reason as
/// [`RawSemaphore`]: a zero-size layout is refused by allocators, so a
/// zero-sized backend reports [`LifecycleError::OutOfMemory`] instead of ever
/// registering a slot.
///
/// # Safety
///
/// Same contract as [`RawSemaphore`]: `init` leaves the memory fully valid or
/// safe to deallocate with no further cleanup, and a failed `finalize` leaves
/// it safe to retry on.
///
/// [`RawSemaphore`]: crate::semaphore::RawSemaphore
pub unsafe trait RawTlsSlot: Sized {
    /// Register a fresh slot in place.
    ///
    /// # Safety
    ///
    /// `this` must point to zeroed memory of `Self`'s size and alignment that
    /// holds no live registration.
    unsafe fn init(this: NonNull<Self>) -> Result<(), BackendError>;

    /// Release the OS-level registration.
    ///
    /// # Safety
    ///
    /// `this` must point to a registration that `init` completed successfully
    /// and that has not been finalized since.
    unsafe fn finalize(this: NonNull<Self>) -> Result<(), BackendError>;
}

/// Caller-held reference slot for one process-wide TLS registration.
///
/// A key holds either the [`UNINITIALIZED`] sentinel or the address of a
/// live, fully initialized registration — never a dangling or partially built
/// pointer. Keys start out as the sentinel and return to it when [`destroy`]
/// succeeds.
///
/// [`UNINITIALIZED`]: SlotKey::UNINITIALIZED
pub struct SlotKey<R: RawTlsSlot> {
    raw: *mut R,
}

impl<R: RawTlsSlot> SlotKey<R> {
    /// The distinguished "not bound to any live slot" value.
    pub const UNINITIALIZED: Self = Self {
        raw: ptr::null_mut(),
    };

    /// Whether the key is currently bound to a live registration.
    pub fn is_initialized(&self) -> bool {
        !self.raw.is_null()
    }

    /// Address of the backend registration, for the get/set layer.
    pub fn as_raw(&self) -> Option<NonNull<R>> {
        NonNull::new(self.raw)
    }
}

impl<R: RawTlsSlot> Default for SlotKey<R> {
    fn default() -> Self {
        Self::UNINITIALIZED
    }
}

impl<R: RawTlsSlot> fmt::Debug for SlotKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_null() {
            f.write_str("SlotKey(uninitialized)")
        } else {
            f.debug_tuple("SlotKey").field(&self.raw).finish()
        }
    }
}

unsafe impl<R: RawTlsSlot + Send> Send for SlotKey<R> {}
unsafe impl<R: RawTlsSlot + Sync> Sync for SlotKey<R> {}

/// Create a thread-local slot and bind `key` to it.
///
/// `*key` is set to the uninitialized sentinel before anything else, so on
/// every failure path — exhaustion or backend refusal alike — the caller's
/// key is left holding the sentinel rather than garbage from a previous use.
/// That reset-first ordering is a postcondition, not an implementation
/// detail.
pub fn create<R, A>(key: &mut SlotKey<R>, allocator: &A) -> LifecycleResult<()>
where
    R: RawTlsSlot,
    A: RawAllocator,
{
    *key = SlotKey::UNINITIALIZED;

    let layout = Layout::new::<R>();
    let Some(raw) = NonNull::new(allocator.allocate_zeroed(layout).cast::<R>()) else {
        return Err(LifecycleError::OutOfMemory);
    };

    match unsafe { R::init(raw) } {
        Ok(()) => {
            key.raw = raw.as_ptr();
            Ok(())
        }
        Err(backend) => {
            let released = unsafe { allocator.deallocate(raw.cast(), layout) };
            assert!(
                released.is_ok(),
                "allocator rejected a pointer it just handed out"
            );
            Err(LifecycleError::Backend(backend))
        }
    }
}

/// Destroy the slot `key` is bound to.
///
/// Destroying an unbound key is a contract violation and yields
/// [`LifecycleError::InvalidArgument`] — which is exactly what a second
/// destroy of the same key observes, since a successful destroy resets the
/// key to the sentinel. On backend failure the key and the registration are
/// left untouched, safe to retry.
pub fn destroy<R, A>(key: &mut SlotKey<R>, allocator: &A) -> LifecycleResult<()>
where
    R: RawTlsSlot,
    A: RawAllocator,
{
    let Some(raw) = NonNull::new(key.raw) else {
        return Err(LifecycleError::InvalidArgument);
    };

    unsafe { R::finalize(raw) }?;

    let released = unsafe { allocator.deallocate(raw.cast(), Layout::new::<R>()) };
    assert!(
        released.is_ok(),
        "allocator rejected a pointer it previously handed out"
    );
    *key = SlotKey::UNINITIALIZED;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnreachableSlot {
        _key: u32,
    }

    unsafe impl RawTlsSlot for UnreachableSlot {
        unsafe fn init(_this: NonNull<Self>) -> Result<(), BackendError> {
            unreachable!("init called on the validation path");
        }

        unsafe fn finalize(_this: NonNull<Self>) -> Result<(), BackendError> {
            unreachable!("finalize called on the validation path");
        }
    }

    struct NoTouchAllocator;

    impl RawAllocator for NoTouchAllocator {
        fn allocate_zeroed(&self, _layout: Layout) -> *mut u8 {
            panic!("allocator touched on the validation path");
        }

        unsafe fn deallocate(
            &self,
            _ptr: NonNull<u8>,
            _layout: Layout,
        ) -> Result<(), crate::alloc::DeallocError> {
            panic!("allocator touched on the validation path");
        }
    }

    #[test]
    fn keys_start_uninitialized() {
        let key = SlotKey::<UnreachableSlot>::default();
        assert!(!key.is_initialized());
        assert!(key.as_raw().is_none());
    }

    #[test]
    fn destroying_an_unbound_key_is_a_contract_violation() {
        let mut key = SlotKey::<UnreachableSlot>::UNINITIALIZED;
        let result = destroy(&mut key, &NoTouchAllocator);
        assert_eq!(result, Err(LifecycleError::InvalidArgument));
        assert!(!key.is_initialized());
    }

    #[test]
    fn failed_create_resets_the_key_first() {
        struct EmptyAllocator;

        impl RawAllocator for EmptyAllocator {
            fn allocate_zeroed(&self, _layout: Layout) -> *mut u8 {
                ptr::null_mut()
            }

            unsafe fn deallocate(
                &self,
                _ptr: NonNull<u8>,
                _layout: Layout,
            ) -> Result<(), crate::alloc::DeallocError> {
                panic!("nothing was allocated");
            }
        }

        // Seed the key with a stale (non-sentinel) value, as a buggy caller
        // reusing a variable would.
        let mut key = SlotKey::<UnreachableSlot> {
            raw: NonNull::<UnreachableSlot>::dangling().as_ptr(),
        };
        let result = create(&mut key, &EmptyAllocator);
        assert_eq!(result, Err(LifecycleError::OutOfMemory));
        assert!(!key.is_initialized());
    }
}
