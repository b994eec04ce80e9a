//! Injected allocation strategies.
//!
//! Every create/destroy call takes the allocator explicitly; the lifecycle
//! layer holds no process-global allocator state. Two strategies ship with
//! the crate: [`SystemAllocator`] over the process heap, and
//! [`FnPairAllocator`] adapting a C-style context plus function-pointer pair
//! for embedding under a host application's allocator.

use core::alloc::Layout;
use core::ffi::{c_int, c_void};
use core::ptr::{self, NonNull};

use derive_more::{Display, Error};

use crate::error::{LifecycleError, LifecycleResult};

/// The allocator's deallocate operation rejected a pointer.
///
/// The lifecycle layer treats this as a fatal contract violation whenever the
/// pointer came from a matching, successful allocation on the same allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("allocator rejected deallocation")]
pub struct DeallocError;

/// Caller-supplied allocation strategy.
///
/// Implementations must be safe for concurrent use from every thread that may
/// invoke create or destroy; the lifecycle layer passes that requirement
/// through without enforcing it.
pub trait RawAllocator {
    /// Allocate `layout.size()` zeroed bytes at `layout.align()` alignment.
    ///
    /// Returns null when the request cannot be served.
    fn allocate_zeroed(&self, layout: Layout) -> *mut u8;

    /// Release a block previously returned by [`allocate_zeroed`] on the same
    /// allocator with the same layout.
    ///
    /// # Safety
    ///
    /// `ptr` must come from a matching `allocate_zeroed` call on `self` that
    /// has not already been released.
    ///
    /// [`allocate_zeroed`]: RawAllocator::allocate_zeroed
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), DeallocError>;
}

// =============================================================================
// Process-heap strategy
// =============================================================================

/// Default strategy backed by `std::alloc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl RawAllocator for SystemAllocator {
    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        // `std::alloc` forbids zero-size requests; report them as exhaustion.
        if layout.size() == 0 {
            return ptr::null_mut();
        }
        unsafe { std::alloc::alloc_zeroed(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), DeallocError> {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        Ok(())
    }
}

// =============================================================================
// C function-pair strategy
// =============================================================================

/// Allocation function shape: `alloc(context, size) -> pointer-or-null`.
pub type AllocFn = unsafe extern "C" fn(context: *mut c_void, size: usize) -> *mut c_void;

/// Deallocation function shape: `dealloc(context, ptr) -> status` (zero on
/// success).
pub type DeallocFn = unsafe extern "C" fn(context: *mut c_void, ptr: *mut c_void) -> c_int;

/// Largest alignment a malloc-style allocation function is assumed to honor.
const FUNDAMENTAL_ALIGN: usize = 16;

/// Strategy built from a C-style context plus function-pointer pair.
///
/// The pair is only assumed to provide malloc-style fundamental alignment;
/// requests above that are refused by returning null. Blocks
/// are zeroed by the adapter, so the functions themselves may be plain
/// malloc/free shims.
pub struct FnPairAllocator {
    context: *mut c_void,
    alloc: AllocFn,
    dealloc: DeallocFn,
}

impl FnPairAllocator {
    /// Build the strategy from nullable function pointers.
    ///
    /// A missing function is a caller-contract violation and yields
    /// [`LifecycleError::InvalidArgument`] here, before any lifecycle
    /// operation can run.
    ///
    /// # Safety
    ///
    /// `alloc` and `dealloc` must form a matched pair: any non-null pointer
    /// returned by `alloc(context, size)` must stay valid for `size` bytes
    /// until passed to `dealloc(context, ..)`, and both must tolerate being
    /// called with this `context` from any thread the caller uses.
    pub unsafe fn new(
        context: *mut c_void,
        alloc: Option<AllocFn>,
        dealloc: Option<DeallocFn>,
    ) -> LifecycleResult<Self> {
        let (Some(alloc), Some(dealloc)) = (alloc, dealloc) else {
            return Err(LifecycleError::InvalidArgument);
        };
        Ok(Self {
            context,
            alloc,
            dealloc,
        })
    }
}

impl RawAllocator for FnPairAllocator {
    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.size() == 0 || layout.align() > FUNDAMENTAL_ALIGN {
            return ptr::null_mut();
        }
        let block = unsafe { (self.alloc)(self.context, layout.size()) }.cast::<u8>();
        if !block.is_null() {
            unsafe { block.write_bytes(0, layout.size()) };
        }
        block
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) -> Result<(), DeallocError> {
        let status = unsafe { (self.dealloc)(self.context, ptr.as_ptr().cast()) };
        if status == 0 { Ok(()) } else { Err(DeallocError) }
    }
}
