//! Quick throughput benchmarks for the create/destroy paths.

use core::ptr::NonNull;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use syncprim::{
    BackendError, RawSemaphore, RawTlsSlot, SemaphoreCount, SlotKey, SystemAllocator, semaphore,
    tls_slot,
};

struct BenchSemaphore {
    _count: SemaphoreCount,
}

unsafe impl RawSemaphore for BenchSemaphore {
    const COUNT_MAX: SemaphoreCount = 1 << 30;

    unsafe fn init(this: NonNull<Self>, initial: SemaphoreCount) -> Result<(), BackendError> {
        unsafe { this.as_ptr().write(BenchSemaphore { _count: initial }) };
        Ok(())
    }

    unsafe fn finalize(_this: NonNull<Self>) -> Result<(), BackendError> {
        Ok(())
    }
}

struct BenchSlot {
    _key: u32,
}

unsafe impl RawTlsSlot for BenchSlot {
    unsafe fn init(this: NonNull<Self>) -> Result<(), BackendError> {
        unsafe { this.as_ptr().write(BenchSlot { _key: 1 }) };
        Ok(())
    }

    unsafe fn finalize(_this: NonNull<Self>) -> Result<(), BackendError> {
        Ok(())
    }
}

fn bench_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle");

    group.bench_function("semaphore_create_destroy", |b| {
        b.iter(|| {
            let sem =
                semaphore::create::<BenchSemaphore, _>(black_box(4), &SystemAllocator).unwrap();
            semaphore::destroy(black_box(sem), &SystemAllocator).unwrap();
        });
    });

    group.bench_function("tls_slot_create_destroy", |b| {
        b.iter(|| {
            let mut key = SlotKey::<BenchSlot>::default();
            tls_slot::create(black_box(&mut key), &SystemAllocator).unwrap();
            tls_slot::destroy(black_box(&mut key), &SystemAllocator).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lifecycle);
criterion_main!(benches);
