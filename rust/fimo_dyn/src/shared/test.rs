use crate::{
    allocator::Allocator, error::Error, DynMethod, DynPtr, SendSyncMarker, SharedPtr, This,
    UniquePtr, WeakPtr,
};
use std::{
    alloc::Layout,
    cell::Cell,
    ptr::NonNull,
    rc::Rc,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
};

crate::interface! {
    #![marker = SendSyncMarker]
    struct IId {
        id: fn(This) -> usize,
    }
}

crate::interface! {
    #![marker = SendSyncMarker]
    struct IKind {
        kind: fn() -> &'static str,
    }
}

struct Counted {
    id: usize,
    drops: Arc<AtomicUsize>,
}

impl Counted {
    fn new(id: usize, drops: &Arc<AtomicUsize>) -> Self {
        Self {
            id,
            drops: drops.clone(),
        }
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn counted_id(this: This) -> usize {
    // Safety: The table is built for `Counted`.
    unsafe { this.as_ref::<Counted>().id }
}

crate::object! {
    impl Counted => (IKind, IId) {
        IKind { kind: DynMethod::new(|| "counted") },
        IId { id: DynMethod::new(counted_id) },
    }
}

#[repr(C)]
struct Pair {
    first: Counted,
    second: Counted,
}

crate::object! {
    impl Pair => (IKind) {
        IKind { kind: DynMethod::new(|| "pair") },
    }
}

crate::interface! {
    struct ILabel {
        label: fn(This) -> &'static str,
    }
}

struct Label(&'static str);

fn label_text(this: This) -> &'static str {
    // Safety: The table is built for `Label`.
    unsafe { this.as_ref::<Label>().0 }
}

crate::object! {
    impl Label => (ILabel) {
        ILabel { label: DynMethod::new(label_text) },
    }
}

struct Shelf {
    label: Label,
    drops: Rc<Cell<usize>>,
}

impl Drop for Shelf {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

crate::object! {
    impl Shelf => (ILabel) {
        ILabel { label: DynMethod::new(|_| "shelf") },
    }
}

fn label_of(ptr: &SharedPtr<(ILabel,)>) -> Option<&'static str> {
    ptr.get::<ILabel, _>().map(|t| t.label.bind(t.this())())
}

fn id_of(ptr: &SharedPtr<(IKind, IId)>) -> Option<usize> {
    ptr.get::<IId, _>().map(|t| t.id.bind(t.this())())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn empty() {
    let ptr: SharedPtr<(IKind,)> = SharedPtr::null();
    assert!(ptr.is_null());
    assert_eq!(ptr.use_count(), 0);
    assert!(ptr.downgrade().expired());

    let weak: WeakPtr<(IKind,)> = WeakPtr::new();
    assert!(weak.expired());
    assert_eq!(weak.upgrade().err(), Some(Error::Expired));
    assert!(weak.lock().is_null());

    let unique: UniquePtr<(IKind,)> = UniquePtr::null();
    assert!(SharedPtr::from_unique(unique).is_null());
}

#[test]
fn counts() {
    init_tracing();
    let drops = Arc::new(AtomicUsize::new(0));
    let ptr: SharedPtr<(IKind, IId)> = SharedPtr::boxed(Counted::new(7, &drops));
    assert_eq!(ptr.use_count(), 1);
    assert_eq!(ptr.weak_count(), 0);

    let copies: Vec<_> = (0..4).map(|_| ptr.clone()).collect();
    assert_eq!(ptr.use_count(), 5);
    assert!(copies.iter().all(|c| c.ptr_eq(&ptr) && c.owner_eq(&ptr)));
    assert!(copies.iter().all(|c| id_of(c) == Some(7)));

    drop(copies);
    assert_eq!(ptr.use_count(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(ptr);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn weak_expires_after_destruction() {
    init_tracing();
    let drops = Arc::new(AtomicUsize::new(0));
    let ptr: SharedPtr<(IKind, IId)> = SharedPtr::boxed(Counted::new(1, &drops));
    let weak = ptr.downgrade();
    let weak2 = WeakPtr::from(&ptr);
    assert_eq!(ptr.weak_count(), 2);
    assert_eq!(weak.use_count(), 1);
    assert!(!weak.expired());

    let Ok(locked) = SharedPtr::try_from(&weak) else {
        panic!("the object is alive");
    };
    assert_eq!(ptr.use_count(), 2);
    assert_eq!(id_of(&locked), Some(1));
    drop(locked);

    drop(ptr);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(weak.expired());
    assert_eq!(weak.weak_count(), 2);
    assert_eq!(weak.upgrade().err(), Some(Error::Expired));
    assert!(weak.lock().is_null());

    drop(weak);
    assert!(weak2.expired());
    drop(weak2);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn cast_and_borrow() {
    let drops = Arc::new(AtomicUsize::new(0));
    let unique: UniquePtr<(IKind, IId)> = UniquePtr::boxed(Counted::new(3, &drops));
    let ptr = unique.into_shared();

    let borrowed: DynPtr<(IId,), _, _> = ptr.borrow();
    assert_eq!(borrowed.get::<IId, _>().map(|t| t.id.bind(t.this())()), Some(3));
    drop(borrowed);

    let copy = ptr.clone();
    let kind: SharedPtr<(IKind,)> = copy.cast();
    assert_eq!(ptr.use_count(), 2);
    assert!(kind.owner_eq(&ptr));
    assert_eq!(kind.get::<IKind, _>().map(|t| t.kind.call()), Some("counted"));

    drop(ptr);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(kind);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn aliasing_shares_ownership() {
    let drops = Arc::new(AtomicUsize::new(0));
    let owner: SharedPtr<(IKind,)> = SharedPtr::boxed(Pair {
        first: Counted::new(1, &drops),
        second: Counted::new(2, &drops),
    });

    let alias: SharedPtr<(IKind, IId)> = {
        let Some(pair) = owner.as_ptr() else {
            panic!("owner is not empty");
        };
        // Safety: The pair is kept alive by `owner`.
        let second = unsafe { &pair.cast::<Pair>().as_ref().second };
        // Safety: `second` is a part of the object of `owner`.
        unsafe { SharedPtr::aliasing(&owner, DynPtr::from_ref(second)) }
    };

    assert_eq!(owner.use_count(), 2);
    assert_eq!(alias.use_count(), 2);
    assert!(alias.owner_eq(&owner));
    assert!(!alias.ptr_eq(&owner));
    assert_eq!(alias.get::<IKind, _>().map(|t| t.kind.call()), Some("counted"));
    assert_eq!(owner.get::<IKind, _>().map(|t| t.kind.call()), Some("pair"));
    assert_eq!(id_of(&alias), Some(2));

    drop(owner);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(id_of(&alias), Some(2));
    drop(alias);
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}

#[test]
fn aliasing_thread_local_owner() {
    let drops = Rc::new(Cell::new(0));
    let owner: SharedPtr<(ILabel,)> = SharedPtr::boxed(Shelf {
        label: Label("left"),
        drops: drops.clone(),
    });

    let alias: SharedPtr<(ILabel,)> = {
        let Some(shelf) = owner.as_ptr() else {
            panic!("owner is not empty");
        };
        // Safety: The shelf is kept alive by `owner`.
        let label = unsafe { &shelf.cast::<Shelf>().as_ref().label };
        // Safety: `label` is a part of the object of `owner`.
        unsafe { SharedPtr::aliasing(&owner, DynPtr::from_ref(label)) }
    };

    assert_eq!(label_of(&owner), Some("shelf"));
    assert_eq!(label_of(&alias), Some("left"));
    assert_eq!(alias.use_count(), 2);

    drop(owner);
    assert_eq!(drops.get(), 0);
    drop(alias);
    assert_eq!(drops.get(), 1);
}

#[test]
#[cfg(feature = "array")]
fn shared_array() {
    use crate::ArrayDelete;

    init_tracing();
    let empty: SharedPtr<[(IId,)]> = SharedPtr::null();
    assert!(empty.is_empty());
    assert!(empty.element(0).is_none());

    let drops = Arc::new(AtomicUsize::new(0));
    let elems: Vec<_> = (0..4).map(|i| Counted::new(i, &drops)).collect();
    let unique: UniquePtr<[(IKind, IId)], ArrayDelete> = UniquePtr::from_vec(elems);
    let ptr = SharedPtr::from_unique(unique);
    assert_eq!(ptr.len(), 4);

    let copy: SharedPtr<[(IId,)]> = ptr.clone().cast();
    assert_eq!(copy.len(), 4);
    assert_eq!(ptr.use_count(), 2);

    let base = ptr.as_ptr().map_or(0, |p| p.as_ptr() as usize);
    let stride = ptr.head().map_or(0, |h| h.size_of());
    assert_eq!(stride, std::mem::size_of::<Counted>());
    for i in 0..4 {
        let Some(elem) = copy.element(i) else {
            panic!("index {i} is in bounds");
        };
        let addr = elem.as_ptr().map_or(0, |p| p.as_ptr() as usize);
        assert_eq!(addr, base + i * stride);
        assert_eq!(elem.get::<IId, _>().map(|t| t.id.bind(t.this())()), Some(i));
    }
    assert!(copy.element(4).is_none());

    let weak = copy.downgrade();
    drop(ptr);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    let Ok(upgraded) = weak.upgrade() else {
        panic!("the array is alive");
    };
    assert_eq!(upgraded.len(), 4);
    drop(upgraded);
    drop(copy);
    assert_eq!(drops.load(Ordering::SeqCst), 4);
    assert!(weak.expired());
}

#[test]
fn concurrent_promotion() {
    init_tracing();
    const THREADS: usize = 8;

    for _ in 0..32 {
        let drops = Arc::new(AtomicUsize::new(0));
        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let ptr: SharedPtr<(IKind, IId)> = SharedPtr::boxed(Counted::new(0, &drops));
        let weak = ptr.downgrade();
        let mut ptr = Some(ptr);

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let ptr = if i == 0 { ptr.take() } else { None };
                let weak = weak.clone();
                let barrier = barrier.clone();
                let drops = drops.clone();
                let successes = successes.clone();
                let failures = failures.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if i == 0 {
                        drop(ptr);
                        return;
                    }

                    match weak.upgrade() {
                        Ok(ptr) => {
                            assert_eq!(drops.load(Ordering::SeqCst), 0);
                            assert_eq!(id_of(&ptr), Some(0));
                            successes.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(Error::Expired) => {
                            failures.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().is_ok());
        }

        let successes = successes.load(Ordering::SeqCst);
        let failures = failures.load(Ordering::SeqCst);
        assert_eq!(successes + failures, THREADS - 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(weak.expired());
    }
}

#[derive(Clone, Copy)]
struct FailingAlloc;

// Safety: Never returns any memory.
unsafe impl Allocator for FailingAlloc {
    fn allocate(&self, _layout: Layout) -> crate::Result<NonNull<u8>> {
        Err(Error::Alloc)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        unreachable!("nothing is ever allocated")
    }
}

struct CountingAlloc(Arc<AtomicUsize>);

// Safety: Forwards to the global allocator.
unsafe impl Allocator for CountingAlloc {
    fn allocate(&self, layout: Layout) -> crate::Result<NonNull<u8>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        crate::Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.0.fetch_sub(1, Ordering::SeqCst);
        // Safety: Allocated by the global allocator.
        unsafe { crate::Global.deallocate(ptr, layout) }
    }
}

#[test]
fn allocation_failure() {
    let drops = Arc::new(AtomicUsize::new(0));
    let unique: UniquePtr<(IKind, IId)> = UniquePtr::boxed(Counted::new(9, &drops));
    let result = SharedPtr::try_from_unique_in(unique, FailingAlloc);
    assert_eq!(result.err(), Some(Error::Alloc));
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn control_block_outlives_object() {
    let drops = Arc::new(AtomicUsize::new(0));
    let live = Arc::new(AtomicUsize::new(0));
    let unique: UniquePtr<(IKind, IId)> = UniquePtr::boxed(Counted::new(4, &drops));
    let ptr = SharedPtr::from_unique_in(unique, CountingAlloc(live.clone()));
    assert_eq!(live.load(Ordering::SeqCst), 1);

    let weak = ptr.downgrade();
    drop(ptr);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(live.load(Ordering::SeqCst), 1);

    drop(weak);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

crate::sa::assert_impl_all!(SharedPtr<(IKind, IId)>: Send, Sync, Clone);
crate::sa::assert_impl_all!(WeakPtr<(IKind, IId)>: Send, Sync, Clone);
crate::sa::assert_not_impl_any!(SharedPtr<(ILabel,)>: Send, Sync);
