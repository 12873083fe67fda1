//! End-to-end scenarios against a test-double collaborator, exercising the
//! registration protocol the way an embedding runtime would drive it.

use std::cell::{Cell, RefCell};
use weaktable::{Collaborator, DestroyQuery, DisguisedPtr, ReferrerAddr, WeakTable};

#[derive(Default)]
struct FakeRuntime {
    destroying: RefCell<Vec<DisguisedPtr<usize>>>,
    unanswerable: RefCell<Vec<DisguisedPtr<usize>>>,
    error_hooks: Cell<u32>,
}

impl FakeRuntime {
    fn mark_destroying(&self, referent: DisguisedPtr<usize>) {
        self.destroying.borrow_mut().push(referent);
    }

    fn mark_unanswerable(&self, referent: DisguisedPtr<usize>) {
        self.unanswerable.borrow_mut().push(referent);
    }
}

impl Collaborator<usize> for FakeRuntime {
    fn is_tagged_pointer(&self, _referent: DisguisedPtr<usize>) -> bool {
        false
    }
    fn is_destroying(&self, referent: DisguisedPtr<usize>) -> DestroyQuery {
        if self.unanswerable.borrow().contains(&referent) {
            DestroyQuery::Unanswerable
        } else if self.destroying.borrow().contains(&referent) {
            DestroyQuery::Destroying
        } else {
            DestroyQuery::Alive
        }
    }
    fn error_hook(&self) {
        self.error_hooks.set(self.error_hooks.get() + 1);
    }
    fn fatal(&self, message: &str) -> ! {
        panic!("fatal: {}", message);
    }
    fn inform(&self, _message: &str) {}
}

fn referent(x: &usize) -> DisguisedPtr<usize> {
    DisguisedPtr::disguise(x as *const usize)
}

fn referrer(slot: &mut *const usize) -> ReferrerAddr<usize> {
    DisguisedPtr::disguise(slot as *mut *const usize as *const *const usize)
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn scenario_simple_register_clear() {
    init();
    let a = 1usize;
    let mut x: *const usize = referent(&a).undisguise();
    let mut y: *const usize = referent(&a).undisguise();
    let mut table = WeakTable::new(FakeRuntime::default());

    table.register(referent(&a), referrer(&mut x), true);
    table.register(referent(&a), referrer(&mut y), true);
    assert!(table.is_registered(referent(&a)));

    table.clear(referent(&a));
    assert!(x.is_null());
    assert!(y.is_null());
    assert!(!table.is_registered(referent(&a)));
}

#[test]
fn scenario_inline_overflow() {
    let a = 1usize;
    let mut slots: Vec<*const usize> = vec![referent(&a).undisguise(); 5];
    let mut table = WeakTable::new(FakeRuntime::default());
    for slot in slots.iter_mut() {
        table.register(referent(&a), referrer(slot), true);
    }
    assert!(table.is_registered(referent(&a)));

    table.clear(referent(&a));
    for slot in &slots {
        assert!(slot.is_null());
    }
}

#[test]
fn scenario_table_grow() {
    let objs: Vec<usize> = (0..49).collect();
    let mut table = WeakTable::new(FakeRuntime::default());
    for o in &objs {
        let mut s = referent(o).undisguise();
        table.register(referent(o), referrer(&mut s), true);
    }
    for o in &objs {
        assert!(table.is_registered(referent(o)));
    }
}

#[test]
fn scenario_table_shrink() {
    let objs: Vec<usize> = (0..700).collect();
    let mut table = WeakTable::new(FakeRuntime::default());
    for o in &objs {
        let mut s = referent(o).undisguise();
        table.register(referent(o), referrer(&mut s), true);
    }
    for o in &objs[..670] {
        table.clear(referent(o));
    }
    for o in &objs[670..] {
        assert!(table.is_registered(referent(o)));
    }
    for o in &objs[..670] {
        assert!(!table.is_registered(referent(o)));
    }
}

#[test]
fn scenario_dying_referent_registration() {
    let a = 1usize;
    let runtime = FakeRuntime::default();
    runtime.mark_destroying(referent(&a));
    let mut table = WeakTable::new(runtime);

    let mut x: *const usize = referent(&a).undisguise();
    assert_eq!(table.register(referent(&a), referrer(&mut x), false), None);
    assert!(!table.is_registered(referent(&a)));
}

#[test]
#[should_panic(expected = "fatal")]
fn scenario_dying_referent_registration_aborts() {
    let a = 1usize;
    let runtime = FakeRuntime::default();
    runtime.mark_destroying(referent(&a));
    let mut table = WeakTable::new(runtime);

    let mut x: *const usize = referent(&a).undisguise();
    table.register(referent(&a), referrer(&mut x), true);
}

#[test]
fn scenario_unanswerable_registration_never_aborts() {
    let a = 1usize;
    let runtime = FakeRuntime::default();
    runtime.mark_unanswerable(referent(&a));
    let mut table = WeakTable::new(runtime);

    // crash_if_dying = true would abort on a dying referent, but an
    // unanswerable query must fail quietly regardless.
    let mut x: *const usize = referent(&a).undisguise();
    assert_eq!(table.register(referent(&a), referrer(&mut x), true), None);
    assert!(!table.is_registered(referent(&a)));
}

#[test]
fn scenario_clear_skips_already_null_slot() {
    let a = 1usize;
    let mut x: *const usize = core::ptr::null();
    let runtime = FakeRuntime::default();
    let mut table = WeakTable::new(runtime);
    table.register(referent(&a), referrer(&mut x), true);

    table.clear(referent(&a));
    assert!(x.is_null());
}

#[test]
fn scenario_unregister_unknown() {
    let a = 1usize;
    let mut x: *const usize = referent(&a).undisguise();
    let mut z: *const usize = referent(&a).undisguise();
    let mut table = WeakTable::new(FakeRuntime::default());
    table.register(referent(&a), referrer(&mut x), true);

    table.unregister(referent(&a), referrer(&mut z));
    assert!(table.is_registered(referent(&a)));
}

#[test]
fn register_unregister_round_trip_restores_state() {
    let a = 1usize;
    let mut x: *const usize = referent(&a).undisguise();
    let mut y: *const usize = referent(&a).undisguise();
    let mut table = WeakTable::new(FakeRuntime::default());

    table.register(referent(&a), referrer(&mut x), true);
    table.register(referent(&a), referrer(&mut y), true);
    table.unregister(referent(&a), referrer(&mut y));
    assert!(table.is_registered(referent(&a)));

    table.unregister(referent(&a), referrer(&mut x));
    assert!(!table.is_registered(referent(&a)));
}

#[test]
fn randomized_register_unregister_matches_model() {
    use rand::prelude::*;
    use std::collections::HashSet;

    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let a = 1usize;
    let mut table = WeakTable::new(FakeRuntime::default());
    // Backing storage for up to 64 concurrently-registered referrers;
    // indices double as stable referrer identities for the model set.
    let mut slots: Vec<*const usize> = vec![referent(&a).undisguise(); 64];
    let mut model: HashSet<usize> = HashSet::new();

    for _ in 0..2000 {
        let index = rng.gen_range(0, slots.len());
        if model.contains(&index) {
            table.unregister(referent(&a), referrer(&mut slots[index]));
            model.remove(&index);
        } else {
            table.register(referent(&a), referrer(&mut slots[index]), true);
            model.insert(index);
        }
        assert_eq!(table.is_registered(referent(&a)), !model.is_empty());
    }
}
