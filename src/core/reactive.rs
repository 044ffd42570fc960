//! Observable value cells with synchronous change propagation.
//!
//! A [`Cell`] owns a value and an ordered set of observers.  Every `set` /
//! `update` replaces the value and calls each observer, in registration
//! order, before returning.  A [`Derived`] cell recomputes from one or two
//! source cells whenever any of them changes, so by the time an update call
//! returns every derived value and every observer has seen the new state.
//!
//! Cloning a cell clones the *handle*: both clones read and write the same
//! value.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Monotonic id handed to each observer of a cell.
pub type ObserverId = u64;

type Observer<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    value: T,
    next_id: ObserverId,
    /// Keyed by id, so iteration order is registration order.
    observers: BTreeMap<ObserverId, Observer<T>>,
}

// ───────────────────────────────────────── subscription ──────

/// Handle returned by `subscribe` / `watch`.
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) removes the
/// observer.  Use [`Subscription::detach`] to keep the observer registered
/// for the lifetime of the cell.
#[must_use = "dropping a Subscription removes the observer immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Leave the observer attached forever.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// ───────────────────────────────────────── readable ──────────

/// Anything a derived cell can be computed from.
pub trait Readable<T> {
    /// Clone of the current value.
    fn get(&self) -> T;

    /// Register `observer` for future changes only.
    fn watch<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static;
}

// ───────────────────────────────────────── writable cell ─────

/// A writable observable value.
pub struct Cell<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Clone + Default + 'static> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("Cell")
            .field("value", &slot.value)
            .field("observers", &slot.observers.len())
            .finish()
    }
}

impl<T: Clone + 'static> Cell<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value,
                next_id: 0,
                observers: BTreeMap::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.slot.borrow().value.clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// `f` must not write to this same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.borrow().value)
    }

    /// Replace the value and notify every observer.
    pub fn set(&self, value: T) {
        self.slot.borrow_mut().value = value;
        self.notify();
    }

    /// Mutate the value in place and notify every observer.
    ///
    /// `f` must not read or write this same cell.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.slot.borrow_mut().value);
        self.notify();
    }

    /// Register `observer`, calling it once right away with the current
    /// value and then after every change.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let observer: Observer<T> = Rc::new(observer);
        let current = self.get();
        observer(&current);
        self.attach(observer)
    }

    /// Register `observer` for future changes only.
    pub fn watch<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.attach(Rc::new(observer))
    }

    pub fn observer_count(&self) -> usize {
        self.slot.borrow().observers.len()
    }

    fn attach(&self, observer: Observer<T>) -> Subscription {
        let id = {
            let mut slot = self.slot.borrow_mut();
            let id = slot.next_id;
            slot.next_id += 1;
            slot.observers.insert(id, observer);
            id
        };
        let weak: Weak<RefCell<Slot<T>>> = Rc::downgrade(&self.slot);
        Subscription::new(move || {
            if let Some(slot) = weak.upgrade() {
                slot.borrow_mut().observers.remove(&id);
            }
        })
    }

    fn notify(&self) {
        // Release the borrow before calling out: observers are free to read
        // this cell or write to others.
        let (value, observers): (T, Vec<Observer<T>>) = {
            let slot = self.slot.borrow();
            (slot.value.clone(), slot.observers.values().cloned().collect())
        };
        for observer in observers {
            observer(&value);
        }
    }
}

impl<T: Clone + 'static> Readable<T> for Cell<T> {
    fn get(&self) -> T {
        Cell::get(self)
    }

    fn watch<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        Cell::watch(self, observer)
    }
}

// ───────────────────────────────────────── derived cell ──────

/// A read-only cell computed from other cells.
///
/// The derived value stays attached to its sources for as long as at least
/// one clone of it is alive.
pub struct Derived<T> {
    cell: Cell<T>,
    _upstream: Rc<Vec<Subscription>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            _upstream: Rc::clone(&self._upstream),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Derived").field(&self.cell).finish()
    }
}

impl<T: Clone + 'static> Derived<T> {
    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.cell.subscribe(observer)
    }

    pub fn watch<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.cell.watch(observer)
    }
}

impl<T: Clone + 'static> Readable<T> for Derived<T> {
    fn get(&self) -> T {
        self.cell.get()
    }

    fn watch<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.cell.watch(observer)
    }
}

/// Derive a cell from a single source.
pub fn derived<A, U, S, F>(source: &S, compute: F) -> Derived<U>
where
    A: Clone + 'static,
    U: Clone + 'static,
    S: Readable<A>,
    F: Fn(&A) -> U + 'static,
{
    let cell = Cell::new(compute(&source.get()));
    let target = cell.clone();
    let upstream = source.watch(move |a| target.set(compute(a)));
    Derived {
        cell,
        _upstream: Rc::new(vec![upstream]),
    }
}

/// Derive a cell from two sources; it recomputes when either changes.
pub fn derived2<A, B, U, SA, SB, F>(a: &SA, b: &SB, compute: F) -> Derived<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + 'static,
    SA: Readable<A> + Clone + 'static,
    SB: Readable<B> + Clone + 'static,
    F: Fn(&A, &B) -> U + 'static,
{
    let compute = Rc::new(compute);
    let cell = Cell::new(compute(&a.get(), &b.get()));

    let from_a = {
        let target = cell.clone();
        let other = b.clone();
        let compute = Rc::clone(&compute);
        a.watch(move |av| target.set(compute(av, &other.get())))
    };
    let from_b = {
        let target = cell.clone();
        let other = a.clone();
        let compute = Rc::clone(&compute);
        b.watch(move |bv| target.set(compute(&other.get(), bv)))
    };

    Derived {
        cell,
        _upstream: Rc::new(vec![from_a, from_b]),
    }
}
