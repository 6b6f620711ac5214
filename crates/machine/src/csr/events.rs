//! CSR event bus.
//!
//! The core announces CSR activity on a `CsrEventBus`: a write or read of a
//! register, and the end of every simulated clock cycle. Views subscribe with a
//! `CsrObserver` and stay subscribed for as long as they hold the returned
//! `Subscription`.
//!
//! Delivery is synchronous and single-threaded. Events reach observers in the
//! order they are emitted, and observers are visited in subscription order.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::CsrId;
use crate::common::InvalidRegister;

/// Receiver of CSR events.
pub trait CsrObserver {
    /// A register was written with `value`.
    ///
    /// # Errors
    ///
    /// `InvalidRegister` if `id` is outside the register namespace.
    fn csr_written(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister>;

    /// A register was read, yielding `value`.
    ///
    /// # Errors
    ///
    /// `InvalidRegister` if `id` is outside the register namespace.
    fn csr_read(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister>;

    /// One simulated clock cycle completed.
    fn tick(&mut self);
}

type ObserverSlot = (u64, Weak<RefCell<dyn CsrObserver>>);

/// Subscriber list for the CSR events of one core.
#[derive(Default)]
pub struct CsrEventBus {
    next_id: Cell<u64>,
    observers: RefCell<Vec<ObserverSlot>>,
}

impl std::fmt::Debug for CsrEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl CsrEventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Subscribes `observer` to every event emitted from now on.
    ///
    /// The bus holds the observer weakly. Dropping the returned guard
    /// unsubscribes it.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(self: &Rc<Self>, observer: Weak<RefCell<dyn CsrObserver>>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.observers.borrow_mut().push((id, observer));
        tracing::debug!(subscription = id, "csr observer subscribed");
        Subscription {
            bus: Rc::downgrade(self),
            id,
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|(_, o)| o.strong_count() > 0)
            .count()
    }

    /// Announces a register write.
    ///
    /// # Errors
    ///
    /// The first `InvalidRegister` an observer reports. Later observers do not see the event.
    pub fn emit_write(&self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        tracing::trace!(csr = %id, value, "csr write");
        for observer in self.live_observers() {
            observer.borrow_mut().csr_written(id, value)?;
        }
        Ok(())
    }

    /// Announces a register read.
    ///
    /// # Errors
    ///
    /// The first `InvalidRegister` an observer reports. Later observers do not see the event.
    pub fn emit_read(&self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        tracing::trace!(csr = %id, value, "csr read");
        for observer in self.live_observers() {
            observer.borrow_mut().csr_read(id, value)?;
        }
        Ok(())
    }

    /// Announces the end of a clock cycle.
    pub fn emit_tick(&self) {
        for observer in self.live_observers() {
            observer.borrow_mut().tick();
        }
    }

    /// Snapshot of live observers, so observers may subscribe or unsubscribe while
    /// an event is being delivered. Dead entries are pruned.
    fn live_observers(&self) -> Vec<Rc<RefCell<dyn CsrObserver>>> {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|(_, o)| o.strong_count() > 0);
        observers.iter().filter_map(|(_, o)| o.upgrade()).collect()
    }

    fn unsubscribe(&self, id: u64) {
        self.observers.borrow_mut().retain(|(sid, _)| *sid != id);
        tracing::debug!(subscription = id, "csr observer unsubscribed");
    }
}

/// Guard for an active subscription; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<CsrEventBus>,
    id: u64,
}

impl Subscription {
    /// Whether the bus this subscription belongs to still exists.
    pub fn is_connected(&self) -> bool {
        self.bus.strong_count() > 0
    }

    /// Whether this subscription is attached to `bus`.
    pub fn is_on(&self, bus: &Rc<CsrEventBus>) -> bool {
        std::ptr::eq(self.bus.as_ptr(), Rc::as_ptr(bus))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}
