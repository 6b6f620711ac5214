//! CSR highlight tracking.
//!
//! Every valid CSR id owns a slot holding the last value seen for it and how it
//! was touched during the current epoch (the interval between two clock ticks):
//!
//! ```text
//!   None ──read──▶ ReadOnly ──write──▶ Written ◀──write/read── Written
//!    │                                    ▲
//!    └──────────────write─────────────────┘
//!   any ──tick──▶ None   (value kept)
//! ```
//!
//! A write always wins over a read in the same epoch; only a tick clears it.
//! Reads never update the stored value.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::common::InvalidRegister;
use crate::csr::events::{CsrEventBus, CsrObserver, Subscription};
use crate::csr::{CSR_REGS_CNT, CsrId};

/// How a register was touched during the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightKind {
    /// Untouched since the last tick.
    #[default]
    None,
    /// Written at least once since the last tick.
    Written,
    /// Read, but not written, since the last tick.
    ReadOnly,
}

/// State of one register slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegisterHighlightState {
    /// Last written or seeded value; `None` until one is known.
    pub last_value: Option<u64>,
    /// Highlight for the current epoch.
    pub kind: HighlightKind,
}

impl RegisterHighlightState {
    /// Display text of the value: `format_value` of it, or empty when unset.
    pub fn text(&self) -> String {
        self.last_value.map(format_value).unwrap_or_default()
    }
}

/// Formats a register value as lowercase hex with a `0x` prefix and no padding.
///
/// ```
/// use rvsim_machine::monitor::format_value;
///
/// assert_eq!(format_value(0), "0x0");
/// assert_eq!(format_value(255), "0xff");
/// ```
pub fn format_value(value: u64) -> String {
    format!("{value:#x}")
}

/// One line of a register view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightRow {
    /// Register id.
    pub id: CsrId,
    /// Register name from the CSR table.
    pub name: String,
    /// Formatted value, empty when unset.
    pub text: String,
    /// Highlight for the current epoch.
    pub kind: HighlightKind,
}

/// Slot storage; index 0 is allocated but never handed out.
#[derive(Debug)]
struct HighlightTable {
    slots: Vec<RegisterHighlightState>,
    dirty: bool,
}

impl HighlightTable {
    fn new(count: usize) -> Self {
        Self {
            slots: vec![RegisterHighlightState::default(); count.max(1)],
            dirty: false,
        }
    }

    fn check(&self, id: CsrId) -> Result<usize, InvalidRegister> {
        let index = id.index();
        if index == 0 || index >= self.slots.len() {
            return Err(InvalidRegister {
                id: index,
                count: self.slots.len(),
            });
        }
        Ok(index)
    }

    fn get(&self, id: CsrId) -> Result<RegisterHighlightState, InvalidRegister> {
        let index = self.check(id)?;
        Ok(self.slots[index])
    }

    fn write(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        let index = self.check(id)?;
        let slot = &mut self.slots[index];
        slot.last_value = Some(value);
        slot.kind = HighlightKind::Written;
        self.dirty = true;
        Ok(())
    }

    fn read(&mut self, id: CsrId) -> Result<(), InvalidRegister> {
        let index = self.check(id)?;
        let slot = &mut self.slots[index];
        if slot.kind == HighlightKind::None {
            slot.kind = HighlightKind::ReadOnly;
        }
        self.dirty = true;
        Ok(())
    }

    fn seed(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        let index = self.check(id)?;
        self.slots[index].last_value = Some(value);
        Ok(())
    }

    fn clear_highlights(&mut self) {
        if !self.dirty {
            return;
        }
        for slot in self.slots.iter_mut().skip(1) {
            slot.kind = HighlightKind::None;
        }
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.slots.fill(RegisterHighlightState::default());
        self.dirty = false;
    }
}

impl CsrObserver for HighlightTable {
    fn csr_written(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        self.write(id, value)
    }

    fn csr_read(&mut self, id: CsrId, _value: u64) -> Result<(), InvalidRegister> {
        self.read(id)
    }

    fn tick(&mut self) {
        self.clear_highlights();
    }
}

/// Tracks which CSRs were written or read since the last clock tick.
///
/// The tracker can be driven directly through `on_write`/`on_read`/`on_tick`, or
/// bound to a core's [`CsrEventBus`]. At most one binding is active; binding again
/// replaces it, and dropping the tracker unsubscribes.
///
/// # Examples
///
/// ```
/// use rvsim_machine::csr::CsrId;
/// use rvsim_machine::csr::events::CsrEventBus;
/// use rvsim_machine::monitor::{HighlightKind, RegisterHighlightTracker};
///
/// let bus = CsrEventBus::new();
/// let mut tracker = RegisterHighlightTracker::new();
/// tracker.bind(&bus);
///
/// bus.emit_write(CsrId::MEPC, 0xdead).unwrap();
/// let state = tracker.query(CsrId::MEPC).unwrap();
/// assert_eq!(state.last_value, Some(0xdead));
/// assert_eq!(state.kind, HighlightKind::Written);
///
/// bus.emit_tick();
/// assert_eq!(tracker.query(CsrId::MEPC).unwrap().kind, HighlightKind::None);
/// ```
#[derive(Debug)]
pub struct RegisterHighlightTracker {
    table: Rc<RefCell<HighlightTable>>,
    binding: Option<Subscription>,
}

impl Default for RegisterHighlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterHighlightTracker {
    /// Creates an unbound tracker sized for the CSR table.
    pub fn new() -> Self {
        Self::with_register_count(CSR_REGS_CNT)
    }

    /// Creates an unbound tracker with `count` slots, including reserved slot 0.
    pub fn with_register_count(count: usize) -> Self {
        Self {
            table: Rc::new(RefCell::new(HighlightTable::new(count))),
            binding: None,
        }
    }

    /// Number of slots, including reserved slot 0.
    pub fn register_count(&self) -> usize {
        self.table.borrow().slots.len()
    }

    /// Subscribes to `bus`, dropping any previous binding first.
    pub fn bind(&mut self, bus: &Rc<CsrEventBus>) {
        self.unbind();
        let observer: Rc<RefCell<dyn CsrObserver>> = self.table.clone();
        self.binding = Some(bus.subscribe(Rc::downgrade(&observer)));
        tracing::debug!("highlight tracker bound");
    }

    /// Drops the active binding, if any.
    pub fn unbind(&mut self) {
        if self.binding.take().is_some() {
            tracing::debug!("highlight tracker unbound");
        }
    }

    /// Whether a binding is active.
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether any slot was touched since the last tick.
    pub fn is_dirty(&self) -> bool {
        self.table.borrow().dirty
    }

    /// Records a write: stores `value` and marks the register `Written`.
    ///
    /// # Errors
    ///
    /// `InvalidRegister` if `id` is `0` or beyond the register count.
    pub fn on_write(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        self.table.borrow_mut().write(id, value)
    }

    /// Records a read: marks an untouched register `ReadOnly`. The value is not stored.
    ///
    /// # Errors
    ///
    /// `InvalidRegister` if `id` is `0` or beyond the register count.
    pub fn on_read(&mut self, id: CsrId, _value: u64) -> Result<(), InvalidRegister> {
        self.table.borrow_mut().read(id)
    }

    /// Ends the epoch: clears every highlight, keeping values.
    ///
    /// Does nothing if no register was touched since the previous tick.
    pub fn on_tick(&mut self) {
        self.table.borrow_mut().clear_highlights();
    }

    /// Records the current value of a register without highlighting it.
    ///
    /// # Errors
    ///
    /// `InvalidRegister` if `id` is `0` or beyond the register count.
    pub fn seed(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister> {
        self.table.borrow_mut().seed(id, value)
    }

    /// Returns the state of a register.
    ///
    /// # Errors
    ///
    /// `InvalidRegister` if `id` is `0` or beyond the register count.
    pub fn query(&self, id: CsrId) -> Result<RegisterHighlightState, InvalidRegister> {
        self.table.borrow().get(id)
    }

    /// Blanks every slot: values unset, highlights cleared. No events are emitted.
    pub fn reset(&mut self) {
        self.table.borrow_mut().reset();
        tracing::debug!("highlight tracker reset");
    }

    /// Display rows for every valid id, in id order.
    pub fn rows(&self) -> Vec<HighlightRow> {
        let table = self.table.borrow();
        table
            .slots
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, slot)| {
                let id = CsrId::new(index);
                HighlightRow {
                    id,
                    name: id.to_string(),
                    text: slot.text(),
                    kind: slot.kind,
                }
            })
            .collect()
    }
}
