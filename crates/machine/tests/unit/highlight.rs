//! # Highlight Tracker Tests
//!
//! The three-state epoch machine: write dominates read, tick is the only reset
//! edge, consecutive ticks are no-ops, and the reserved id is rejected
//! everywhere. Property tests cover arbitrary ids, values, and event orders.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rvsim_machine::common::InvalidRegister;
use rvsim_machine::csr::events::CsrEventBus;
use rvsim_machine::csr::{CSR_REGS_CNT, CsrId};
use rvsim_machine::monitor::{
    HighlightKind, RegisterHighlightState, RegisterHighlightTracker, format_value,
};

fn state(value: Option<u64>, kind: HighlightKind) -> RegisterHighlightState {
    RegisterHighlightState {
        last_value: value,
        kind,
    }
}

#[test]
fn test_end_to_end_write_tick() {
    let bus = CsrEventBus::new();
    let mut tracker = RegisterHighlightTracker::new();
    tracker.bind(&bus);
    let id = CsrId::new(3);

    bus.emit_write(id, 0xDEAD).unwrap();
    assert_eq!(tracker.query(id).unwrap(), state(Some(0xDEAD), HighlightKind::Written));

    bus.emit_tick();
    assert_eq!(tracker.query(id).unwrap(), state(Some(0xDEAD), HighlightKind::None));
}

#[test]
fn test_read_on_fresh_slot_marks_read_only_without_value() {
    let mut tracker = RegisterHighlightTracker::new();
    tracker.on_read(CsrId::MHARTID, 0x1234).unwrap();
    assert_eq!(
        tracker.query(CsrId::MHARTID).unwrap(),
        state(None, HighlightKind::ReadOnly)
    );
}

#[test]
fn test_read_keeps_seeded_value() {
    let mut tracker = RegisterHighlightTracker::new();
    tracker.seed(CsrId::MHARTID, 0).unwrap();
    tracker.on_read(CsrId::MHARTID, 0).unwrap();
    assert_eq!(
        tracker.query(CsrId::MHARTID).unwrap(),
        state(Some(0), HighlightKind::ReadOnly)
    );
}

#[test]
fn test_second_tick_is_noop() {
    let mut tracker = RegisterHighlightTracker::new();
    tracker.on_write(CsrId::MSCRATCH, 1).unwrap();
    tracker.on_read(CsrId::MEPC, 2).unwrap();
    tracker.on_tick();
    let after_first = tracker.rows();

    tracker.on_tick();

    assert_eq!(tracker.rows(), after_first);
    assert!(!tracker.is_dirty());
}

#[test]
fn test_reset_blanks_every_slot() {
    let mut tracker = RegisterHighlightTracker::new();
    tracker.on_write(CsrId::SEPC, 0x80).unwrap();
    tracker.on_read(CsrId::STVAL, 0).unwrap();

    tracker.reset();

    for row in tracker.rows() {
        assert_eq!(row.text, "", "{} kept a value", row.name);
        assert_eq!(row.kind, HighlightKind::None);
    }
    assert!(!tracker.is_dirty());
}

#[test]
fn test_reset_does_not_unbind() {
    let bus = CsrEventBus::new();
    let mut tracker = RegisterHighlightTracker::new();
    tracker.bind(&bus);
    tracker.reset();
    bus.emit_write(CsrId::SATP, 8).unwrap();
    assert_eq!(tracker.query(CsrId::SATP).unwrap().kind, HighlightKind::Written);
}

#[test]
fn test_unbind_stops_updates() {
    let bus = CsrEventBus::new();
    let mut tracker = RegisterHighlightTracker::new();
    tracker.bind(&bus);
    tracker.unbind();
    assert!(!tracker.is_bound());

    bus.emit_write(CsrId::SATP, 8).unwrap();
    assert_eq!(tracker.query(CsrId::SATP).unwrap(), state(None, HighlightKind::None));
}

#[test]
fn test_invalid_ids_rejected_by_every_accessor() {
    let mut tracker = RegisterHighlightTracker::new();
    for raw in [0, CSR_REGS_CNT, CSR_REGS_CNT + 100] {
        let id = CsrId::new(raw);
        let err = InvalidRegister {
            id: raw,
            count: CSR_REGS_CNT,
        };
        assert_eq!(tracker.on_write(id, 1), Err(err));
        assert_eq!(tracker.on_read(id, 1), Err(err));
        assert_eq!(tracker.seed(id, 1), Err(err));
        assert_eq!(tracker.query(id), Err(err));
    }
}

#[test]
fn test_smaller_namespace() {
    let mut tracker = RegisterHighlightTracker::with_register_count(4);
    assert_eq!(tracker.register_count(), 4);
    tracker.on_write(CsrId::new(3), 1).unwrap();
    assert!(tracker.on_write(CsrId::new(4), 1).is_err());
    assert_eq!(tracker.rows().len(), 3);
}

#[test]
fn test_display_format() {
    assert_eq!(format_value(0), "0x0");
    assert_eq!(format_value(255), "0xff");
    assert_eq!(format_value(0xDEAD_BEEF), "0xdeadbeef");
    assert_eq!(format_value(u64::MAX), "0xffffffffffffffff");
}

#[test]
fn test_rows_report_highlights() {
    let mut tracker = RegisterHighlightTracker::new();
    tracker.on_write(CsrId::MCAUSE, 0xb).unwrap();
    tracker.on_read(CsrId::MTVAL, 0).unwrap();

    let rows = tracker.rows();
    let mcause = &rows[CsrId::MCAUSE.index() - 1];
    let mtval = &rows[CsrId::MTVAL.index() - 1];

    assert_eq!(mcause.name, "mcause");
    assert_eq!(mcause.text, "0xb");
    assert_eq!(mcause.kind, HighlightKind::Written);
    assert_eq!(mtval.kind, HighlightKind::ReadOnly);
    assert_eq!(mtval.text, "");
}

#[derive(Debug, Clone)]
enum Event {
    Write(usize, u64),
    Read(usize, u64),
    Tick,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (1..CSR_REGS_CNT, any::<u64>()).prop_map(|(id, v)| Event::Write(id, v)),
        (1..CSR_REGS_CNT, any::<u64>()).prop_map(|(id, v)| Event::Read(id, v)),
        Just(Event::Tick),
    ]
}

proptest! {
    #[test]
    fn prop_write_then_query(id in 1..CSR_REGS_CNT, v in any::<u64>()) {
        let mut tracker = RegisterHighlightTracker::new();
        let id = CsrId::new(id);
        tracker.on_write(id, v).unwrap();
        prop_assert_eq!(tracker.query(id).unwrap(), state(Some(v), HighlightKind::Written));
    }

    #[test]
    fn prop_read_never_downgrades_write(id in 1..CSR_REGS_CNT, v1 in any::<u64>(), v2 in any::<u64>()) {
        let mut tracker = RegisterHighlightTracker::new();
        let id = CsrId::new(id);
        tracker.on_write(id, v1).unwrap();
        tracker.on_read(id, v2).unwrap();
        prop_assert_eq!(tracker.query(id).unwrap(), state(Some(v1), HighlightKind::Written));
    }

    #[test]
    fn prop_tick_clears_kinds_and_keeps_values(events in prop::collection::vec(event(), 0..64)) {
        let mut tracker = RegisterHighlightTracker::new();
        for event in &events {
            match *event {
                Event::Write(id, v) => tracker.on_write(CsrId::new(id), v).unwrap(),
                Event::Read(id, v) => tracker.on_read(CsrId::new(id), v).unwrap(),
                Event::Tick => tracker.on_tick(),
            }
        }
        let before = tracker.rows();
        tracker.on_tick();
        let after = tracker.rows();

        for (b, a) in before.iter().zip(&after) {
            prop_assert_eq!(&b.text, &a.text);
            prop_assert_eq!(a.kind, HighlightKind::None);
        }
        tracker.on_tick();
        prop_assert_eq!(tracker.rows(), after);
    }

    #[test]
    fn prop_matches_reference_model(events in prop::collection::vec(event(), 0..128)) {
        let mut tracker = RegisterHighlightTracker::new();
        let mut model = vec![state(None, HighlightKind::None); CSR_REGS_CNT];
        for event in &events {
            match *event {
                Event::Write(id, v) => {
                    tracker.on_write(CsrId::new(id), v).unwrap();
                    model[id] = state(Some(v), HighlightKind::Written);
                }
                Event::Read(id, v) => {
                    tracker.on_read(CsrId::new(id), v).unwrap();
                    if model[id].kind == HighlightKind::None {
                        model[id].kind = HighlightKind::ReadOnly;
                    }
                }
                Event::Tick => {
                    tracker.on_tick();
                    for slot in &mut model {
                        slot.kind = HighlightKind::None;
                    }
                }
            }
        }
        for id in CsrId::all() {
            prop_assert_eq!(tracker.query(id).unwrap(), model[id.index()]);
        }
    }
}
