//! Control and Status Register namespace.
//!
//! This module defines how the front-end names CSRs. It provides:
//! 1. **Identifiers:** `CsrId`, a dense index into the register views, with id `0`
//!    reserved to mean "no register".
//! 2. **Name table:** The architectural name and 12-bit address of every modeled CSR.
//! 3. **Events:** The bus the core emits CSR writes, reads, and clock ticks on.

use std::fmt;

use serde::Serialize;

/// CSR event bus and observer trait.
pub mod events;

/// Name and address of a modeled CSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrDescriptor {
    /// Architectural name, lowercase.
    pub name: &'static str,
    /// 12-bit CSR address.
    pub address: u16,
}

const fn csr(name: &'static str, address: u16) -> CsrDescriptor {
    CsrDescriptor { name, address }
}

/// Descriptors of ids `1..CSR_REGS_CNT`, in id order.
const CSR_TABLE: [CsrDescriptor; CSR_REGS_CNT - 1] = [
    csr("mvendorid", 0xF11),
    csr("marchid", 0xF12),
    csr("mimpid", 0xF13),
    csr("mhartid", 0xF14),
    csr("mstatus", 0x300),
    csr("misa", 0x301),
    csr("medeleg", 0x302),
    csr("mideleg", 0x303),
    csr("mie", 0x304),
    csr("mtvec", 0x305),
    csr("mcounteren", 0x306),
    csr("mscratch", 0x340),
    csr("mepc", 0x341),
    csr("mcause", 0x342),
    csr("mtval", 0x343),
    csr("mip", 0x344),
    csr("mcycle", 0xB00),
    csr("minstret", 0xB02),
    csr("sstatus", 0x100),
    csr("sie", 0x104),
    csr("stvec", 0x105),
    csr("scounteren", 0x106),
    csr("sscratch", 0x140),
    csr("sepc", 0x141),
    csr("scause", 0x142),
    csr("stval", 0x143),
    csr("sip", 0x144),
    csr("satp", 0x180),
    csr("cycle", 0xC00),
    csr("time", 0xC01),
    csr("instret", 0xC02),
];

/// Number of CSR id slots, including the reserved id `0`.
pub const CSR_REGS_CNT: usize = 32;

/// Dense CSR identifier.
///
/// Valid ids are `1..CSR_REGS_CNT`. Id `0` is reserved and means "no register";
/// every accessor in this crate rejects it. A `CsrId` may hold any raw value so
/// that events from a miswired source can be reported instead of silently mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CsrId(usize);

impl CsrId {
    /// The reserved "no register" id.
    pub const NONE: Self = Self(0);
    /// Machine vendor ID.
    pub const MVENDORID: Self = Self(1);
    /// Machine architecture ID.
    pub const MARCHID: Self = Self(2);
    /// Machine implementation ID.
    pub const MIMPID: Self = Self(3);
    /// Hardware thread ID.
    pub const MHARTID: Self = Self(4);
    /// Machine status.
    pub const MSTATUS: Self = Self(5);
    /// Machine ISA.
    pub const MISA: Self = Self(6);
    /// Machine exception delegation.
    pub const MEDELEG: Self = Self(7);
    /// Machine interrupt delegation.
    pub const MIDELEG: Self = Self(8);
    /// Machine interrupt enable.
    pub const MIE: Self = Self(9);
    /// Machine trap vector base.
    pub const MTVEC: Self = Self(10);
    /// Machine counter enable.
    pub const MCOUNTEREN: Self = Self(11);
    /// Machine scratch.
    pub const MSCRATCH: Self = Self(12);
    /// Machine exception PC.
    pub const MEPC: Self = Self(13);
    /// Machine trap cause.
    pub const MCAUSE: Self = Self(14);
    /// Machine trap value.
    pub const MTVAL: Self = Self(15);
    /// Machine interrupt pending.
    pub const MIP: Self = Self(16);
    /// Machine cycle counter.
    pub const MCYCLE: Self = Self(17);
    /// Machine instructions-retired counter.
    pub const MINSTRET: Self = Self(18);
    /// Supervisor status.
    pub const SSTATUS: Self = Self(19);
    /// Supervisor interrupt enable.
    pub const SIE: Self = Self(20);
    /// Supervisor trap vector base.
    pub const STVEC: Self = Self(21);
    /// Supervisor counter enable.
    pub const SCOUNTEREN: Self = Self(22);
    /// Supervisor scratch.
    pub const SSCRATCH: Self = Self(23);
    /// Supervisor exception PC.
    pub const SEPC: Self = Self(24);
    /// Supervisor trap cause.
    pub const SCAUSE: Self = Self(25);
    /// Supervisor trap value.
    pub const STVAL: Self = Self(26);
    /// Supervisor interrupt pending.
    pub const SIP: Self = Self(27);
    /// Supervisor address translation and protection.
    pub const SATP: Self = Self(28);
    /// User cycle counter.
    pub const CYCLE: Self = Self(29);
    /// User real-time counter.
    pub const TIME: Self = Self(30);
    /// User instructions-retired counter.
    pub const INSTRET: Self = Self(31);

    /// Wraps a raw id without validating it.
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw index of this id.
    pub const fn index(self) -> usize {
        self.0
    }

    /// Whether the id names a modeled register (`1..CSR_REGS_CNT`).
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 < CSR_REGS_CNT
    }

    /// Descriptor of this register, `None` for the reserved or out-of-range ids.
    pub fn descriptor(self) -> Option<&'static CsrDescriptor> {
        self.0.checked_sub(1).and_then(|i| CSR_TABLE.get(i))
    }

    /// Architectural name of this register.
    pub fn name(self) -> Option<&'static str> {
        self.descriptor().map(|d| d.name)
    }

    /// Resolves a 12-bit CSR address.
    pub fn from_address(address: u16) -> Option<Self> {
        CSR_TABLE
            .iter()
            .position(|d| d.address == address)
            .map(|i| Self(i + 1))
    }

    /// Resolves a register name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        CSR_TABLE
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name.trim()))
            .map(|i| Self(i + 1))
    }

    /// Iterates over every valid id in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..CSR_REGS_CNT).map(Self)
    }
}

impl fmt::Display for CsrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "csr#{}", self.0),
        }
    }
}
