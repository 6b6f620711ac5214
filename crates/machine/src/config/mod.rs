//! Architecture configuration for the simulated core.
//!
//! This module defines the configuration a core is built from. It provides:
//! 1. **Defaults:** Baseline memory timing and OS-emulation settings.
//! 2. **Enums:** Presets, hazard unit kinds, and endianness, each parseable by name.
//! 3. **Aggregate:** `ArchitectureConfig`, whose equality decides whether the core
//!    has to be rebuilt after a configuration session.
//! 4. **Persistence:** Loading from and storing to a `SettingsStore` under a prefix.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::common::ConfigError;

/// Cache level configuration.
pub mod cache;
/// Key-value stores and key scoping.
pub mod store;

use cache::CacheConfig;
use store::SettingsStore;

/// Baseline configuration constants.
mod defaults {
    /// Main memory read access time in cycles.
    pub const MEM_READ: u32 = 10;
    /// Main memory write access time in cycles.
    pub const MEM_WRITE: u32 = 10;
    /// Main memory burst access time in cycles (0 = no burst model).
    pub const MEM_BURST: u32 = 0;
}

/// Store key names for the architecture configuration.
mod keys {
    pub const PIPELINED: &str = "Pipelined";
    pub const DELAY_SLOT: &str = "DelaySlot";
    pub const HAZARD_UNIT: &str = "HazardUnit";
    pub const EXEC_PROTECT: &str = "MemoryExecuteProtection";
    pub const WRITE_PROTECT: &str = "MemoryWriteProtection";
    pub const MEM_READ: &str = "MemoryAccessTimeRead";
    pub const MEM_WRITE: &str = "MemoryAccessTimeWrite";
    pub const MEM_BURST: &str = "MemoryAccessTimeBurst";
    pub const OSEMU_ENABLE: &str = "OsemuEnable";
    pub const OSEMU_KNOWN_STOP: &str = "OsemuKnownSyscallStop";
    pub const OSEMU_UNKNOWN_STOP: &str = "OsemuUnknownSyscallStop";
    pub const OSEMU_INTERRUPT_STOP: &str = "OsemuInterruptStop";
    pub const OSEMU_EXCEPTION_STOP: &str = "OsemuExceptionStop";
    pub const OSEMU_FS_ROOT: &str = "OsemuFilesystemRoot";
    pub const RESET_AT_COMPILE: &str = "ResetAtCompile";
    pub const ELF: &str = "Elf";
    pub const ENDIAN: &str = "Endian";
    pub const CACHE_PROGRAM: &str = "CacheProgram";
    pub const CACHE_DATA: &str = "CacheData";
}

/// Named configuration presets.
///
/// Presets are ordered; their ordinal is the position in [`ConfigPreset::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigPreset {
    /// Single-cycle core without caches.
    Single,
    /// Single-cycle core with program and data caches.
    SingleCache,
    /// Pipelined core without hazard unit and without caches.
    PipeNoHazard,
    /// Fully pipelined core with stall/forward hazard unit and caches.
    Pipe,
}

impl ConfigPreset {
    /// Every preset, in ordinal order.
    pub const ALL: [Self; 4] = [Self::Single, Self::SingleCache, Self::PipeNoHazard, Self::Pipe];

    /// Stable name used on the command line and in persisted sessions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::SingleCache => "single-cache",
            Self::PipeNoHazard => "pipe-no-hazard",
            Self::Pipe => "pipe",
        }
    }

    /// Position of this preset in [`ConfigPreset::ALL`].
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// Whether the preset simulates a pipelined core.
    pub const fn is_pipelined(self) -> bool {
        matches!(self, Self::PipeNoHazard | Self::Pipe)
    }

    /// Whether the preset enables program and data caches.
    pub const fn has_caches(self) -> bool {
        matches!(self, Self::SingleCache | Self::Pipe)
    }

    /// Hazard unit the preset selects.
    pub const fn hazard_unit(self) -> HazardUnit {
        match self {
            Self::Pipe => HazardUnit::StallForward,
            Self::Single | Self::SingleCache | Self::PipeNoHazard => HazardUnit::None,
        }
    }
}

impl fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigPreset {
    type Err = ConfigError;

    /// Parses a preset name (case-insensitive) or its ordinal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Ok(ordinal) = name.parse::<u32>() {
            return Self::try_from(ordinal);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl TryFrom<u32> for ConfigPreset {
    type Error = ConfigError;

    fn try_from(ordinal: u32) -> Result<Self, Self::Error> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| ConfigError::UnknownPreset(ordinal.to_string()))
    }
}

/// Pipeline hazard resolution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HazardUnit {
    /// No hazard detection; the program must schedule around hazards itself.
    #[default]
    None,
    /// Resolve hazards by stalling the pipeline.
    Stall,
    /// Resolve hazards by forwarding, stalling only when forwarding cannot help.
    StallForward,
}

impl HazardUnit {
    /// Stable name used for parsing, display, and persistence.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Stall => "stall",
            Self::StallForward => "stall-forward",
        }
    }
}

impl fmt::Display for HazardUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HazardUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "stall" => Ok(Self::Stall),
            "stall-forward" => Ok(Self::StallForward),
            _ => Err(ConfigError::UnknownHazardUnit(s.to_string())),
        }
    }
}

/// Byte order of the simulated machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endianness {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// Stable name used for parsing, display, and persistence.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endianness {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Self::Little),
            "big" | "be" => Ok(Self::Big),
            _ => Err(ConfigError::UnknownEndianness(s.to_string())),
        }
    }
}

/// Main memory access times in cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemoryTiming {
    /// Cycles for a read access.
    pub read: u32,
    /// Cycles for a write access.
    pub write: u32,
    /// Cycles for each subsequent word of a burst (0 disables burst timing).
    pub burst: u32,
}

impl Default for MemoryTiming {
    fn default() -> Self {
        Self {
            read: defaults::MEM_READ,
            write: defaults::MEM_WRITE,
            burst: defaults::MEM_BURST,
        }
    }
}

/// Operating-system emulation switches.
///
/// When enabled the core services system calls itself instead of trapping into
/// guest code. The stop flags pause the simulation on the matching event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct OsEmulation {
    /// Emulate system calls in the simulator.
    pub enable: bool,
    /// Stop after a system call the emulator implements.
    pub stop_on_known_syscall: bool,
    /// Stop on a system call the emulator does not implement.
    pub stop_on_unknown_syscall: bool,
    /// Stop when an interrupt is taken.
    pub stop_on_interrupt: bool,
    /// Stop when an exception is raised.
    pub stop_on_exception: bool,
}

impl Default for OsEmulation {
    fn default() -> Self {
        Self {
            enable: false,
            stop_on_known_syscall: false,
            stop_on_unknown_syscall: true,
            stop_on_interrupt: true,
            stop_on_exception: true,
        }
    }
}

/// Complete configuration of a simulated core.
///
/// Fields are private so that the delay-slot invariant holds: a core without
/// delay-slot emulation is never pipelined. Equality compares every field,
/// including both cache levels; any difference means the core must be rebuilt.
///
/// # Examples
///
/// ```
/// use rvsim_machine::config::{ArchitectureConfig, ConfigPreset, HazardUnit};
///
/// let mut config = ArchitectureConfig::from_preset(ConfigPreset::Pipe);
/// assert!(config.pipelined());
/// assert_eq!(config.hazard_unit(), HazardUnit::StallForward);
///
/// let before = config.clone();
/// config.set_delay_slot(false);
/// assert!(!config.pipelined());
/// assert!(config.requires_rebuild(&before));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ArchitectureConfig {
    pipelined: bool,
    delay_slot: bool,
    hazard_unit: HazardUnit,
    mem_exec_protect: bool,
    mem_write_protect: bool,
    mem_timing: MemoryTiming,
    os_emu: OsEmulation,
    osemu_fs_root: PathBuf,
    reset_at_compile: bool,
    elf_path: PathBuf,
    endianness: Endianness,
    cache_program: CacheConfig,
    cache_data: CacheConfig,
}

impl Default for ArchitectureConfig {
    /// Creates a single-cycle, uncached, little-endian configuration with delay-slot
    /// emulation on and OS emulation off.
    fn default() -> Self {
        Self {
            pipelined: false,
            delay_slot: true,
            hazard_unit: HazardUnit::None,
            mem_exec_protect: false,
            mem_write_protect: false,
            mem_timing: MemoryTiming::default(),
            os_emu: OsEmulation::default(),
            osemu_fs_root: PathBuf::new(),
            reset_at_compile: true,
            elf_path: PathBuf::new(),
            endianness: Endianness::Little,
            cache_program: CacheConfig::default(),
            cache_data: CacheConfig::default(),
        }
    }
}

impl ArchitectureConfig {
    /// Builds the configuration for `preset` on top of the defaults.
    pub fn from_preset(preset: ConfigPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Applies the preset-controlled subset of settings.
    ///
    /// Pipeline, delay slot, hazard unit, memory protection, memory timing, and
    /// both caches are replaced. The ELF path, OS emulation, endianness, and
    /// reset-at-compile flag of the current session are kept.
    pub fn apply_preset(&mut self, preset: ConfigPreset) {
        self.delay_slot = true;
        self.pipelined = preset.is_pipelined();
        self.hazard_unit = preset.hazard_unit();
        self.mem_exec_protect = false;
        self.mem_write_protect = false;
        self.mem_timing = MemoryTiming::default();
        self.cache_program.apply_preset(preset);
        self.cache_data.apply_preset(preset);
        tracing::debug!(preset = %preset, "applied configuration preset");
    }

    /// Loads a configuration stored under `prefix`.
    ///
    /// Keys that are missing, or whose value cannot be parsed, keep their
    /// `ArchitectureConfig::default()` value. Partial stores are never an error.
    pub fn from_store<S: SettingsStore + ?Sized>(store: &S, prefix: &str) -> Self {
        let mut config = Self::default();

        // Pipelined first so that a stored `DelaySlot=false` wins over it.
        if let Some(v) = store::load(store, prefix, keys::PIPELINED) {
            config.set_pipelined(v);
        }
        if let Some(v) = store::load(store, prefix, keys::DELAY_SLOT) {
            config.set_delay_slot(v);
        }
        if let Some(v) = store::load(store, prefix, keys::HAZARD_UNIT) {
            config.hazard_unit = v;
        }
        if let Some(v) = store::load(store, prefix, keys::EXEC_PROTECT) {
            config.mem_exec_protect = v;
        }
        if let Some(v) = store::load(store, prefix, keys::WRITE_PROTECT) {
            config.mem_write_protect = v;
        }
        if let Some(v) = store::load(store, prefix, keys::MEM_READ) {
            config.mem_timing.read = v;
        }
        if let Some(v) = store::load(store, prefix, keys::MEM_WRITE) {
            config.mem_timing.write = v;
        }
        if let Some(v) = store::load(store, prefix, keys::MEM_BURST) {
            config.mem_timing.burst = v;
        }
        if let Some(v) = store::load(store, prefix, keys::OSEMU_ENABLE) {
            config.os_emu.enable = v;
        }
        if let Some(v) = store::load(store, prefix, keys::OSEMU_KNOWN_STOP) {
            config.os_emu.stop_on_known_syscall = v;
        }
        if let Some(v) = store::load(store, prefix, keys::OSEMU_UNKNOWN_STOP) {
            config.os_emu.stop_on_unknown_syscall = v;
        }
        if let Some(v) = store::load(store, prefix, keys::OSEMU_INTERRUPT_STOP) {
            config.os_emu.stop_on_interrupt = v;
        }
        if let Some(v) = store::load(store, prefix, keys::OSEMU_EXCEPTION_STOP) {
            config.os_emu.stop_on_exception = v;
        }
        if let Some(v) = store::load_path(store, prefix, keys::OSEMU_FS_ROOT) {
            config.osemu_fs_root = v;
        }
        if let Some(v) = store::load(store, prefix, keys::RESET_AT_COMPILE) {
            config.reset_at_compile = v;
        }
        if let Some(v) = store::load_path(store, prefix, keys::ELF) {
            config.elf_path = v;
        }
        if let Some(v) = store::load(store, prefix, keys::ENDIAN) {
            config.endianness = v;
        }
        config.cache_program =
            CacheConfig::from_store(store, &store::scoped_key(prefix, keys::CACHE_PROGRAM));
        config.cache_data =
            CacheConfig::from_store(store, &store::scoped_key(prefix, keys::CACHE_DATA));

        tracing::debug!(prefix, "loaded architecture configuration");
        config
    }

    /// Writes every field under `prefix` using the keys `from_store` reads.
    pub fn store_to<S: SettingsStore + ?Sized>(&self, store: &mut S, prefix: &str) {
        store::save(store, prefix, keys::PIPELINED, self.pipelined);
        store::save(store, prefix, keys::DELAY_SLOT, self.delay_slot);
        store::save(store, prefix, keys::HAZARD_UNIT, self.hazard_unit);
        store::save(store, prefix, keys::EXEC_PROTECT, self.mem_exec_protect);
        store::save(store, prefix, keys::WRITE_PROTECT, self.mem_write_protect);
        store::save(store, prefix, keys::MEM_READ, self.mem_timing.read);
        store::save(store, prefix, keys::MEM_WRITE, self.mem_timing.write);
        store::save(store, prefix, keys::MEM_BURST, self.mem_timing.burst);
        store::save(store, prefix, keys::OSEMU_ENABLE, self.os_emu.enable);
        store::save(store, prefix, keys::OSEMU_KNOWN_STOP, self.os_emu.stop_on_known_syscall);
        store::save(store, prefix, keys::OSEMU_UNKNOWN_STOP, self.os_emu.stop_on_unknown_syscall);
        store::save(store, prefix, keys::OSEMU_INTERRUPT_STOP, self.os_emu.stop_on_interrupt);
        store::save(store, prefix, keys::OSEMU_EXCEPTION_STOP, self.os_emu.stop_on_exception);
        store::save_path(store, prefix, keys::OSEMU_FS_ROOT, &self.osemu_fs_root);
        store::save(store, prefix, keys::RESET_AT_COMPILE, self.reset_at_compile);
        store::save_path(store, prefix, keys::ELF, &self.elf_path);
        store::save(store, prefix, keys::ENDIAN, self.endianness);
        self.cache_program
            .store_to(store, &store::scoped_key(prefix, keys::CACHE_PROGRAM));
        self.cache_data
            .store_to(store, &store::scoped_key(prefix, keys::CACHE_DATA));
    }

    /// Exact field-wise comparison, including both cache levels.
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }

    /// Whether moving from `previous` to this configuration requires rebuilding the core.
    pub fn requires_rebuild(&self, previous: &Self) -> bool {
        !self.equals(previous)
    }

    /// Enables or disables pipelining.
    ///
    /// Enabling the pipeline also enables delay-slot emulation.
    pub const fn set_pipelined(&mut self, pipelined: bool) {
        self.pipelined = pipelined;
        if pipelined {
            self.delay_slot = true;
        }
    }

    /// Enables or disables delay-slot emulation.
    ///
    /// Disabling it also disables pipelining.
    pub const fn set_delay_slot(&mut self, delay_slot: bool) {
        self.delay_slot = delay_slot;
        if !delay_slot {
            self.pipelined = false;
        }
    }

    /// Selects the hazard unit by name (`none`, `stall`, `stall-forward`, case-insensitive).
    ///
    /// # Errors
    ///
    /// `ConfigError::UnknownHazardUnit` for any other name; the current hazard unit is kept.
    pub fn set_hazard_unit(&mut self, name: &str) -> Result<(), ConfigError> {
        self.hazard_unit = name.parse()?;
        Ok(())
    }

    /// Selects the hazard unit.
    pub const fn set_hazard_unit_kind(&mut self, unit: HazardUnit) {
        self.hazard_unit = unit;
    }

    /// Forbids instruction fetches from data memory.
    pub const fn set_memory_execute_protection(&mut self, enabled: bool) {
        self.mem_exec_protect = enabled;
    }

    /// Forbids writes to program memory.
    pub const fn set_memory_write_protection(&mut self, enabled: bool) {
        self.mem_write_protect = enabled;
    }

    /// Sets the memory read access time in cycles.
    pub const fn set_memory_access_time_read(&mut self, cycles: u32) {
        self.mem_timing.read = cycles;
    }

    /// Sets the memory write access time in cycles.
    pub const fn set_memory_access_time_write(&mut self, cycles: u32) {
        self.mem_timing.write = cycles;
    }

    /// Sets the memory burst access time in cycles.
    pub const fn set_memory_access_time_burst(&mut self, cycles: u32) {
        self.mem_timing.burst = cycles;
    }

    /// Replaces all memory access times at once.
    pub const fn set_memory_timing(&mut self, timing: MemoryTiming) {
        self.mem_timing = timing;
    }

    /// Replaces all OS-emulation switches at once.
    pub const fn set_os_emulation(&mut self, os_emu: OsEmulation) {
        self.os_emu = os_emu;
    }

    /// Enables or disables OS emulation.
    pub const fn set_osemu_enable(&mut self, enabled: bool) {
        self.os_emu.enable = enabled;
    }

    /// Stops the simulation after emulated (known) system calls.
    pub const fn set_osemu_known_syscall_stop(&mut self, stop: bool) {
        self.os_emu.stop_on_known_syscall = stop;
    }

    /// Stops the simulation on unknown system calls.
    pub const fn set_osemu_unknown_syscall_stop(&mut self, stop: bool) {
        self.os_emu.stop_on_unknown_syscall = stop;
    }

    /// Stops the simulation when an interrupt is taken.
    pub const fn set_osemu_interrupt_stop(&mut self, stop: bool) {
        self.os_emu.stop_on_interrupt = stop;
    }

    /// Stops the simulation when an exception is raised.
    pub const fn set_osemu_exception_stop(&mut self, stop: bool) {
        self.os_emu.stop_on_exception = stop;
    }

    /// Sets the host directory exposed as the emulated file system root.
    pub fn set_osemu_fs_root(&mut self, root: impl Into<PathBuf>) {
        self.osemu_fs_root = root.into();
    }

    /// Resets the machine before an internal compile or after an external build.
    pub const fn set_reset_at_compile(&mut self, reset: bool) {
        self.reset_at_compile = reset;
    }

    /// Sets the ELF image to load. Must be set before the core is built.
    pub fn set_elf(&mut self, path: impl Into<PathBuf>) {
        self.elf_path = path.into();
    }

    /// Sets the simulated byte order.
    pub const fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Selects the simulated byte order by name (`little`/`big`).
    ///
    /// # Errors
    ///
    /// `ConfigError::UnknownEndianness` for any other name; the byte order is kept.
    pub fn set_endianness_name(&mut self, name: &str) -> Result<(), ConfigError> {
        self.endianness = name.parse()?;
        Ok(())
    }

    /// Replaces the program cache configuration.
    pub const fn set_cache_program(&mut self, cache: CacheConfig) {
        self.cache_program = cache;
    }

    /// Replaces the data cache configuration.
    pub const fn set_cache_data(&mut self, cache: CacheConfig) {
        self.cache_data = cache;
    }

    /// Mutable access to the program cache configuration.
    pub const fn cache_program_mut(&mut self) -> &mut CacheConfig {
        &mut self.cache_program
    }

    /// Mutable access to the data cache configuration.
    pub const fn cache_data_mut(&mut self) -> &mut CacheConfig {
        &mut self.cache_data
    }

    /// Whether the core is pipelined.
    pub const fn pipelined(&self) -> bool {
        self.pipelined
    }

    /// Whether branch delay slots are emulated.
    pub const fn delay_slot(&self) -> bool {
        self.delay_slot
    }

    /// Selected hazard unit.
    pub const fn hazard_unit(&self) -> HazardUnit {
        self.hazard_unit
    }

    /// Whether execution from data memory is forbidden.
    pub const fn memory_execute_protection(&self) -> bool {
        self.mem_exec_protect
    }

    /// Whether writes to program memory are forbidden.
    pub const fn memory_write_protection(&self) -> bool {
        self.mem_write_protect
    }

    /// Memory access times.
    pub const fn memory_timing(&self) -> MemoryTiming {
        self.mem_timing
    }

    /// OS-emulation switches.
    pub const fn os_emulation(&self) -> OsEmulation {
        self.os_emu
    }

    /// Emulated file system root.
    pub fn osemu_fs_root(&self) -> &Path {
        &self.osemu_fs_root
    }

    /// Whether the machine is reset at compile time.
    pub const fn reset_at_compile(&self) -> bool {
        self.reset_at_compile
    }

    /// ELF image path.
    pub fn elf(&self) -> &Path {
        &self.elf_path
    }

    /// Simulated byte order.
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Program cache configuration.
    pub const fn cache_program(&self) -> &CacheConfig {
        &self.cache_program
    }

    /// Data cache configuration.
    pub const fn cache_data(&self) -> &CacheConfig {
        &self.cache_data
    }
}
