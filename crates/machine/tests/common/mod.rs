//! Shared helpers for the integration tests.

/// Mock implementations of the crate's observer traits.
pub mod mocks;

use rvsim_machine::config::cache::{ReplacementPolicy, WritePolicy};
use rvsim_machine::config::{ArchitectureConfig, Endianness, HazardUnit};

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A single-field edit of a configuration, labeled for assertion messages.
pub type ConfigEdit = (&'static str, fn(&mut ArchitectureConfig));

fn edit(label: &'static str, apply: fn(&mut ArchitectureConfig)) -> ConfigEdit {
    (label, apply)
}

/// One edit per field of `ArchitectureConfig`, each moving it away from its default.
pub fn single_field_edits() -> Vec<ConfigEdit> {
    vec![
        edit("pipelined", |c| c.set_pipelined(true)),
        edit("delay_slot", |c| c.set_delay_slot(false)),
        edit("hazard_unit", |c| c.set_hazard_unit_kind(HazardUnit::Stall)),
        edit("exec_protect", |c| c.set_memory_execute_protection(true)),
        edit("write_protect", |c| c.set_memory_write_protection(true)),
        edit("mem_read", |c| c.set_memory_access_time_read(11)),
        edit("mem_write", |c| c.set_memory_access_time_write(12)),
        edit("mem_burst", |c| c.set_memory_access_time_burst(1)),
        edit("osemu_enable", |c| c.set_osemu_enable(true)),
        edit("osemu_known_stop", |c| c.set_osemu_known_syscall_stop(true)),
        edit("osemu_unknown_stop", |c| c.set_osemu_unknown_syscall_stop(false)),
        edit("osemu_interrupt_stop", |c| c.set_osemu_interrupt_stop(false)),
        edit("osemu_exception_stop", |c| c.set_osemu_exception_stop(false)),
        edit("osemu_fs_root", |c| c.set_osemu_fs_root("/srv/guest")),
        edit("reset_at_compile", |c| c.set_reset_at_compile(false)),
        edit("elf", |c| c.set_elf("build/hello.elf")),
        edit("endianness", |c| c.set_endianness(Endianness::Big)),
        edit("program_enabled", |c| c.cache_program_mut().set_enabled(true)),
        edit("program_sets", |c| {
            c.cache_program_mut().set_set_count(8).unwrap();
        }),
        edit("program_blocks", |c| {
            c.cache_program_mut().set_block_size(4).unwrap();
        }),
        edit("program_ways", |c| {
            c.cache_program_mut().set_associativity(4).unwrap();
        }),
        edit("program_replacement", |c| {
            c.cache_program_mut()
                .set_replacement_policy(ReplacementPolicy::Lfu);
        }),
        edit("program_write", |c| {
            c.cache_program_mut()
                .set_write_policy(WritePolicy::WriteThroughAlloc);
        }),
        edit("data_enabled", |c| c.cache_data_mut().set_enabled(true)),
        edit("data_sets", |c| {
            c.cache_data_mut().set_set_count(16).unwrap();
        }),
        edit("data_blocks", |c| {
            c.cache_data_mut().set_block_size(8).unwrap();
        }),
        edit("data_ways", |c| {
            c.cache_data_mut().set_associativity(2).unwrap();
        }),
        edit("data_replacement", |c| {
            c.cache_data_mut()
                .set_replacement_policy(ReplacementPolicy::Lru);
        }),
        edit("data_write", |c| {
            c.cache_data_mut().set_write_policy(WritePolicy::WriteBack);
        }),
    ]
}
