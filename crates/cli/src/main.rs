//! rvsim machine configuration CLI.
//!
//! This binary works with the configuration a simulated core is built from. It performs:
//! 1. **Inspection:** List presets and print a configuration (text or JSON).
//! 2. **Persistence:** Save a preset to a JSON settings file under a prefix.
//! 3. **Rebuild check:** Compare two stored configurations the way the front-end
//!    does before deciding to rebuild the core.
//! 4. **CSR replay:** Feed a CSR event trace through the highlight tracker.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use rvsim_machine::common::StoreError;
use rvsim_machine::config::cache::CacheConfig;
use rvsim_machine::config::store::JsonFileStore;
use rvsim_machine::config::{ArchitectureConfig, ConfigPreset};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod trace;

#[derive(Parser, Debug)]
#[command(
    name = "rvsim-config",
    author,
    version,
    about = "rvsim machine configuration tool",
    long_about = "Inspect presets, persist configurations, check whether a configuration change requires a core rebuild, and replay CSR event traces.\n\nExamples:\n  rvsim-config presets\n  rvsim-config show --preset pipe --json\n  rvsim-config save --preset single-cache --store session.json --prefix machine\n  rvsim-config diff --store session.json --prefix new --against old\n  rvsim-config replay csr.trace"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available presets.
    Presets,

    /// Print a configuration.
    Show {
        /// Preset to apply (name or ordinal). Applied on top of a loaded store.
        #[arg(short, long)]
        preset: Option<ConfigPreset>,

        /// JSON settings file to load from.
        #[arg(long)]
        store: Option<PathBuf>,

        /// Key prefix inside the settings file.
        #[arg(long, default_value = "")]
        prefix: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Save a preset to a JSON settings file.
    Save {
        /// Preset to save (name or ordinal).
        #[arg(short, long)]
        preset: ConfigPreset,

        /// JSON settings file to write.
        #[arg(long)]
        store: PathBuf,

        /// Key prefix inside the settings file.
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Report whether switching between two stored configurations requires a rebuild.
    Diff {
        /// JSON settings file holding both configurations.
        #[arg(long)]
        store: PathBuf,

        /// Prefix of the new configuration.
        #[arg(long)]
        prefix: String,

        /// Prefix of the configuration currently in use.
        #[arg(long)]
        against: String,
    },

    /// Replay a CSR event trace through the highlight tracker.
    Replay {
        /// Trace file (`w <csr> <value>`, `r <csr> <value>`, `t`).
        trace: PathBuf,

        /// Include untouched registers in the final table.
        #[arg(long)]
        all: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Trace(#[from] trace::TraceError),

    #[error("encoding JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("writing output: {0}")]
    Output(#[from] io::Error),
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    if let Err(e) = run(cli.command, &mut stdout) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run<W: Write>(command: Commands, out: &mut W) -> Result<(), CliError> {
    match command {
        Commands::Presets => cmd_presets(out),
        Commands::Show {
            preset,
            store,
            prefix,
            json,
        } => cmd_show(out, preset, store.as_deref(), &prefix, json),
        Commands::Save {
            preset,
            store,
            prefix,
        } => cmd_save(out, preset, &store, &prefix),
        Commands::Diff {
            store,
            prefix,
            against,
        } => cmd_diff(out, &store, &prefix, &against).map(|_| ()),
        Commands::Replay { trace: path, all } => {
            let events = trace::load(&path)?;
            let summary = trace::replay(&events, out, all)?;
            writeln!(
                out,
                "{} writes, {} reads, {} cycles",
                summary.writes, summary.reads, summary.cycles
            )?;
            Ok(())
        }
    }
}

fn cmd_presets<W: Write>(out: &mut W) -> Result<(), CliError> {
    for preset in ConfigPreset::ALL {
        writeln!(out, "{}  {}", preset.ordinal(), preset)?;
    }
    Ok(())
}

/// Loads from `store` if given, then applies `preset` if given; falls back to defaults.
fn cmd_show<W: Write>(
    out: &mut W,
    preset: Option<ConfigPreset>,
    store: Option<&Path>,
    prefix: &str,
    json: bool,
) -> Result<(), CliError> {
    let mut config = match store {
        Some(path) => ArchitectureConfig::from_store(&JsonFileStore::open(path)?, prefix),
        None => ArchitectureConfig::default(),
    };
    if let Some(preset) = preset {
        config.apply_preset(preset);
    }

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
    } else {
        print_config(out, &config)?;
    }
    Ok(())
}

fn cmd_save<W: Write>(
    out: &mut W,
    preset: ConfigPreset,
    store: &Path,
    prefix: &str,
) -> Result<(), CliError> {
    let mut file = JsonFileStore::open(store)?;
    ArchitectureConfig::from_preset(preset).store_to(&mut file, prefix);
    file.save()?;
    tracing::info!(preset = %preset, path = %file.path().display(), "saved configuration");
    writeln!(out, "Saved preset {preset} to {}", file.path().display())?;
    Ok(())
}

/// Returns whether moving from `against` to `prefix` requires a rebuild.
fn cmd_diff<W: Write>(
    out: &mut W,
    store: &Path,
    prefix: &str,
    against: &str,
) -> Result<bool, CliError> {
    let file = JsonFileStore::open(store)?;
    let next = ArchitectureConfig::from_store(&file, prefix);
    let current = ArchitectureConfig::from_store(&file, against);
    let rebuild = next.requires_rebuild(&current);
    if rebuild {
        writeln!(out, "Configurations differ: core rebuild required")?;
    } else {
        writeln!(out, "Configurations are identical: no rebuild needed")?;
    }
    Ok(rebuild)
}

fn field<W: Write>(out: &mut W, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(out, "  {label:<14} {value}")
}

fn print_cache<W: Write>(out: &mut W, label: &str, cache: &CacheConfig) -> io::Result<()> {
    if cache.enabled() {
        field(
            out,
            label,
            format_args!(
                "{} sets x {} words x {} ways, {}, {}",
                cache.set_count(),
                cache.block_size(),
                cache.associativity(),
                cache.replacement_policy(),
                cache.write_policy()
            ),
        )
    } else {
        field(out, label, "disabled")
    }
}

fn print_config<W: Write>(out: &mut W, config: &ArchitectureConfig) -> io::Result<()> {
    let timing = config.memory_timing();
    let os = config.os_emulation();
    writeln!(out, "Core:")?;
    field(out, "Pipelined", config.pipelined())?;
    field(out, "Delay slot", config.delay_slot())?;
    field(out, "Hazard unit", config.hazard_unit())?;
    field(out, "Endianness", config.endianness())?;
    writeln!(out, "Memory:")?;
    field(
        out,
        "Access time",
        format_args!(
            "read {} / write {} / burst {} cycles",
            timing.read, timing.write, timing.burst
        ),
    )?;
    field(
        out,
        "Protection",
        format_args!(
            "exec {} / write {}",
            config.memory_execute_protection(),
            config.memory_write_protection()
        ),
    )?;
    writeln!(out, "Caches:")?;
    print_cache(out, "Program", config.cache_program())?;
    print_cache(out, "Data", config.cache_data())?;
    writeln!(out, "OS emulation:")?;
    field(out, "Enabled", os.enable)?;
    field(
        out,
        "Stop on",
        format_args!(
            "known {} / unknown {} / interrupt {} / exception {}",
            os.stop_on_known_syscall,
            os.stop_on_unknown_syscall,
            os.stop_on_interrupt,
            os.stop_on_exception
        ),
    )?;
    field(out, "FS root", config.osemu_fs_root().display())?;
    writeln!(out, "Session:")?;
    field(out, "ELF", config.elf().display())?;
    field(out, "Reset at build", config.reset_at_compile())
}
