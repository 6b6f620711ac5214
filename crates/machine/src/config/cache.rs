//! Cache level configuration.
//!
//! A `CacheConfig` describes the geometry and policies of one cache level (the
//! program cache or the data cache). The cache model itself lives in the core;
//! this type only carries the parameters it is built from.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::ConfigPreset;
use super::store::{self, SettingsStore};
use crate::common::ConfigError;

/// Baseline cache constants.
mod defaults {
    /// Number of sets of a default (disabled) cache.
    pub const SETS: u32 = 1;
    /// Words per block of a default cache.
    pub const BLOCK_SIZE: u32 = 1;
    /// Ways of a default cache (direct-mapped).
    pub const ASSOCIATIVITY: u32 = 1;

    /// Number of sets of the canonical preset cache.
    pub const PRESET_SETS: u32 = 4;
    /// Words per block of the canonical preset cache.
    pub const PRESET_BLOCK_SIZE: u32 = 2;
    /// Ways of the canonical preset cache.
    pub const PRESET_ASSOCIATIVITY: u32 = 2;
}

/// Store key names for a cache level.
mod keys {
    pub const ENABLED: &str = "Enabled";
    pub const SETS: &str = "Sets";
    pub const BLOCKS: &str = "Blocks";
    pub const ASSOCIATIVITY: &str = "Associativity";
    pub const REPLACEMENT: &str = "Replacement";
    pub const WRITE: &str = "Write";
}

/// Cache replacement policy.
///
/// Selects which way of a full set is evicted when a new block is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacementPolicy {
    /// Evict a randomly chosen way.
    #[default]
    Random,
    /// Evict the least recently used way.
    Lru,
    /// Evict the least frequently used way.
    Lfu,
}

impl ReplacementPolicy {
    /// Stable name used for display and persistence.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Lru => "lru",
            Self::Lfu => "lfu",
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReplacementPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" | "rand" => Ok(Self::Random),
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            _ => Err(ConfigError::UnknownReplacementPolicy(s.to_string())),
        }
    }
}

/// Cache write policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Write through to memory; a write miss does not allocate a block.
    #[default]
    WriteThroughNoAlloc,
    /// Write through to memory; a write miss allocates a block.
    WriteThroughAlloc,
    /// Write back dirty blocks on eviction.
    WriteBack,
}

impl WritePolicy {
    /// Stable name used for display and persistence.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WriteThroughNoAlloc => "write-through-no-alloc",
            Self::WriteThroughAlloc => "write-through-alloc",
            Self::WriteBack => "write-back",
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "write-through-no-alloc" => Ok(Self::WriteThroughNoAlloc),
            "write-through-alloc" => Ok(Self::WriteThroughAlloc),
            "write-back" => Ok(Self::WriteBack),
            _ => Err(ConfigError::UnknownWritePolicy(s.to_string())),
        }
    }
}

/// Configuration of a single cache level.
///
/// Equality is structural over every field; a difference in any of them means
/// the core's cache has to be rebuilt.
///
/// # Examples
///
/// ```
/// use rvsim_machine::config::cache::{CacheConfig, ReplacementPolicy, WritePolicy};
///
/// let cache = CacheConfig::preset();
/// assert!(cache.enabled());
/// assert_eq!(cache.replacement_policy(), ReplacementPolicy::Lru);
/// assert_eq!(cache.write_policy(), WritePolicy::WriteBack);
/// assert_ne!(cache, CacheConfig::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheConfig {
    enabled: bool,
    set_count: u32,
    block_size: u32,
    associativity: u32,
    replacement_policy: ReplacementPolicy,
    write_policy: WritePolicy,
}

impl Default for CacheConfig {
    /// Creates a disabled, direct-mapped single-set cache with one word per block.
    fn default() -> Self {
        Self {
            enabled: false,
            set_count: defaults::SETS,
            block_size: defaults::BLOCK_SIZE,
            associativity: defaults::ASSOCIATIVITY,
            replacement_policy: ReplacementPolicy::Random,
            write_policy: WritePolicy::WriteThroughNoAlloc,
        }
    }
}

impl CacheConfig {
    /// Returns the canonical enabled cache: 4 sets, 2 words per block, 2 ways,
    /// LRU replacement and write-back.
    ///
    /// These numbers are persisted by saved sessions and must not change.
    pub const fn preset() -> Self {
        Self {
            enabled: true,
            set_count: defaults::PRESET_SETS,
            block_size: defaults::PRESET_BLOCK_SIZE,
            associativity: defaults::PRESET_ASSOCIATIVITY,
            replacement_policy: ReplacementPolicy::Lru,
            write_policy: WritePolicy::WriteBack,
        }
    }

    /// Returns the cache configuration a machine preset uses.
    pub fn for_preset(preset: ConfigPreset) -> Self {
        if preset.has_caches() {
            Self::preset()
        } else {
            Self::default()
        }
    }

    /// Replaces this configuration with the one `preset` uses.
    pub fn apply_preset(&mut self, preset: ConfigPreset) {
        *self = Self::for_preset(preset);
    }

    /// Reads a cache configuration stored under `prefix`.
    ///
    /// Missing or unusable keys keep their `CacheConfig::default()` value.
    pub fn from_store<S: SettingsStore + ?Sized>(store: &S, prefix: &str) -> Self {
        let mut cache = Self::default();
        if let Some(enabled) = store::load(store, prefix, keys::ENABLED) {
            cache.set_enabled(enabled);
        }
        if let Some(sets) = store::load(store, prefix, keys::SETS) {
            store::keep_valid(prefix, keys::SETS, cache.set_set_count(sets));
        }
        if let Some(blocks) = store::load(store, prefix, keys::BLOCKS) {
            store::keep_valid(prefix, keys::BLOCKS, cache.set_block_size(blocks));
        }
        if let Some(ways) = store::load(store, prefix, keys::ASSOCIATIVITY) {
            store::keep_valid(prefix, keys::ASSOCIATIVITY, cache.set_associativity(ways));
        }
        if let Some(policy) = store::load(store, prefix, keys::REPLACEMENT) {
            cache.set_replacement_policy(policy);
        }
        if let Some(policy) = store::load(store, prefix, keys::WRITE) {
            cache.set_write_policy(policy);
        }
        cache
    }

    /// Writes every field under `prefix` using the keys `from_store` reads.
    pub fn store_to<S: SettingsStore + ?Sized>(&self, store: &mut S, prefix: &str) {
        store::save(store, prefix, keys::ENABLED, self.enabled);
        store::save(store, prefix, keys::SETS, self.set_count);
        store::save(store, prefix, keys::BLOCKS, self.block_size);
        store::save(store, prefix, keys::ASSOCIATIVITY, self.associativity);
        store::save(store, prefix, keys::REPLACEMENT, self.replacement_policy);
        store::save(store, prefix, keys::WRITE, self.write_policy);
    }

    /// Enables or disables this cache level.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the number of sets.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroCacheGeometry` if `sets` is zero; the value is unchanged.
    pub fn set_set_count(&mut self, sets: u32) -> Result<(), ConfigError> {
        self.set_count = non_zero("set count", sets)?;
        Ok(())
    }

    /// Sets the block size in words.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroCacheGeometry` if `words` is zero; the value is unchanged.
    pub fn set_block_size(&mut self, words: u32) -> Result<(), ConfigError> {
        self.block_size = non_zero("block size", words)?;
        Ok(())
    }

    /// Sets the degree of associativity (number of ways).
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroCacheGeometry` if `ways` is zero; the value is unchanged.
    pub fn set_associativity(&mut self, ways: u32) -> Result<(), ConfigError> {
        self.associativity = non_zero("associativity", ways)?;
        Ok(())
    }

    /// Sets the replacement policy.
    pub const fn set_replacement_policy(&mut self, policy: ReplacementPolicy) {
        self.replacement_policy = policy;
    }

    /// Sets the write policy.
    pub const fn set_write_policy(&mut self, policy: WritePolicy) {
        self.write_policy = policy;
    }

    /// Whether the cache is simulated at all.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of sets.
    pub const fn set_count(&self) -> u32 {
        self.set_count
    }

    /// Block size in words.
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of ways.
    pub const fn associativity(&self) -> u32 {
        self.associativity
    }

    /// Replacement policy.
    pub const fn replacement_policy(&self) -> ReplacementPolicy {
        self.replacement_policy
    }

    /// Write policy.
    pub const fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Total capacity in words (sets x block size x ways).
    pub const fn capacity_words(&self) -> u64 {
        self.set_count as u64 * self.block_size as u64 * self.associativity as u64
    }
}

const fn non_zero(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroCacheGeometry { field })
    } else {
        Ok(value)
    }
}
