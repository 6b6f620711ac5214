//! # Configuration Tests
//!
//! Presets, equality (the rebuild gate), the delay-slot invariant, and the
//! name-based setters.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvsim_machine::common::ConfigError;
use rvsim_machine::config::cache::CacheConfig;
use rvsim_machine::config::{ArchitectureConfig, ConfigPreset, HazardUnit};

use crate::common::single_field_edits;

#[test]
fn test_default_equals_default() {
    assert_eq!(ArchitectureConfig::default(), ArchitectureConfig::default());
    assert!(ArchitectureConfig::default().equals(&ArchitectureConfig::default()));
}

#[test]
fn test_any_single_field_edit_breaks_equality() {
    let base = ArchitectureConfig::default();
    for (label, apply) in single_field_edits() {
        let mut edited = base.clone();
        apply(&mut edited);
        assert!(!edited.equals(&base), "editing {label} left the config equal");
        assert!(edited.requires_rebuild(&base), "editing {label} did not require a rebuild");
    }
}

#[test]
fn test_nested_cache_difference_requires_rebuild() {
    let base = ArchitectureConfig::from_preset(ConfigPreset::Pipe);
    let mut edited = base.clone();
    edited.cache_data_mut().set_associativity(4).unwrap();
    assert!(edited.requires_rebuild(&base));
    assert!(!base.requires_rebuild(&base.clone()));
}

#[rstest]
#[case(ConfigPreset::Single, false, HazardUnit::None, false)]
#[case(ConfigPreset::SingleCache, false, HazardUnit::None, true)]
#[case(ConfigPreset::PipeNoHazard, true, HazardUnit::None, false)]
#[case(ConfigPreset::Pipe, true, HazardUnit::StallForward, true)]
fn test_preset_table(
    #[case] preset: ConfigPreset,
    #[case] pipelined: bool,
    #[case] hazard_unit: HazardUnit,
    #[case] cached: bool,
) {
    let config = ArchitectureConfig::from_preset(preset);
    let expected_cache = if cached {
        CacheConfig::preset()
    } else {
        CacheConfig::default()
    };

    assert_eq!(config.pipelined(), pipelined);
    assert!(config.delay_slot());
    assert_eq!(config.hazard_unit(), hazard_unit);
    assert_eq!(config.cache_program(), &expected_cache);
    assert_eq!(config.cache_data(), &expected_cache);
}

#[test]
fn test_presets_are_deterministic_and_distinct() {
    for a in ConfigPreset::ALL {
        assert_eq!(ArchitectureConfig::from_preset(a), ArchitectureConfig::from_preset(a));
        for b in ConfigPreset::ALL.into_iter().filter(|b| *b != a) {
            assert!(ArchitectureConfig::from_preset(a).requires_rebuild(&ArchitectureConfig::from_preset(b)));
        }
    }
}

#[test]
fn test_single_preset_matches_default() {
    assert_eq!(
        ArchitectureConfig::from_preset(ConfigPreset::Single),
        ArchitectureConfig::default()
    );
}

#[test]
fn test_disabling_delay_slot_forces_pipeline_off() {
    let mut config = ArchitectureConfig::from_preset(ConfigPreset::Pipe);
    assert!(config.pipelined());
    config.set_delay_slot(false);
    assert!(!config.pipelined());
    assert!(!config.delay_slot());
}

#[test]
fn test_delay_slot_invariant_under_any_setter_order() {
    let mut config = ArchitectureConfig::default();
    for (pipelined, delay_slot) in [(true, false), (false, true), (true, true), (false, false)] {
        config.set_pipelined(pipelined);
        config.set_delay_slot(delay_slot);
        assert!(config.delay_slot() || !config.pipelined());
        config.set_delay_slot(delay_slot);
        config.set_pipelined(pipelined);
        assert!(config.delay_slot() || !config.pipelined());
    }
}

#[rstest]
#[case("none", HazardUnit::None)]
#[case("stall", HazardUnit::Stall)]
#[case("stall-forward", HazardUnit::StallForward)]
#[case("STALL-Forward", HazardUnit::StallForward)]
#[case("  Stall ", HazardUnit::Stall)]
fn test_set_hazard_unit_by_name(#[case] name: &str, #[case] expected: HazardUnit) {
    let mut config = ArchitectureConfig::from_preset(ConfigPreset::Pipe);
    config.set_hazard_unit(name).unwrap();
    assert_eq!(config.hazard_unit(), expected);
}

#[test]
fn test_bogus_hazard_unit_leaves_value() {
    let mut config = ArchitectureConfig::from_preset(ConfigPreset::Pipe);
    let before = config.clone();

    let err = config.set_hazard_unit("bogus").unwrap_err();

    assert_eq!(err, ConfigError::UnknownHazardUnit("bogus".to_string()));
    assert_eq!(config.hazard_unit(), HazardUnit::StallForward);
    assert_eq!(config, before);
}

#[test]
fn test_preset_names_round_trip() {
    for preset in ConfigPreset::ALL {
        assert_eq!(preset.name().parse::<ConfigPreset>(), Ok(preset));
        assert_eq!(ConfigPreset::try_from(preset.ordinal()), Ok(preset));
    }
}

#[test]
fn test_serialized_names_match_display() {
    let config = ArchitectureConfig::from_preset(ConfigPreset::Pipe);
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["hazard_unit"], "stall-forward");
    assert_eq!(json["endianness"], "little");
    assert_eq!(json["cache_data"]["replacement_policy"], "lru");
    assert_eq!(json["cache_data"]["write_policy"], "write-back");
}
