//! Config loading tests

use crate::runtime::phase::Phase;
use crate::runtime::scheduler::{FaultPolicy, SchedulerConfig};
use crate::util::config::*;

#[test]
fn test_empty_struct_uses_defaults() {
    let config = load_config_str("()").unwrap();
    assert_eq!(config.prewarm_records, SchedulerConfig::default().prewarm_records);
    assert_eq!(config.fault_policy, FaultPolicy::Suppress);
    assert!(config.warn_on_unrecognized_yield);
}

#[test]
fn test_partial_override() {
    let config = load_config_str(
        "(fault_policy: Propagate, default_phase: LateUpdate, max_pooled_conditions: 4)",
    )
    .unwrap();
    assert_eq!(config.fault_policy, FaultPolicy::Propagate);
    assert_eq!(config.default_phase, Phase::LateUpdate);
    assert_eq!(config.max_pooled_conditions, 4);
    assert_eq!(config.prewarm_conditions, SchedulerConfig::default().prewarm_conditions);
}

#[test]
fn test_parse_error() {
    let err = load_config_str("(prewarm_records: \"many\")").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_save_then_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tickflow.ron");
    let config = SchedulerConfig {
        prewarm_records: 3,
        fault_policy: FaultPolicy::Propagate,
        ..SchedulerConfig::default()
    };

    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.prewarm_records, 3);
    assert_eq!(loaded.fault_policy, FaultPolicy::Propagate);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("absent.ron")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
