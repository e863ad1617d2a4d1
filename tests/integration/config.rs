//! Configuration files feeding a scheduler

use tickflow::util::config::{load_config, save_config};
use tickflow::{FaultPolicy, ManualClock, Phase, Scheduler, SchedulerConfig};

#[test]
fn test_scheduler_from_saved_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scheduler.ron");
    let config = SchedulerConfig {
        prewarm_records: 8,
        prewarm_conditions: 2,
        fault_policy: FaultPolicy::Propagate,
        default_phase: Phase::PhysicsUpdate,
        ..SchedulerConfig::default()
    };
    save_config(&path, &config).unwrap();

    let loaded = load_config(&path).unwrap();
    let scheduler = Scheduler::with_config(ManualClock::new(), loaded);
    assert_eq!(scheduler.pooled_records(), 8);
    assert_eq!(scheduler.pooled_conditions(), 2);
    assert_eq!(scheduler.config().default_phase, Phase::PhysicsUpdate);
}
