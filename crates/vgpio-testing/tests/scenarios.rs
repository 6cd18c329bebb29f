//! End-to-end scenario runs on the virtual bench

use std::io::Write;
use tokio::task::LocalSet;
use vgpio_sim::SimError;
use vgpio_sync::{SignalError, TimeoutError, VgpioConfig};
use vgpio_testing::{
    builtins, execute, run_scenario, BenchConfig, FirmwareModel, Scenario, ScenarioError, Step,
    StepOutcome, ERROR_CODE,
};

fn custom(name: &str, firmware: FirmwareModel, steps: Vec<Step>) -> Scenario {
    Scenario {
        name: name.to_string(),
        description: String::new(),
        bench: BenchConfig {
            cycle_limit: 50_000,
            ..Default::default()
        },
        vgpio: VgpioConfig::default(),
        firmware,
        steps,
    }
}

#[test]
fn test_builtin_scenarios_pass() {
    for (name, scenario) in builtins() {
        let report = run_scenario(&scenario).unwrap();
        assert!(report.passed(), "{name} failed:\n{report}");
        assert_eq!(report.records.len(), scenario.steps.len());

        let (last_edge, last_value) = *scenario.firmware.timeline().last().unwrap();
        assert_eq!(report.final_value, last_value, "{name}");
        assert!(report.edges >= last_edge, "{name}");
        assert_eq!(report.observer_fault, None, "{name}");
    }
}

#[test]
fn test_missed_milestone_fails_scenario() {
    let scenario = custom(
        "stalled",
        FirmwareModel::boot(100).then(0, 1),
        vec![
            Step::wait(1, "ready"),
            Step::Wait {
                value: 2,
                timeout_cycles: Some(500),
                label: Some("never written".to_string()),
            },
        ],
    );

    match run_scenario(&scenario) {
        Err(ScenarioError::Milestone {
            step, label, source, ..
        }) => {
            assert_eq!(step, 1);
            assert_eq!(label, "never written");
            assert_eq!(
                source,
                TimeoutError {
                    expected: 2,
                    observed: 1,
                    cycles: 500
                }
            );
        }
        other => panic!("expected milestone timeout, got {other:?}"),
    }
}

#[test]
fn test_wait_without_budget_uses_scenario_default() {
    let mut scenario = custom(
        "late-boot",
        FirmwareModel::boot(80).then(0, 1),
        vec![Step::wait(1, "ready")],
    );
    scenario.vgpio = VgpioConfig::default().with_default_timeout(50);

    match run_scenario(&scenario) {
        Err(ScenarioError::Milestone { source, .. }) => assert_eq!(
            source,
            TimeoutError {
                expected: 1,
                observed: 0,
                cycles: 50
            }
        ),
        other => panic!("expected milestone timeout, got {other:?}"),
    }

    scenario.vgpio = VgpioConfig::default();
    assert!(run_scenario(&scenario).unwrap().passed());
}

#[test]
fn test_unknown_bus_pattern_faults_observer_only() {
    let scenario = custom(
        "la-reconfigure",
        FirmwareModel::boot(100).then(0, 1).then(200, 2).force(150, "x"),
        vec![Step::wait(1, "ready"), Step::wait(2, "done")],
    );

    let report = run_scenario(&scenario).unwrap();
    assert!(report.passed());
    assert_eq!(report.final_value, 2);
    assert_eq!(report.edges, 300);
    assert_eq!(report.sim_time_ns, 300 * 25);
    assert!(matches!(
        report.observer_fault,
        Some(SignalError::Unresolved { unknown: 128, .. })
    ));
}

#[test]
fn test_error_code_fails_scenario() {
    let scenario = custom(
        "self-check",
        FirmwareModel::boot(100).then(0, 1).then(50, ERROR_CODE),
        vec![
            Step::wait(1, "ready"),
            Step::settle(100),
            Step::reject_error_code(),
        ],
    );

    match run_scenario(&scenario) {
        Err(ScenarioError::ErrorCode { step, value, .. }) => {
            assert_eq!(step, 2);
            assert_eq!(value, ERROR_CODE);
        }
        other => panic!("expected error code, got {other:?}"),
    }
}

#[test]
fn test_out_of_range_sample_is_recorded() {
    let scenario = custom(
        "adc-overrange",
        FirmwareModel::boot(100).then(0, 1).then(10, 0x900).then(100, 2),
        vec![
            Step::wait(1, "ready"),
            Step::settle(20),
            Step::Sample {
                mask: 0xFFF,
                min: 0,
                max: 0x7FF,
                label: Some("half-scale".to_string()),
            },
            Step::wait(2, "done"),
        ],
    );

    let report = run_scenario(&scenario).unwrap();
    assert!(!report.passed());
    assert_eq!(report.records.len(), 4);

    let failed: Vec<_> = report.failed_checks().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 2);
    assert_eq!(
        failed[0].outcome,
        StepOutcome::Sampled {
            value: 0x900,
            in_range: false
        }
    );
    assert_eq!(report.final_value, 2);
}

#[test]
fn test_poll_gives_up_quietly() {
    let scenario = custom(
        "slow-transfer",
        FirmwareModel::boot(100).then(0, 1).then(5_000, 3),
        vec![
            Step::wait(1, "ready"),
            Step::PollUntil {
                at_least: 3,
                max_cycles: 1_000,
            },
        ],
    );

    let report = run_scenario(&scenario).unwrap();
    assert!(report.passed());
    assert_eq!(
        report.records[1].outcome,
        StepOutcome::Polled {
            value: 1,
            reached: false
        }
    );
    assert_eq!(report.records[1].edge, 1_100);
}

#[test]
fn test_cycle_limit_aborts_scenario() {
    let mut scenario = custom(
        "hung",
        FirmwareModel::boot(100).then(0, 1),
        vec![Step::wait(1, "ready"), Step::wait(2, "never written")],
    );
    scenario.bench.cycle_limit = 1_000;

    match run_scenario(&scenario) {
        Err(ScenarioError::Simulation {
            source: SimError::CycleLimit { limit },
            ..
        }) => assert_eq!(limit, 1_000),
        other => panic!("expected cycle limit, got {other:?}"),
    }
}

#[test]
fn test_scenario_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name = "handshake"

[bench]
cycle_limit = 10000

[firmware]
boot_cycles = 200
writes = [
    {{ after_cycles = 0, value = 1 }},
    {{ after_cycles = 300, value = 2 }},
]

[[steps]]
step = "wait"
value = 1

[[steps]]
step = "wait"
value = 2
timeout_cycles = 1000
label = "handshake complete"

[[steps]]
step = "reject"
value = 0xEEEE
"#
    )
    .unwrap();

    let scenario = Scenario::from_path(file.path()).unwrap();
    let report = run_scenario(&scenario).unwrap();
    assert!(report.passed());
    assert_eq!(report.records[1].label, "handshake complete");
    assert_eq!(report.records[1].edge, 500);
    assert_eq!(report.final_value, 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Scenario::from_path(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ScenarioError::Io(_))));
}

#[tokio::test(start_paused = true)]
async fn test_execute_on_existing_local_set() {
    LocalSet::new()
        .run_until(async {
            let scenario = custom(
                "inline",
                FirmwareModel::boot(10).then(0, 1).then(20, 2),
                vec![
                    Step::wait(1, "ready"),
                    Step::wait(2, "done"),
                    Step::settle(5),
                ],
            );
            let report = execute(&scenario).await.unwrap();
            assert_eq!(report.records[1].edge, 30);
            assert_eq!(report.edges, 35);
            assert_eq!(report.observer_updates, 2);
        })
        .await;
}
