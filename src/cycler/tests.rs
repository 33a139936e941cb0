// Phase sequencing tests for the cycling program, driven by a scripted battery

use std::cell::Cell;

use super::*;
use crate::error::SolverError;
use crate::solver::ControlMode;

/// Battery whose readings are set by the test. The driver it hands back is the setpoint value,
/// so tests can see which target the program asked for.
struct ScriptedBattery {
    ocp: f64,
    last_setpoint: Cell<Option<Setpoint>>,
    fail_solver: bool,
}

impl ScriptedBattery {
    fn new() -> Self {
        Self {
            ocp: 0.0,
            last_setpoint: Cell::new(None),
            fail_solver: false,
        }
    }
}

impl BatteryModel for ScriptedBattery {
    fn apply_potential(&mut self, _driving_potential: f64) -> (f64, f64) {
        (self.ocp, 0.0)
    }

    fn ocp(&self) -> f64 {
        self.ocp
    }

    fn soc(&self) -> f64 {
        0.0
    }

    fn charge_curve(&self) -> &[f64] {
        &[]
    }

    fn driver_for(&self, setpoint: Setpoint) -> Result<f64, SolverError> {
        self.last_setpoint.set(Some(setpoint));
        if self.fail_solver {
            return Err(SolverError::DivisionByZero { observed: 0.0 });
        }
        Ok(setpoint.value)
    }
}

fn make_config() -> CyclerConfig {
    CyclerConfig {
        cathode_width: 10,
        rest_timesteps: 5,
        ..CyclerConfig::default()
    }
}

fn step(
    program: &mut CycleProgram,
    battery: &mut ScriptedBattery,
    ocp: f64,
    current: f64,
) -> Advance {
    battery.ocp = ocp;
    program
        .advance(&*battery, current, true)
        .expect("scripted battery should not fail")
}

#[test]
fn phases_follow_expected_sequence() {
    let mut program = CycleProgram::new(make_config());
    let mut battery = ScriptedBattery::new();
    let mut changes = Vec::new();

    let inputs = [
        (1.0, 15.0),   // charging, below CV
        (4.2, 15.0),   // reaches CV
        (4.0, 0.5),    // CV current has died away
        (4.0, 0.0),    // resting
        (4.0, 0.0),    // resting
        (4.0, 0.0),    // rest time is up
        (-0.1, -15.0), // reaches discharge CV
        (-0.1, -0.5),  // discharge CV current has died away
    ];
    for (ocp, current) in inputs {
        changes.extend(step(&mut program, &mut battery, ocp, current).changes);
    }

    let visited: Vec<(Phase, Phase)> = changes.iter().map(|c| (c.from, c.to)).collect();
    assert_eq!(
        visited,
        vec![
            (Phase::ChargeCc, Phase::ChargeCv),
            (Phase::ChargeCv, Phase::Rest),
            (Phase::Rest, Phase::DischargeCc),
            (Phase::DischargeCc, Phase::DischargeCv),
            (Phase::DischargeCv, Phase::ChargeCc),
        ]
    );
    assert_eq!(program.phase(), Phase::ChargeCc);
}

#[test]
fn each_phase_requests_its_setpoint() {
    let cfg = make_config();
    let expected = [
        (Phase::ChargeCc, ControlMode::Current, cfg.charge_cc),
        (Phase::ChargeCv, ControlMode::Potential, cfg.charge_cv),
        (Phase::Rest, ControlMode::Current, 0.0),
        (Phase::DischargeCc, ControlMode::Current, -cfg.charge_cc),
        (Phase::DischargeCv, ControlMode::Potential, cfg.discharge_cv),
    ];

    for (phase, mode, value) in expected {
        let mut program = CycleProgram::new(CyclerConfig {
            initial_phase: phase,
            ..cfg.clone()
        });
        // Readings that keep every phase where it is
        let mut battery = ScriptedBattery::new();
        battery.ocp = 2.0;
        let current = match phase {
            Phase::ChargeCv => 10.0,
            Phase::DischargeCv => -10.0,
            _ => 0.0,
        };
        let outcome = program.advance(&battery, current, true).unwrap();

        assert_eq!(outcome.phase, phase);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.setpoint, Setpoint { mode, value });
        assert_eq!(battery.last_setpoint.get(), Some(Setpoint { mode, value }));
        assert_eq!(program.driver_potential(), value);
    }
}

#[test]
fn transitions_do_not_consume_timesteps() {
    let mut program = CycleProgram::new(make_config());
    let mut battery = ScriptedBattery::new();

    let outcome = step(&mut program, &mut battery, 4.5, 0.0);
    // CHARGE_CC -> CHARGE_CV -> REST within the same timestep
    assert_eq!(outcome.changes.len(), 2);
    assert!(outcome.changes.iter().all(|c| c.timestep == 2));
    assert_eq!(program.timestep(), 2);
    assert_eq!(program.timesteps_in_phase(), 2);
    assert_eq!(program.phase(), Phase::Rest);
}

#[test]
fn advance_without_consuming_leaves_counters() {
    let mut program = CycleProgram::new(make_config());
    let mut battery = ScriptedBattery::new();
    battery.ocp = 4.5;

    let outcome = program.advance(&battery, 20.0, false).unwrap();
    assert_eq!(outcome.phase, Phase::ChargeCv);
    assert_eq!(program.timestep(), 1);
    assert_eq!(program.timesteps_in_phase(), 1);
}

#[test]
fn rest_holds_for_configured_timesteps() {
    let mut program = CycleProgram::new(CyclerConfig {
        initial_phase: Phase::Rest,
        rest_timesteps: 20,
        ..make_config()
    });
    let mut battery = ScriptedBattery::new();

    let mut rested = 0;
    loop {
        let outcome = step(&mut program, &mut battery, 2.0, 0.0);
        if outcome.phase != Phase::Rest {
            break;
        }
        rested += 1;
        assert!(rested <= 100, "rest never finished");
    }
    assert_eq!(rested, 20);
    assert_eq!(program.phase(), Phase::DischargeCc);
}

#[test]
fn phase_count_is_not_reset_so_late_rest_is_skipped() {
    // Known risk: the per-phase count keeps growing across phases, so a rest entered after a
    // long charge is already "over" when it starts.
    let mut program = CycleProgram::new(CyclerConfig {
        rest_timesteps: 20,
        ..make_config()
    });
    let mut battery = ScriptedBattery::new();
    for _ in 0..30 {
        step(&mut program, &mut battery, 1.0, 15.0);
    }

    let outcome = step(&mut program, &mut battery, 4.5, 0.0);
    let visited: Vec<Phase> = outcome.changes.iter().map(|c| c.to).collect();
    assert_eq!(
        visited,
        vec![Phase::ChargeCv, Phase::Rest, Phase::DischargeCc]
    );
    assert_eq!(program.timesteps_in_phase(), 32);
}

#[test]
fn resetting_phase_count_restores_full_rest() {
    let mut program = CycleProgram::new(CyclerConfig {
        rest_timesteps: 20,
        reset_phase_timesteps: true,
        ..make_config()
    });
    let mut battery = ScriptedBattery::new();
    for _ in 0..30 {
        step(&mut program, &mut battery, 1.0, 15.0);
    }

    let outcome = step(&mut program, &mut battery, 4.5, 0.0);
    assert_eq!(outcome.phase, Phase::Rest);
    assert_eq!(program.timesteps_in_phase(), 1);

    let mut rested = 0;
    while step(&mut program, &mut battery, 4.5, 0.0).phase == Phase::Rest {
        rested += 1;
        assert!(rested <= 100, "rest never finished");
    }
    assert_eq!(rested, 20);
}

#[test]
fn solver_failure_propagates() {
    let mut program = CycleProgram::new(make_config());
    let mut battery = ScriptedBattery::new();
    battery.fail_solver = true;

    let err = program.advance(&battery, 0.0, true).unwrap_err();
    assert_eq!(
        err,
        CyclerError::Solver(SolverError::DivisionByZero { observed: 0.0 })
    );
}

#[test]
fn transitions_survive_solver_failure() {
    let mut program = CycleProgram::new(make_config());
    let mut battery = ScriptedBattery::new();
    battery.ocp = 4.5;
    battery.fail_solver = true;

    assert!(program.advance(&battery, 0.0, true).is_err());
    assert_eq!(program.phase(), Phase::Rest);
    let visited: Vec<(Phase, Phase)> = program
        .last_changes()
        .iter()
        .map(|c| (c.from, c.to))
        .collect();
    assert_eq!(
        visited,
        vec![(Phase::ChargeCc, Phase::ChargeCv), (Phase::ChargeCv, Phase::Rest)]
    );

    // The next call starts a fresh list
    battery.fail_solver = false;
    program.advance(&battery, 0.0, true).unwrap();
    assert!(program.last_changes().is_empty());
}

#[test]
fn overlapping_thresholds_are_reported() {
    // Skips validation on purpose: every exit fires at once.
    let mut program = CycleProgram::new(CyclerConfig {
        charge_cv: 0.0,
        discharge_cv: 1.0,
        rest_timesteps: 0,
        ..make_config()
    });
    let mut battery = ScriptedBattery::new();
    battery.ocp = 0.5;

    let err = program.advance(&battery, 0.0, true).unwrap_err();
    assert!(matches!(err, CyclerError::TransitionLoop { .. }));
}

#[test]
fn phase_names_round_trip() {
    for phase in Phase::ALL {
        assert_eq!(phase.to_string().parse::<Phase>().unwrap(), phase);
        assert_eq!(phase.next().next().next().next().next(), phase);
    }
    assert_eq!("rest".parse::<Phase>().unwrap(), Phase::Rest);
    assert_eq!(
        "FLOAT_CHARGE".parse::<Phase>(),
        Err(CyclerError::UnrecognizedPhase("FLOAT_CHARGE".into()))
    );
}
