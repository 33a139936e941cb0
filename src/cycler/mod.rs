// cycler/mod.rs
// CC/CV cycling program: sequences charge, rest and discharge phases and picks each
// timestep's driving potential.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::battery::BatteryModel;
use crate::config::CyclerConfig;
use crate::error::CyclerError;
use crate::solver::Setpoint;

#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "CHARGE_CC")]
    ChargeCc,
    #[serde(rename = "CHARGE_CV")]
    ChargeCv,
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "DISCHARGE_CC")]
    DischargeCc,
    #[serde(rename = "DISCHARGE_CV")]
    DischargeCv,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::ChargeCc,
        Phase::ChargeCv,
        Phase::Rest,
        Phase::DischargeCc,
        Phase::DischargeCv,
    ];

    pub fn display(&self) -> &'static str {
        match self {
            Phase::ChargeCc => "CHARGE_CC",
            Phase::ChargeCv => "CHARGE_CV",
            Phase::Rest => "REST",
            Phase::DischargeCc => "DISCHARGE_CC",
            Phase::DischargeCv => "DISCHARGE_CV",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Phase::ChargeCc => "Constant-current charge",
            Phase::ChargeCv => "Constant-voltage charge",
            Phase::Rest => "Rest at zero current",
            Phase::DischargeCc => "Constant-current discharge",
            Phase::DischargeCv => "Constant-voltage discharge",
        }
    }

    /// Phase entered when this one finishes. The program has no terminal phase.
    pub fn next(&self) -> Phase {
        match self {
            Phase::ChargeCc => Phase::ChargeCv,
            Phase::ChargeCv => Phase::Rest,
            Phase::Rest => Phase::DischargeCc,
            Phase::DischargeCc => Phase::DischargeCv,
            Phase::DischargeCv => Phase::ChargeCc,
        }
    }

    /// Target held while the phase is active.
    pub fn setpoint(&self, cfg: &CyclerConfig) -> Setpoint {
        match self {
            Phase::ChargeCc => Setpoint::current(cfg.charge_cc),
            Phase::ChargeCv => Setpoint::potential(cfg.charge_cv),
            Phase::Rest => Setpoint::current(0.0),
            Phase::DischargeCc => Setpoint::current(-cfg.charge_cc),
            Phase::DischargeCv => Setpoint::potential(cfg.discharge_cv),
        }
    }

    /// Whether the phase is finished given the latest readings and the per-phase count.
    pub fn is_complete(
        &self,
        cfg: &CyclerConfig,
        ocp: f64,
        current: f64,
        timesteps_in_phase: u64,
    ) -> bool {
        match self {
            Phase::ChargeCc => ocp >= cfg.charge_cv,
            Phase::ChargeCv => current < cfg.zero_current_threshold,
            Phase::Rest => timesteps_in_phase > cfg.rest_timesteps,
            Phase::DischargeCc => ocp <= cfg.discharge_cv,
            Phase::DischargeCv => current > -cfg.zero_current_threshold,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for Phase {
    type Err = CyclerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Phase::ALL
            .iter()
            .copied()
            .find(|phase| phase.display().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CyclerError::UnrecognizedPhase(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub timestep: u64,
    pub from: Phase,
    pub to: Phase,
}

/// Outcome of one call to [`CycleProgram::advance`].
#[derive(Clone, Debug, PartialEq)]
pub struct Advance {
    pub phase: Phase,
    pub setpoint: Setpoint,
    pub driver_potential: f64,
    /// Transitions taken before the target was chosen, in order.
    pub changes: Vec<PhaseChange>,
}

#[derive(Clone, Debug)]
pub struct CycleProgram {
    config: CyclerConfig,
    phase: Phase,
    timestep: u64,
    timesteps_in_phase: u64,
    driver_potential: f64,
    last_changes: Vec<PhaseChange>,
}

impl CycleProgram {
    pub fn new(config: CyclerConfig) -> Self {
        Self {
            phase: config.initial_phase,
            timestep: 1,
            timesteps_in_phase: 1,
            driver_potential: config.initial_driver_potential,
            last_changes: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CyclerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn timesteps_in_phase(&self) -> u64 {
        self.timesteps_in_phase
    }

    pub fn driver_potential(&self) -> f64 {
        self.driver_potential
    }

    /// Transitions committed by the latest `advance`, kept even when that call failed.
    pub fn last_changes(&self) -> &[PhaseChange] {
        &self.last_changes
    }

    /// Advance the program given the battery's state after the last timestep.
    ///
    /// With `consume_timestep` the counters tick first. Finished phases are then left one after
    /// another without consuming more time, and the phase that remains picks the next driving
    /// potential through the battery's solver.
    ///
    /// The rest check for the phase active on entry sees the per-phase count from before the
    /// tick; after a transition it sees the live count.
    ///
    /// Transitions are committed before the solver runs, so on error they stay in effect and
    /// can be read back through [`CycleProgram::last_changes`].
    pub fn advance<B: BatteryModel + ?Sized>(
        &mut self,
        battery: &B,
        current: f64,
        consume_timestep: bool,
    ) -> Result<Advance, CyclerError> {
        let mut elapsed = self.timesteps_in_phase;
        if consume_timestep {
            self.timestep += 1;
            self.timesteps_in_phase += 1;
        }

        let ocp = battery.ocp();
        self.last_changes.clear();
        while self.phase.is_complete(&self.config, ocp, current, elapsed) {
            if self.last_changes.len() >= Phase::ALL.len() {
                return Err(CyclerError::TransitionLoop { phase: self.phase });
            }
            let next = self.phase.next();
            log::info!(
                "timestep {}: {} -> {} (ocp {:.4}, current {:.4})",
                self.timestep,
                self.phase,
                next,
                ocp,
                current
            );
            self.last_changes.push(PhaseChange {
                timestep: self.timestep,
                from: self.phase,
                to: next,
            });
            self.phase = next;
            if self.config.reset_phase_timesteps {
                self.timesteps_in_phase = 1;
            }
            elapsed = self.timesteps_in_phase;
        }

        let setpoint = self.phase.setpoint(&self.config);
        self.driver_potential = battery.driver_for(setpoint)?;

        Ok(Advance {
            phase: self.phase,
            setpoint,
            driver_potential: self.driver_potential,
            changes: self.last_changes.clone(),
        })
    }
}
