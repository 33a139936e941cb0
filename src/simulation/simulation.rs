// Contains the simulation struct that ties the battery, the cycling program and the metric
// history together. One call to `advance_one_timestep` is one full tick:
// apply driver -> diffuse -> read metrics -> advance program.

use serde::{Deserialize, Serialize};

use super::history::MetricsHistory;
use crate::battery::{BatteryModel, DiffusionBattery};
use crate::config::{CyclerConfig, CURVE_INTERVAL};
use crate::cycler::{CycleProgram, Phase};
use crate::error::{ConfigError, CyclerError};

/// What one timestep produced, for recording or plotting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestep: u64,
    /// Phase that chose the driver applied during this timestep
    pub phase: Phase,
    pub charge_curve: Vec<f64>,
    pub soc: f64,
    pub current: f64,
    pub potential: f64,
    /// Driver applied during this timestep
    pub driver_potential: f64,
}

pub struct Simulation<B: BatteryModel = DiffusionBattery> {
    battery: B,
    program: CycleProgram,
    history: MetricsHistory,
}

impl Simulation<DiffusionBattery> {
    /// Diffusion battery at zero charge driven by a program built from `config`.
    pub fn new(config: CyclerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let battery = DiffusionBattery::new(config.cathode_width);
        Ok(Self::with_battery(battery, CycleProgram::new(config)))
    }
}

impl<B: BatteryModel> Simulation<B> {
    pub fn with_battery(battery: B, program: CycleProgram) -> Self {
        let history = MetricsHistory::new(
            battery.charge_curve(),
            battery.soc(),
            battery.ocp(),
            CURVE_INTERVAL,
        );
        Self {
            battery,
            program,
            history,
        }
    }

    /// Keep only every `interval`-th charge curve in the history from now on.
    pub fn set_curve_interval(&mut self, interval: u64) {
        self.history.curve_interval = interval.max(1);
    }

    pub fn battery(&self) -> &B {
        &self.battery
    }

    pub fn program(&self) -> &CycleProgram {
        &self.program
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    pub fn advance_one_timestep(&mut self) -> Result<Snapshot, CyclerError> {
        let timestep = self.program.timestep();
        let phase = self.program.phase();
        let driver = self.program.driver_potential();
        log::debug!("calc frame {} - {}", timestep, phase);

        self.history.record_driver(timestep, driver);

        let (ocp, current) = self.battery.apply_potential(driver);
        let soc = self.battery.soc();
        self.history.record_step(
            timestep,
            phase,
            self.battery.charge_curve(),
            soc,
            current,
            ocp,
        );

        // Transitions stand even when the solver fails
        let outcome = self.program.advance(&self.battery, current, true);
        self.history.record_phase_changes(self.program.last_changes());
        outcome?;

        Ok(Snapshot {
            timestep,
            phase,
            charge_curve: self.battery.charge_curve().to_vec(),
            soc,
            current,
            potential: ocp,
            driver_potential: driver,
        })
    }

    /// Run `num_timesteps` ticks and return the last snapshot, if any ran.
    pub fn run(&mut self, num_timesteps: u64) -> Result<Option<Snapshot>, CyclerError> {
        let mut last = None;
        for _ in 0..num_timesteps {
            last = Some(self.advance_one_timestep()?);
        }
        Ok(last)
    }
}
