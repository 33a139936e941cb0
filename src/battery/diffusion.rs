// battery/diffusion.rs
// Battery whose state is a diffusing charge curve across the cathode.

use super::charge_curve::{read_ocp, ChargeCurveModel};
use super::BatteryModel;
use crate::error::SolverError;
use crate::solver::{self, ControlMode, ObservedCurrent, ObservedPotential, Setpoint};

#[derive(Clone, Debug)]
pub struct DiffusionBattery {
    model: ChargeCurveModel,
    charge_curve: Vec<f64>,
    ocp: f64,
    soc: f64,
}

impl DiffusionBattery {
    /// Fresh cathode of `cathode_width` cells holding no charge.
    pub fn new(cathode_width: usize) -> Self {
        Self::with_curve(cathode_width, vec![0.0; cathode_width])
    }

    /// Battery starting from an explicit curve. `cathode_width` only sets the diffusion scale;
    /// the curve length is kept as given.
    pub fn with_curve(cathode_width: usize, charge_curve: Vec<f64>) -> Self {
        if charge_curve.len() != cathode_width {
            log::warn!(
                "charge curve has {} cells but cathode width is {}",
                charge_curve.len(),
                cathode_width
            );
        }
        let soc = charge_curve.iter().sum();
        let ocp = read_ocp(&charge_curve);
        Self {
            model: ChargeCurveModel::new(cathode_width),
            charge_curve,
            ocp,
            soc,
        }
    }

    pub fn model(&self) -> &ChargeCurveModel {
        &self.model
    }

    pub fn driver_for_target_current(&self, target: f64) -> Result<f64, SolverError> {
        let observe = ObservedCurrent { model: &self.model };
        solver::solve_for_target(&self.charge_curve, &observe, target)
    }

    pub fn driver_for_target_ocp(&self, target: f64) -> Result<f64, SolverError> {
        let observe = ObservedPotential { model: &self.model };
        solver::solve_for_target(&self.charge_curve, &observe, target)
    }
}

impl BatteryModel for DiffusionBattery {
    fn apply_potential(&mut self, driving_potential: f64) -> (f64, f64) {
        self.charge_curve = self.model.update(driving_potential, &self.charge_curve);
        self.ocp = read_ocp(&self.charge_curve);
        let prior_soc = self.soc;
        self.soc = self.charge_curve.iter().sum();
        (self.ocp, self.soc - prior_soc)
    }

    fn ocp(&self) -> f64 {
        self.ocp
    }

    fn soc(&self) -> f64 {
        self.soc
    }

    fn charge_curve(&self) -> &[f64] {
        &self.charge_curve
    }

    fn driver_for(&self, setpoint: Setpoint) -> Result<f64, SolverError> {
        match setpoint.mode {
            ControlMode::Current => self.driver_for_target_current(setpoint.value),
            ControlMode::Potential => self.driver_for_target_ocp(setpoint.value),
        }
    }
}
