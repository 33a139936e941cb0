// battery/mod.rs
// Battery models that the cycler can drive.
//
// A model takes a driving potential for one timestep and reports the resulting open-circuit
// potential and current. Variants are picked at construction; the diffusion model is the only
// one with behaviour today, an equivalent-circuit model would sit next to it.

pub mod charge_curve;
pub mod diffusion;

pub use charge_curve::ChargeCurveModel;
pub use diffusion::DiffusionBattery;

use crate::error::SolverError;
use crate::solver::Setpoint;

pub trait BatteryModel {
    /// Applies `driving_potential` for one timestep and returns `(ocp, current)`.
    /// Positive current is an increase in stored charge.
    fn apply_potential(&mut self, driving_potential: f64) -> (f64, f64);

    /// Open-circuit potential after the last update.
    fn ocp(&self) -> f64;

    /// State of charge after the last update.
    fn soc(&self) -> f64;

    /// Internal charge distribution; empty for models that do not track one.
    fn charge_curve(&self) -> &[f64];

    /// Driving potential expected to meet `setpoint` during the next timestep.
    fn driver_for(&self, setpoint: Setpoint) -> Result<f64, SolverError>;
}
