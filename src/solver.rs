// solver.rs
// Picks the driving potential that should produce a target current or potential after one
// diffusion step. Single-shot secant: two observations, one straight line, no iteration.

use serde::{Deserialize, Serialize};

use crate::battery::ChargeCurveModel;
use crate::error::SolverError;

/// What a setpoint controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// Charge moved per timestep.
    Current,
    /// Open-circuit potential after the timestep.
    Potential,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    pub mode: ControlMode,
    pub value: f64,
}

impl Setpoint {
    pub fn current(value: f64) -> Self {
        Self {
            mode: ControlMode::Current,
            value,
        }
    }

    pub fn potential(value: f64) -> Self {
        Self {
            mode: ControlMode::Potential,
            value,
        }
    }
}

/// A quantity observed after one update with a given driving potential.
pub trait Observe {
    fn observe(&self, driving_potential: f64, curve: &[f64]) -> f64;
}

impl<F> Observe for F
where
    F: Fn(f64, &[f64]) -> f64,
{
    fn observe(&self, driving_potential: f64, curve: &[f64]) -> f64 {
        self(driving_potential, curve)
    }
}

/// Current observation backed by the diffusion model.
#[derive(Clone, Copy, Debug)]
pub struct ObservedCurrent<'a> {
    pub model: &'a ChargeCurveModel,
}

impl Observe for ObservedCurrent<'_> {
    fn observe(&self, driving_potential: f64, curve: &[f64]) -> f64 {
        self.model.current_given(driving_potential, curve)
    }
}

/// Potential observation backed by the diffusion model.
#[derive(Clone, Copy, Debug)]
pub struct ObservedPotential<'a> {
    pub model: &'a ChargeCurveModel,
}

impl Observe for ObservedPotential<'_> {
    fn observe(&self, driving_potential: f64, curve: &[f64]) -> f64 {
        self.model.potential_given(driving_potential, curve)
    }
}

/// An observation tied to a fixed curve. Evaluating it at `p` observes the curve with its
/// boundary replaced by `p`, so the curve and the driving potential always agree.
#[derive(Clone, Copy, Debug)]
pub struct BoundObservation<'a, O: ?Sized> {
    observe: &'a O,
    curve: &'a [f64],
}

impl<'a, O: Observe + ?Sized> BoundObservation<'a, O> {
    pub fn new(observe: &'a O, curve: &'a [f64]) -> Self {
        Self { observe, curve }
    }

    pub fn at(&self, driving_potential: f64) -> f64 {
        let driven = with_boundary(self.curve, driving_potential);
        self.observe.observe(driving_potential, &driven)
    }
}

/// Copy of `curve` with index 0 set to `driving_potential`.
pub fn with_boundary(curve: &[f64], driving_potential: f64) -> Vec<f64> {
    let mut driven = curve.to_vec();
    if let Some(boundary) = driven.first_mut() {
        *boundary = driving_potential;
    }
    driven
}

/// Driving potential expected to make `observe` hit `target` after one update of `curve`.
///
/// Samples today's boundary value and one unit above it, fits a line with the observation as
/// the independent variable, and reads the line at `target`. The true relation is generally
/// not linear, so repeated use carries a steady-state error.
pub fn solve_for_target<O: Observe + ?Sized>(
    curve: &[f64],
    observe: &O,
    target: f64,
) -> Result<f64, SolverError> {
    let p0 = *curve.first().ok_or(SolverError::EmptyCurve)?;
    let v0 = observe.observe(p0, curve);
    if v0 == target {
        return Ok(p0);
    }

    let p1 = p0 + 1.0;
    let v1 = BoundObservation::new(observe, curve).at(p1);

    let (slope, intercept) = slope_intercept((v0, p0), (v1, p1))?;
    Ok(slope * target + intercept)
}

/// Slope and intercept of the line through two `(x, y)` points.
pub fn slope_intercept(pt1: (f64, f64), pt2: (f64, f64)) -> Result<(f64, f64), SolverError> {
    let dx = pt1.0 - pt2.0;
    if dx == 0.0 {
        return Err(SolverError::DivisionByZero { observed: pt1.0 });
    }
    let slope = (pt1.1 - pt2.1) / dx;
    Ok((slope, pt1.1 - slope * pt1.0))
}
