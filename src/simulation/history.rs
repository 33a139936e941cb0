// simulation/history.rs
// Append-only metric history kept for reporting. The simulation writes to it but never steers
// by it.

use serde::{Deserialize, Serialize};

use crate::cycler::{Phase, PhaseChange};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestep: u64,
    pub value: f64,
}

/// Named time series of scalar samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl Series {
    /// Series seeded with a `(0, 0)` sample, so the first real step already has a delta.
    pub fn new(name: &str) -> Self {
        Self::starting_at(name, 0.0)
    }

    /// Series seeded with `(0, initial)`.
    pub fn starting_at(name: &str, initial: f64) -> Self {
        Self {
            name: name.to_string(),
            samples: vec![Sample {
                timestep: 0,
                value: initial,
            }],
        }
    }

    pub fn push(&mut self, timestep: u64, value: f64) {
        self.samples.push(Sample { timestep, value });
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.last().map(|s| s.value)
    }

    /// Change from the previous sample to the latest one.
    pub fn delta(&self) -> Option<f64> {
        match self.samples.as_slice() {
            [.., prev, last] => Some(last.value - prev.value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    pub timestep: u64,
    pub values: Vec<f64>,
}

/// One dQ/dV reading: how much charge went in per unit of potential gained.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DqdvPoint {
    pub potential: f64,
    pub dqdv: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsHistory {
    pub soc: Series,
    pub current: Series,
    pub driver: Series,
    pub potential: Series,
    pub curves: Vec<CurveSnapshot>,
    pub dqdv: Vec<DqdvPoint>,
    pub phase_changes: Vec<PhaseChange>,
    /// Keep a curve snapshot every `curve_interval` timesteps
    pub curve_interval: u64,
}

impl MetricsHistory {
    /// History seeded with the battery's state before the first timestep.
    pub fn new(initial_curve: &[f64], soc: f64, ocp: f64, curve_interval: u64) -> Self {
        Self {
            soc: Series::starting_at("soc", soc),
            current: Series::new("current"),
            driver: Series::new("driver"),
            potential: Series::starting_at("potential", ocp),
            curves: vec![CurveSnapshot {
                timestep: 0,
                values: initial_curve.to_vec(),
            }],
            dqdv: Vec::new(),
            phase_changes: Vec::new(),
            curve_interval: curve_interval.max(1),
        }
    }

    pub fn record_driver(&mut self, timestep: u64, driver_potential: f64) {
        self.driver.push(timestep, driver_potential);
    }

    /// Record the battery readings for a finished timestep.
    pub fn record_step(
        &mut self,
        timestep: u64,
        phase: Phase,
        curve: &[f64],
        soc: f64,
        current: f64,
        potential: f64,
    ) {
        if timestep % self.curve_interval == 0 {
            self.curves.push(CurveSnapshot {
                timestep,
                values: curve.to_vec(),
            });
        }
        self.soc.push(timestep, soc);
        self.current.push(timestep, current);
        self.potential.push(timestep, potential);

        if phase == Phase::ChargeCc {
            if let (Some(dq), Some(dv)) = (self.soc.delta(), self.potential.delta()) {
                if dv != 0.0 {
                    self.dqdv.push(DqdvPoint {
                        potential,
                        dqdv: dq / dv,
                    });
                }
            }
        }
    }

    pub fn record_phase_changes(&mut self, changes: &[PhaseChange]) {
        self.phase_changes.extend_from_slice(changes);
    }

    /// Number of timesteps recorded, not counting the seed sample.
    pub fn timesteps(&self) -> usize {
        self.soc.len().saturating_sub(1)
    }

    pub fn latest_curve(&self) -> Option<&CurveSnapshot> {
        self.curves.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_delta_needs_two_samples() {
        let mut series = Series::new("x");
        assert_eq!(series.delta(), None);
        series.push(1, 2.5);
        assert_eq!(series.delta(), Some(2.5));
        series.push(2, 1.0);
        assert_eq!(series.delta(), Some(-1.5));
        assert_eq!(series.last(), Some(1.0));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn curves_follow_interval() {
        let mut history = MetricsHistory::new(&[0.0, 0.0], 0.0, 0.0, 3);
        for t in 1..=7 {
            history.record_step(t, Phase::Rest, &[t as f64, 0.0], 0.0, 0.0, 0.0);
        }
        let kept: Vec<u64> = history.curves.iter().map(|c| c.timestep).collect();
        assert_eq!(kept, vec![0, 3, 6]);
        assert_eq!(history.timesteps(), 7);
        assert_eq!(history.latest_curve().unwrap().values, vec![6.0, 0.0]);
    }

    #[test]
    fn zero_interval_keeps_every_curve() {
        let history = MetricsHistory::new(&[1.0], 1.0, 1.0, 0);
        assert_eq!(history.curve_interval, 1);
    }

    #[test]
    fn dqdv_only_during_constant_current_charge() {
        let mut history = MetricsHistory::new(&[0.0, 0.0], 0.0, 0.0, 1);
        history.record_step(1, Phase::ChargeCc, &[0.0, 0.5], 10.0, 10.0, 0.5);
        history.record_step(2, Phase::ChargeCc, &[0.0, 0.5], 20.0, 10.0, 0.5);
        history.record_step(3, Phase::ChargeCv, &[0.0, 1.0], 25.0, 5.0, 1.0);
        history.record_step(4, Phase::ChargeCc, &[0.0, 1.5], 30.0, 5.0, 1.5);

        // Step 2 has no potential change and step 3 is not CC charge
        assert_eq!(
            history.dqdv,
            vec![
                DqdvPoint { potential: 0.5, dqdv: 20.0 },
                DqdvPoint { potential: 1.5, dqdv: 10.0 },
            ]
        );
    }

    #[test]
    fn precharged_start_seeds_soc_and_potential() {
        let mut history = MetricsHistory::new(&[2.0, 1.0, 1.0], 4.0, 1.0, 1);
        assert_eq!(history.soc.last(), Some(4.0));
        assert_eq!(history.potential.last(), Some(1.0));
        assert_eq!(history.current.last(), Some(0.0));

        history.record_step(1, Phase::ChargeCc, &[2.0, 1.5, 1.5], 5.0, 1.0, 1.5);
        assert_eq!(history.soc.delta(), Some(1.0));
        assert_eq!(
            history.dqdv,
            vec![DqdvPoint {
                potential: 1.5,
                dqdv: 2.0
            }]
        );
    }
}
