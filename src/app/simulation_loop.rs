use crate::battery::BatteryModel;
use crate::config::RunConfig;
use crate::error::CyclerError;
use crate::simulation::{Simulation, Snapshot};

/// How a headless run ended.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub timesteps_run: u64,
    pub last: Option<Snapshot>,
    /// Timestep at which a non-finite reading stopped the run
    pub halted_at: Option<u64>,
}

fn is_finite_snapshot(snapshot: &Snapshot) -> bool {
    snapshot.soc.is_finite()
        && snapshot.current.is_finite()
        && snapshot.potential.is_finite()
        && snapshot.driver_potential.is_finite()
}

/// Step `simulation` for `run.num_timesteps` ticks, logging progress every `run.log_interval`.
///
/// A non-finite reading means the driver has run away; there is nothing sensible to cycle
/// after that, so the loop stops and reports where.
pub fn run_simulation_loop<B: BatteryModel>(
    simulation: &mut Simulation<B>,
    run: &RunConfig,
) -> Result<RunSummary, CyclerError> {
    simulation.set_curve_interval(run.curve_interval);

    let mut summary = RunSummary {
        timesteps_run: 0,
        last: None,
        halted_at: None,
    };

    for _ in 0..run.num_timesteps {
        let snapshot = simulation.advance_one_timestep()?;
        summary.timesteps_run += 1;

        if run.log_interval > 0 && snapshot.timestep % run.log_interval == 0 {
            log::info!(
                "t={} {} soc={:.3} current={:.4} potential={:.4} driver={:.4}",
                snapshot.timestep,
                snapshot.phase,
                snapshot.soc,
                snapshot.current,
                snapshot.potential,
                snapshot.driver_potential
            );
        }

        if !is_finite_snapshot(&snapshot) {
            log::error!(
                "non-finite reading at timestep {} ({}), stopping",
                snapshot.timestep,
                snapshot.phase
            );
            summary.halted_at = Some(snapshot.timestep);
            summary.last = Some(snapshot);
            break;
        }
        summary.last = Some(snapshot);
    }

    Ok(summary)
}
