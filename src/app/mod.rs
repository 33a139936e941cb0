use std::error::Error;
use std::path::Path;

use crate::config::ExportFormat;
use crate::cycler::Phase;
use crate::export;
use crate::init_config::InitConfig;
use crate::simulation::Simulation;

pub mod simulation_loop;

/// Command-line overrides on top of the config file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<String>,
    pub timesteps: Option<u64>,
    pub phase: Option<Phase>,
    pub output_dir: Option<String>,
    pub format: Option<ExportFormat>,
    pub gzip: bool,
    pub help: bool,
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Result<Self, Box<dyn Error>> {
        let mut parsed = CliArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| format!("Missing value for {flag}"))
            };
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--gzip" => parsed.gzip = true,
                "--timesteps" => parsed.timesteps = Some(value("--timesteps")?.parse()?),
                "--phase" => parsed.phase = Some(value("--phase")?.parse()?),
                "--out" => parsed.output_dir = Some(value("--out")?),
                "--format" => parsed.format = Some(value("--format")?.parse()?),
                other if other.starts_with('-') => {
                    return Err(format!("Unknown option: {other}").into());
                }
                path => {
                    if parsed.config_path.is_some() {
                        return Err(format!("Unexpected argument: {path}").into());
                    }
                    parsed.config_path = Some(path.to_string());
                }
            }
        }
        Ok(parsed)
    }

    /// Config file (or defaults) with the command-line overrides applied.
    pub fn resolve_config(&self) -> Result<InitConfig, Box<dyn Error>> {
        let mut config = match &self.config_path {
            Some(path) => InitConfig::load_from_file(path)?,
            None => InitConfig::load_default()?,
        };
        if let Some(timesteps) = self.timesteps {
            config.run.num_timesteps = timesteps;
        }
        if let Some(phase) = self.phase {
            config.cycler.initial_phase = phase;
        }
        if let Some(dir) = &self.output_dir {
            config.run.output_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.run.export_format = format;
        }
        if self.gzip {
            config.run.compress = true;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn print_usage() {
    println!("\n╔══════════════════════════════════════════════╗");
    println!("║  Battery Sim - Cathode Diffusion Cycler     ║");
    println!("╚══════════════════════════════════════════════╝\n");
    println!("Usage: battery_sim [CONFIG.toml] [options]\n");
    println!("Options:");
    println!("  --timesteps N     Number of timesteps to run");
    println!("  --phase NAME      Starting phase (see below)");
    println!("  --out DIR         Output directory for exported history");
    println!("  --format FMT      Export format: csv, tsv or json");
    println!("  --gzip            Gzip the exported files");
    println!("  -h, --help        Show this message\n");
    println!("Phases:");
    print!("{}", phase_table());
    println!();
    println!("Without CONFIG.toml, cycler_config.toml is used when present, otherwise defaults.");
}

/// One line per phase, in cycling order.
pub fn phase_table() -> String {
    Phase::ALL
        .iter()
        .map(|phase| format!("  {:<16}  {}\n", phase.display(), phase.description()))
        .collect()
}

pub fn run() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run_with_args(&args) {
        eprintln!("[ERROR] {e}");
        std::process::exit(1);
    }
}

pub fn run_with_args(args: &[String]) -> Result<(), Box<dyn Error>> {
    let cli = CliArgs::parse(args)?;
    if cli.help {
        print_usage();
        return Ok(());
    }

    let config = cli.resolve_config()?;
    let cycler = &config.cycler;
    println!(
        "Running {} timesteps: cathode width {}, CC {} / CV {} / discharge CV {}, starting in {}",
        config.run.num_timesteps,
        cycler.cathode_width,
        cycler.charge_cc,
        cycler.charge_cv,
        cycler.discharge_cv,
        cycler.initial_phase
    );

    let mut simulation = Simulation::new(config.cycler.clone())?;
    let summary = simulation_loop::run_simulation_loop(&mut simulation, &config.run)?;

    let history = simulation.history();
    let paths = export::export_history(
        history,
        config.run.export_format,
        Path::new(&config.run.output_dir),
        config.run.compress,
    )?;

    println!("Done: {} timesteps", summary.timesteps_run);
    if let Some(t) = summary.halted_at {
        println!("Stopped early at timestep {t} (non-finite reading)");
    }
    if let Some(last) = &summary.last {
        println!(
            "Final phase {}: soc {:.3}, potential {:.4}, {} phase changes",
            simulation.program().phase(),
            last.soc,
            last.potential,
            history.phase_changes.len()
        );
    }
    for path in paths {
        println!("Saved {}", path.display());
    }
    Ok(())
}
