use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use log::{info, warn, error, debug, trace};

use gas_common::SimulationConfig;
use gas_engine::report::{self, ReportFormat};
use gas_engine::GasSimulation;

/// Exit status for a run aborted by an invariant violation (EX_SOFTWARE).
const EXIT_INVARIANT_VIOLATION: i32 = 70;

/// Headless runner: steps the gas for a fixed number of ticks and writes the run report.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override timing.total_ticks
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Override run.seed
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Gas Engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(ticks) = args.ticks {
        config.timing.total_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }
    info!("Configuration loaded from {}.", args.config.display());

    // --- Initialize Simulation ---
    // Configuration problems surface here, before any tick runs.
    let mut sim = GasSimulation::new(config)?;
    info!("Ensemble initialized with {} particles.", sim.current_particle_count());
    debug!("Simulation Parameters: {:#?}", sim.params());

    // --- Simulation Loop ---
    let total_ticks = sim.config().timing.total_ticks;
    let realtime = sim.config().timing.realtime;
    let frame_interval = Duration::from_secs_f64(sim.params().frame_interval_secs);
    if realtime {
        info!("Pacing ticks to {:.1} frames per second.", sim.config().timing.frame_rate);
    }

    info!("Starting simulation loop for {} ticks...", total_ticks);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    let print_interval_secs = 5.0;

    for tick in 1..=total_ticks {
        let tick_start_time = Instant::now();
        let stats = match sim.step() {
            Ok((_, stats)) => stats,
            Err(e) => {
                if e.is_invariant_violation() {
                    dump_state(&sim);
                    error!("Run aborted at tick {}: {}", tick, e);
                    std::process::exit(EXIT_INVARIANT_VIOLATION);
                }
                error!("Error during simulation tick {}: {}", tick, e);
                anyhow::bail!("Simulation tick failed.");
            }
        };
        let tick_duration = tick_start_time.elapsed();

        // Print status periodically
        let current_time = Instant::now();
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        if should_print_status || tick == total_ticks {
            info!(
                "Tick [{}/{}] | Avg Speed: {:.5} | Total Energy (U): {:.5e} J | Temperature: {:.5} K | Tick Time: {:6.2} ms",
                tick,
                total_ticks,
                stats.average_speed,
                stats.total_kinetic_energy,
                stats.temperature,
                tick_duration.as_secs_f64() * 1000.0
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "Tick [{}/{}] completed in {:.2} ms",
                tick,
                total_ticks,
                tick_duration.as_secs_f64() * 1000.0
            );
        }

        if realtime {
            if let Some(remaining) = frame_interval.checked_sub(tick_duration) {
                std::thread::sleep(remaining);
            }
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({} collisions resolved, {} wall hits).",
        total_duration.as_secs_f64(),
        sim.collisions_resolved(),
        sim.wall_hits()
    );
    if sim.degenerate_collisions() > 0 {
        warn!("{} degenerate collisions were skipped during the run.", sim.degenerate_collisions());
    }

    // --- Save Recorded Data ---
    let output = sim.config().output.clone();
    if output.save_speed_series_csv {
        let filename = format!("{}_average_speed.csv", output.base_filename);
        if let Err(e) = report::write_speed_series_csv(sim.average_speed_series(), &filename) {
            error!("Error saving CSV file '{}': {}", filename, e);
        }
    } else {
        info!("Skipping average speed series as per config.");
    }

    if output.save_report {
        let format = ReportFormat::from_setting(output.format.as_deref());
        let run_report = sim.into_report();
        if let Err(e) = report::write_report(&run_report, &output.base_filename, format) {
            error!("Error writing run report: {}", e);
        }
    } else {
        info!("Skipping run report as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

fn dump_state(sim: &GasSimulation) {
    let output = &sim.config().output;
    if !output.dump_state_on_failure {
        return;
    }
    let filename = format!("{}_state_dump.json", output.base_filename);
    if let Err(e) = report::write_state_dump(&sim.snapshot(), &filename) {
        error!("Error writing state dump '{}': {}", filename, e);
    }
}
