use crate::boundary;
use crate::collision::{self, CollisionTally};
use crate::ensemble::{Ensemble, Particle};
use crate::error::{Error, Result};
use crate::grid::CollisionGrid;
use crate::placement;
use crate::report::RunReport;
use crate::statistics::{speed_histogram, StatisticsAggregator};
use gas_common::{BroadPhase, EnsembleSnapshot, FrameStatistics, SimParams, SimulationConfig};
use log::{debug, error, info, trace};
use rand::prelude::*;

/// Owns the ensemble, its configuration and the run's statistics, and advances them one tick at a time.
pub struct GasSimulation {
    /// The simulation configuration, fixed for the run.
    config: SimulationConfig,
    /// Runtime parameters derived from `config`.
    params: SimParams,
    /// Seed the initial layout was drawn from; None for explicit starts.
    seed: Option<u64>,
    /// The particles.
    ensemble: Ensemble,
    /// Number of ticks completed.
    current_tick: u64,
    /// Cell lists, present only when the grid broad phase is configured.
    grid: Option<CollisionGrid>,
    /// Scratch buffer for grid candidates.
    candidates: Vec<usize>,
    statistics: StatisticsAggregator,
    collisions_resolved: u64,
    degenerate_collisions: u64,
    wall_hits: u64,
}

impl GasSimulation {
    /// Validates `config`, places the particles and assigns their initial velocities.
    ///
    /// Fails with [`Error::Configuration`] before any tick when the parameters are invalid
    /// or no non-overlapping layout is found within the placement attempt budget.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        // Initialize the host-side RNG used for placement and velocity assignment.
        let seed = config.run.seed.unwrap_or_else(|| rand::rng().random());
        info!("Initial layout seed: {}", seed);
        let mut rng = StdRng::seed_from_u64(seed);

        let ensemble = placement::build_ensemble(&config, &mut rng)?;
        Self::assemble(config, ensemble, Some(seed))
    }

    /// Starts from explicit particle states instead of random placement.
    ///
    /// The shared radius comes from `config`, and the number of particles must match
    /// `config.particles.count`. No overlap check is made.
    pub fn from_particles(config: SimulationConfig, particles: Vec<Particle>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        if particles.len() != config.particles.count as usize {
            return Err(Error::Configuration(format!(
                "expected {} particles, got {}",
                config.particles.count,
                particles.len()
            )));
        }
        let ensemble = Ensemble::new(particles, config.particles.radius)?;
        Self::assemble(config, ensemble, None)
    }

    fn assemble(config: SimulationConfig, ensemble: Ensemble, seed: Option<u64>) -> Result<Self> {
        let params = config.get_sim_params();
        let grid = match config.run.broad_phase {
            BroadPhase::BruteForce => None,
            BroadPhase::Grid => {
                debug!(
                    "Grid broad phase: {}x{} cells of size {:.3}.",
                    params.grid_dim_x, params.grid_dim_y, params.grid_cell_size
                );
                Some(CollisionGrid::new(&params, ensemble.len()))
            }
        };
        let statistics = StatisticsAggregator::new(params.mass, params.boltzmann_constant);

        let sim = Self {
            candidates: Vec::with_capacity(16),
            config,
            params,
            seed,
            ensemble,
            current_tick: 0,
            grid,
            statistics,
            collisions_resolved: 0,
            degenerate_collisions: 0,
            wall_hits: 0,
        };
        sim.check_invariants()?;
        Ok(sim)
    }

    /// Advances the ensemble by one tick and returns its state and statistics.
    ///
    /// Particles are processed in identity order. Each one moves by its velocity, is
    /// reflected off the walls, then is resolved against every higher-indexed particle
    /// at that particle's stored position. Because higher-indexed particles have not
    /// moved yet this tick, a collision can see velocities already changed by earlier
    /// pairs; that order dependence is part of the model.
    pub fn step(&mut self) -> Result<(EnsembleSnapshot, FrameStatistics)> {
        let tick = self.current_tick + 1;
        let params = &self.params;
        let radius = self.ensemble.radius();

        if let Some(grid) = self.grid.as_mut() {
            grid.build(self.ensemble.particles(), params);
        }

        let particles = self.ensemble.particles_mut();
        let n = particles.len();
        let mut tally = CollisionTally::default();
        let mut wall_hits = 0u64;

        for i in 0..n {
            let p = &mut particles[i];
            p.position += p.velocity * params.dt;
            wall_hits += boundary::reflect(p, radius, params.world_width, params.world_height).count() as u64;

            let sweep = match self.grid.as_ref() {
                None => collision::resolve_against_later(particles, i, (i + 1)..n, params.diameter, tick),
                Some(grid) => {
                    grid.candidates_after(i, particles[i].position, params, &mut self.candidates);
                    collision::resolve_against_later(
                        particles,
                        i,
                        self.candidates.iter().copied(),
                        params.diameter,
                        tick,
                    )
                }
            };
            tally.resolved += sweep.resolved;
            tally.degenerate += sweep.degenerate;
        }

        self.current_tick = tick;
        self.collisions_resolved += tally.resolved;
        self.degenerate_collisions += tally.degenerate;
        self.wall_hits += wall_hits;
        trace!(
            "Tick {}: {} collisions, {} degenerate, {} wall hits.",
            tick, tally.resolved, tally.degenerate, wall_hits
        );

        self.check_invariants()?;

        let velocities = self.ensemble.velocities();
        let stats = self.statistics.record(tick, &velocities);
        Ok((self.ensemble.snapshot(tick), stats))
    }

    /// Verifies the ensemble after construction and after every tick.
    fn check_invariants(&self) -> Result<()> {
        let tick = self.current_tick;
        let expected = self.config.particles.count as usize;
        if self.ensemble.len() != expected {
            return Err(self.violation(format!(
                "ensemble holds {} particles, expected {}",
                self.ensemble.len(),
                expected
            )));
        }
        // Construction from explicit particles may start outside the arena; the first tick clamps them.
        if tick == 0 {
            return Ok(());
        }
        let (width, height) = (self.params.world_width, self.params.world_height);
        for (idx, p) in self.ensemble.particles().iter().enumerate() {
            if !p.position.is_finite() || !p.velocity.is_finite() {
                return Err(self.violation(format!(
                    "particle {} is not finite: position {:?}, velocity {:?}",
                    idx, p.position, p.velocity
                )));
            }
            let pos = p.position;
            if pos.x < 0.0 || pos.x > width || pos.y < 0.0 || pos.y > height {
                return Err(self.violation(format!(
                    "particle {} at ({}, {}) escaped the {}x{} arena",
                    idx, pos.x, pos.y, width, height
                )));
            }
        }
        Ok(())
    }

    fn violation(&self, detail: String) -> Error {
        let err = Error::InvariantViolation { tick: self.current_tick, detail };
        error!("{}", err);
        error!("State at failure: {:?}", self.ensemble.snapshot(self.current_tick));
        err
    }

    /// The current state without advancing.
    pub fn snapshot(&self) -> EnsembleSnapshot {
        self.ensemble.snapshot(self.current_tick)
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn current_particle_count(&self) -> usize {
        self.ensemble.len()
    }

    /// The placement seed, or None when the run started from explicit particles.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn collisions_resolved(&self) -> u64 {
        self.collisions_resolved
    }

    /// Collisions skipped because the two centers coincided.
    pub fn degenerate_collisions(&self) -> u64 {
        self.degenerate_collisions
    }

    pub fn wall_hits(&self) -> u64 {
        self.wall_hits
    }

    /// Average speed of every completed tick, oldest first.
    pub fn average_speed_series(&self) -> &[f64] {
        self.statistics.average_speed_series()
    }

    /// Per-particle speeds of the last completed tick.
    pub fn final_speeds(&self) -> &[f64] {
        self.statistics.final_speeds()
    }

    /// Collects the end-of-run data, binning final speeds into `histogram_bins` bins.
    pub fn report(&self, histogram_bins: usize) -> RunReport {
        RunReport {
            ticks: self.current_tick,
            particle_count: self.ensemble.len(),
            seed: self.seed,
            collisions_resolved: self.collisions_resolved,
            degenerate_collisions: self.degenerate_collisions,
            wall_hits: self.wall_hits,
            average_speed_series: self.average_speed_series().to_vec(),
            final_speeds: self.final_speeds().to_vec(),
            final_speed_histogram: speed_histogram(self.final_speeds(), histogram_bins),
            final_frame: self.statistics.last_frame().cloned(),
        }
    }

    /// Consumes the simulation once the host stops ticking.
    pub fn into_report(self) -> RunReport {
        let bins = self.config.output.histogram_bins;
        self.report(bins)
    }
}
