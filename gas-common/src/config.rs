use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

/// Boltzmann constant in J/K.
pub const BOLTZMANN_CONSTANT: f64 = 1.380649e-23;
/// Mass of a helium-4 atom in kg.
pub const HELIUM_MASS_KG: f64 = 6.646476406e-27;
/// Upper bound on broad-phase grid cells (two u32 tables per cell).
pub const MAX_GRID_CELLS: u64 = 1 << 24;

// Arena the particles are confined to. Walls sit at 0 and at width/height.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
}

// Ensemble-wide particle properties (radius and mass are shared by every particle)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ParticleConfig {
    pub count: u32,
    pub radius: f64,
    pub mass: f64,
    /// Extra clearance added inside the arena when sampling initial centers.
    #[serde(default = "default_placement_margin")]
    pub placement_margin: f64,
    /// Draws allowed per particle before placement is declared infeasible.
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PhysicsConfig {
    #[serde(default = "default_boltzmann_constant")]
    pub boltzmann_constant: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig { boltzmann_constant: BOLTZMANN_CONSTANT }
    }
}

/// Rule used to assign every particle its initial velocity.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "rule", rename_all = "lowercase")]
pub enum SpeedRule {
    /// Characteristic speed sqrt(3 k_B T / m), split equally over both axes.
    Thermal { temperature: f64 },
    /// Characteristic speed given directly, split equally over both axes.
    Speed { speed: f64 },
    /// The same fixed components for every particle.
    Components { vx: f64, vy: f64 },
    /// Components drawn from Normal(0, sqrt(k_B T / m)).
    Maxwell { temperature: f64 },
}

impl SpeedRule {
    /// Characteristic speed for the rules that project one speed onto both axes.
    pub fn characteristic_speed(&self, mass: f64, boltzmann_constant: f64) -> Option<f64> {
        match *self {
            SpeedRule::Thermal { temperature } => {
                Some((3.0 * boltzmann_constant * temperature / mass).sqrt())
            }
            SpeedRule::Speed { speed } => Some(speed),
            SpeedRule::Components { .. } | SpeedRule::Maxwell { .. } => None,
        }
    }
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    #[serde(default = "default_total_ticks")]
    pub total_ticks: u32,
    /// Sleep between ticks so the run advances at `frame_rate`.
    #[serde(default)]
    pub realtime: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            frame_rate: default_frame_rate(),
            total_ticks: default_total_ticks(),
            realtime: false,
        }
    }
}

/// How candidate collision pairs are found each tick.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BroadPhase {
    #[default]
    BruteForce,
    Grid,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct RunConfig {
    /// RNG seed for placement and velocity assignment; None draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub broad_phase: BroadPhase,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_report: bool,
    pub format: Option<String>, // Report format: "json", "bincode", "messagepack"
    #[serde(default = "default_true")]
    pub save_speed_series_csv: bool,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_true")]
    pub dump_state_on_failure: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "gas_run".to_string(),
            save_report: true,
            format: None,
            save_speed_series_csv: true,
            histogram_bins: default_histogram_bins(),
            dump_state_on_failure: true,
        }
    }
}

fn default_placement_margin() -> f64 {
    15.0
}

fn default_max_placement_attempts() -> u32 {
    100_000
}

fn default_boltzmann_constant() -> f64 {
    BOLTZMANN_CONSTANT
}

fn default_frame_rate() -> f64 {
    60.0
}

fn default_total_ticks() -> u32 {
    600
}

fn default_histogram_bins() -> usize {
    50
}

fn default_true() -> bool {
    true
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub arena: ArenaConfig,
    pub particles: ParticleConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    pub initial_velocity: SpeedRule,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    /// A 1000x600 arena with 500 helium atoms of radius 5 at 5 K.
    fn default() -> Self {
        SimulationConfig {
            arena: ArenaConfig { width: 1000.0, height: 600.0 },
            particles: ParticleConfig {
                count: 500,
                radius: 5.0,
                mass: HELIUM_MASS_KG,
                placement_margin: default_placement_margin(),
                max_placement_attempts: default_max_placement_attempts(),
            },
            physics: PhysicsConfig::default(),
            initial_velocity: SpeedRule::Thermal { temperature: 5.0 },
            timing: TimingConfig::default(),
            run: RunConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks parameter ranges. Placement feasibility is only known once placement runs.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| -> Result<()> {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{} must be finite and positive (got {}).", name, value);
            }
            Ok(())
        };
        positive("arena.width", self.arena.width)?;
        positive("arena.height", self.arena.height)?;
        positive("particles.radius", self.particles.radius)?;
        positive("particles.mass", self.particles.mass)?;
        positive("physics.boltzmann_constant", self.physics.boltzmann_constant)?;
        positive("timing.frame_rate", self.timing.frame_rate)?;

        let diameter = 2.0 * self.particles.radius;
        if diameter > self.arena.width || diameter > self.arena.height {
            anyhow::bail!(
                "particle diameter {} does not fit in the {}x{} arena.",
                diameter, self.arena.width, self.arena.height
            );
        }
        if self.particles.count == 0 {
            anyhow::bail!("particles.count must be greater than 0.");
        }
        if !self.particles.placement_margin.is_finite() || self.particles.placement_margin < 0.0 {
            anyhow::bail!("particles.placement_margin must be finite and non-negative.");
        }
        if self.particles.max_placement_attempts == 0 {
            anyhow::bail!("particles.max_placement_attempts must be greater than 0.");
        }
        if self.output.histogram_bins == 0 {
            anyhow::bail!("output.histogram_bins must be greater than 0.");
        }
        if self.run.broad_phase == BroadPhase::Grid {
            let params = self.get_sim_params();
            if params.num_grid_cells > MAX_GRID_CELLS {
                anyhow::bail!(
                    "grid broad phase would need {}x{} cells (limit {}); use a larger radius, a smaller arena or broad_phase = \"brute_force\".",
                    params.grid_dim_x, params.grid_dim_y, MAX_GRID_CELLS
                );
            }
        }

        match self.initial_velocity {
            SpeedRule::Thermal { temperature } | SpeedRule::Maxwell { temperature } => {
                if !temperature.is_finite() || temperature < 0.0 {
                    anyhow::bail!("initial_velocity.temperature must be finite and non-negative.");
                }
            }
            SpeedRule::Speed { speed } => {
                if !speed.is_finite() {
                    anyhow::bail!("initial_velocity.speed must be finite.");
                }
            }
            SpeedRule::Components { vx, vy } => {
                if !vx.is_finite() || !vy.is_finite() {
                    anyhow::bail!("initial_velocity components must be finite.");
                }
            }
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let world_width = self.arena.width;
        let world_height = self.arena.height;
        let radius = self.particles.radius;
        let margin = self.particles.placement_margin;
        let diameter = 2.0 * radius;

        // Grid cells are one diameter wide so a 3x3 neighbourhood covers every contact
        let grid_cell_size = diameter;
        let inv_grid_cell_size = if grid_cell_size > 1e-12 { 1.0 / grid_cell_size } else { 0.0 };
        // Float-to-int casts saturate, so huge arenas yield oversized dims rather than wrapping
        let grid_dim_x = ((world_width * inv_grid_cell_size).ceil() as u32).max(1);
        let grid_dim_y = ((world_height * inv_grid_cell_size).ceil() as u32).max(1);

        SimParams {
            world_width,
            world_height,
            radius,
            diameter,
            diameter_sq: diameter * diameter,
            mass: self.particles.mass,
            boltzmann_constant: self.physics.boltzmann_constant,
            placement_min_x: radius + margin,
            placement_max_x: world_width - margin,
            placement_min_y: radius + margin,
            placement_max_y: world_height - margin,
            grid_cell_size,
            inv_grid_cell_size,
            grid_dim_x,
            grid_dim_y,
            num_grid_cells: grid_dim_x as u64 * grid_dim_y as u64,
            dt: 1.0,
            frame_interval_secs: 1.0 / self.timing.frame_rate,
            characteristic_speed: self
                .initial_velocity
                .characteristic_speed(self.particles.mass, self.physics.boltzmann_constant),
        }
    }
}
