pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, ArenaConfig, ParticleConfig, PhysicsConfig, SpeedRule, TimingConfig, RunConfig, BroadPhase, OutputConfig, BOLTZMANN_CONSTANT, HELIUM_MASS_KG, MAX_GRID_CELLS};
pub use sim_params::SimParams;
pub use snapshot::{EnsembleSnapshot, FrameStatistics};
pub use vecmath::Vec2;
