//! Hard-disk gas engine: a 2D ensemble of equal-mass disks with elastic particle and wall
//! collisions, advanced one tick at a time, with per-tick thermodynamic statistics.

pub mod boundary;
pub mod collision;
pub mod ensemble;
pub mod error;
pub mod grid;
pub mod placement;
pub mod report;
pub mod simulation;
pub mod statistics;

pub use ensemble::{Ensemble, Particle};
pub use error::{Error, Result};
pub use report::{ReportFormat, RunReport};
pub use simulation::GasSimulation;
pub use statistics::{SpeedHistogram, StatisticsAggregator};
