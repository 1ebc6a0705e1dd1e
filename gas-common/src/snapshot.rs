use serde::{Serialize, Deserialize};
use crate::vecmath::Vec2;

/// The ensemble state at the end of a tick, as handed to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSnapshot {
    /// Number of ticks completed when the snapshot was taken (0 = initial layout).
    pub tick: u64,
    /// Shared particle radius.
    pub radius: f64,
    /// Particle centers, indexed by particle identity.
    pub positions: Vec<Vec2>,
    /// Particle velocities, indexed by particle identity.
    pub velocities: Vec<Vec2>,
}

/// Thermodynamic quantities derived from the velocities of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStatistics {
    /// The tick these statistics belong to (1 = first step).
    pub tick: u64,
    /// |v| of every particle, indexed by particle identity.
    pub speeds: Vec<f64>,
    /// 1/2 m sum(|v|^2), in J when mass is in kg.
    pub total_kinetic_energy: f64,
    /// sum(|v|) / N.
    pub average_speed: f64,
    /// (2 / (3 k_B)) * (total_kinetic_energy / N).
    pub temperature: f64,
}
