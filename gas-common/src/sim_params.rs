use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // World
    pub world_width: f64,
    pub world_height: f64,

    // Particle Properties
    pub radius: f64,
    pub diameter: f64, // Contact distance between two centers
    pub diameter_sq: f64,
    pub mass: f64,
    pub boltzmann_constant: f64,

    // Placement window for initial centers
    pub placement_min_x: f64,
    pub placement_max_x: f64,
    pub placement_min_y: f64,
    pub placement_max_y: f64,

    // Broad-phase Grid
    pub grid_cell_size: f64,
    pub inv_grid_cell_size: f64,
    pub grid_dim_x: u32,
    pub grid_dim_y: u32,
    pub num_grid_cells: u64,

    // Time
    pub dt: f64, // Always one tick; positions advance by one velocity per tick
    pub frame_interval_secs: f64,

    /// Speed split over both axes by the thermal and speed rules.
    pub characteristic_speed: Option<f64>,
}
