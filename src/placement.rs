use crate::ensemble::{Ensemble, Particle};
use crate::error::{Error, Result};
use gas_common::{SimParams, SimulationConfig, SpeedRule, Vec2};
use log::{debug, info, warn};
use rand::prelude::*;
use rand_distr::Normal;

/// Builds the initial ensemble: non-overlapping centers, then one velocity per particle.
pub fn build_ensemble(config: &SimulationConfig, rng: &mut StdRng) -> Result<Ensemble> {
    let params = config.get_sim_params();
    let count = config.particles.count as usize;

    let positions = place_initial_particles(
        &params,
        count,
        config.particles.max_placement_attempts,
        rng,
    )?;
    info!("Placed {} particles without overlap.", positions.len());

    if let Some(speed) = params.characteristic_speed {
        if speed.abs() > params.diameter {
            warn!(
                "Characteristic speed {:.3} per tick exceeds the particle diameter {:.3}; fast pairs can pass through each other between ticks.",
                speed, params.diameter
            );
        }
    }

    let mut particles = Vec::with_capacity(count);
    for position in positions {
        let velocity = initial_velocity(&config.initial_velocity, &params, rng)?;
        particles.push(Particle::new(position, velocity));
    }
    Ensemble::new(particles, params.radius)
}

/// Rejection-samples `count` centers so that every pair is at least one diameter apart.
///
/// Candidates are drawn uniformly from the placement window in `params`. Each particle
/// gets at most `max_attempts` draws; running out means the requested density is too
/// close to the packing limit and is reported as a configuration error.
pub fn place_initial_particles(
    params: &SimParams,
    count: usize,
    max_attempts: u32,
    rng: &mut StdRng,
) -> Result<Vec<Vec2>> {
    let (x_min, x_max) = (params.placement_min_x, params.placement_max_x);
    let (y_min, y_max) = (params.placement_min_y, params.placement_max_y);
    if !(x_min <= x_max && y_min <= y_max) {
        return Err(Error::Configuration(format!(
            "placement window [{}, {}] x [{}, {}] is empty; reduce radius or placement margin",
            x_min, x_max, y_min, y_max
        )));
    }

    let mut positions: Vec<Vec2> = Vec::with_capacity(count);
    let mut total_draws: u64 = 0;
    for idx in 0..count {
        let mut attempts = 0u32;
        let candidate = loop {
            if attempts >= max_attempts {
                return Err(Error::Configuration(format!(
                    "failed to place particle {} of {} without overlap after {} attempts; try fewer particles, a smaller radius or a larger arena",
                    idx, count, max_attempts
                )));
            }
            attempts += 1;
            let candidate = Vec2::new(
                rng.random_range(x_min..=x_max),
                rng.random_range(y_min..=y_max),
            );
            if !overlaps_existing(&positions, candidate, params.diameter_sq) {
                break candidate;
            }
        };
        total_draws += attempts as u64;
        positions.push(candidate);
    }
    debug!(
        "Placement used {} draws for {} particles ({:.2} per particle).",
        total_draws,
        count,
        if count > 0 { total_draws as f64 / count as f64 } else { 0.0 }
    );
    Ok(positions)
}

fn overlaps_existing(existing: &[Vec2], candidate: Vec2, min_dist_sq: f64) -> bool {
    existing
        .iter()
        .any(|p| p.distance_squared(candidate) < min_dist_sq)
}

/// Draws one initial velocity according to `rule`.
///
/// A component that comes out exactly zero is replaced by a random unit sign so that no
/// particle starts frozen along an axis.
pub fn initial_velocity(rule: &SpeedRule, params: &SimParams, rng: &mut StdRng) -> Result<Vec2> {
    let raw = match *rule {
        SpeedRule::Thermal { .. } | SpeedRule::Speed { .. } => {
            let speed = params.characteristic_speed.unwrap_or(0.0);
            let component = speed / std::f64::consts::SQRT_2;
            Vec2::new(component, component)
        }
        SpeedRule::Components { vx, vy } => Vec2::new(vx, vy),
        SpeedRule::Maxwell { temperature } => {
            let sigma = (params.boltzmann_constant * temperature / params.mass).sqrt();
            let normal = Normal::new(0.0, sigma).map_err(|e| {
                Error::Configuration(format!("invalid Maxwell velocity spread {}: {}", sigma, e))
            })?;
            Vec2::new(rng.sample(normal), rng.sample(normal))
        }
    };
    Ok(Vec2::new(
        replace_zero_with_sign(raw.x, rng),
        replace_zero_with_sign(raw.y, rng),
    ))
}

fn replace_zero_with_sign(component: f64, rng: &mut StdRng) -> f64 {
    if component == 0.0 {
        if rng.random::<bool>() { 1.0 } else { -1.0 }
    } else {
        component
    }
}
