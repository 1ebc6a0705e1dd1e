use crate::error::{Error, Result};
use gas_common::{EnsembleSnapshot, Vec2};

/// A rigid disk. The radius is shared by the whole ensemble and lives on [`Ensemble`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Center position.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }
}

/// Fixed-size ordered collection of particles. The index of a particle is its identity
/// for the lifetime of the run: the particle list can be mutated in place but never
/// grown, shrunk or reordered.
#[derive(Debug, Clone)]
pub struct Ensemble {
    particles: Vec<Particle>,
    radius: f64,
}

impl Ensemble {
    /// Creates an ensemble after validating that every component is finite.
    ///
    /// A radius of zero is accepted (point particles).
    pub fn new(particles: Vec<Particle>, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::Configuration(format!(
                "radius must be finite and non-negative (got {})",
                radius
            )));
        }
        if let Some(idx) = particles
            .iter()
            .position(|p| !p.position.is_finite() || !p.velocity.is_finite())
        {
            return Err(Error::Configuration(format!(
                "particle {} has a non-finite position or velocity",
                idx
            )));
        }
        Ok(Self { particles, radius })
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access for the stepper. A slice, so identity order cannot change.
    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn velocities(&self) -> Vec<Vec2> {
        self.particles.iter().map(|p| p.velocity).collect()
    }

    /// Copies the current state for the display layer or a state dump.
    pub fn snapshot(&self, tick: u64) -> EnsembleSnapshot {
        EnsembleSnapshot {
            tick,
            radius: self.radius,
            positions: self.positions(),
            velocities: self.velocities(),
        }
    }
}
