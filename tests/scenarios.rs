use gas_common::{SimulationConfig, Vec2};
use gas_engine::boundary::{self, WallHits};
use gas_engine::collision::{self, PairOutcome};
use gas_engine::error::Result;
use gas_engine::{GasSimulation, Particle};

fn ten_by_ten(count: u32, radius: f64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.arena.width = 10.0;
    config.arena.height = 10.0;
    config.particles.count = count;
    config.particles.radius = radius;
    config.particles.mass = 1.0;
    config.physics.boltzmann_constant = 1.0;
    config
}

fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        (actual - expected).length() < 1e-12,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

/// Two radius-1 disks 1.5 apart approaching head-on exchange velocities.
#[test]
fn head_on_pair_swaps_velocities() {
    let mut a = Particle::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
    let mut b = Particle::new(Vec2::new(1.5, 0.0), Vec2::new(-1.0, 0.0));
    assert_eq!(collision::resolve_pair(&mut a, &mut b, 2.0), PairOutcome::Resolved);
    assert_close(a.velocity, Vec2::new(-1.0, 0.0));
    assert_close(b.velocity, Vec2::new(1.0, 0.0));
}

/// One tick with unit time step away from any wall.
#[test]
fn single_particle_free_flight() -> Result<()> {
    let particles = vec![Particle::new(Vec2::new(5.0, 5.0), Vec2::new(-3.0, 0.0))];
    let mut sim = GasSimulation::from_particles(ten_by_ten(1, 1.0), particles)?;
    let (snap, stats) = sim.step()?;
    assert_eq!(snap.positions, vec![Vec2::new(2.0, 5.0)]);
    assert_eq!(snap.velocities, vec![Vec2::new(-3.0, 0.0)]);
    assert_eq!(sim.wall_hits(), 0);
    assert_eq!(stats.average_speed, 3.0);
    Ok(())
}

/// A point extent moved from (1, 5) to (-2, 5) is clamped onto the left wall.
#[test]
fn left_wall_clamp_for_point_extent() {
    let mut p = Particle::new(Vec2::new(1.0, 5.0), Vec2::new(-3.0, 0.0));
    p.position += p.velocity;
    assert_eq!(p.position, Vec2::new(-2.0, 5.0));
    let hits = boundary::reflect(&mut p, 0.0, 10.0, 10.0);
    assert_eq!(hits, WallHits { min_x: true, ..Default::default() });
    assert_eq!(p.position, Vec2::new(0.0, 5.0));
    assert_eq!(p.velocity, Vec2::new(3.0, 0.0));
}

/// The same crossing through the stepper with a finite radius leaves the edge on the wall.
#[test]
fn left_wall_clamp_through_step() -> Result<()> {
    let particles = vec![Particle::new(Vec2::new(1.0, 5.0), Vec2::new(-3.0, 0.0))];
    let mut sim = GasSimulation::from_particles(ten_by_ten(1, 0.5), particles)?;
    let (snap, _) = sim.step()?;
    assert_eq!(snap.positions, vec![Vec2::new(0.5, 5.0)]);
    assert_eq!(snap.velocities, vec![Vec2::new(3.0, 0.0)]);
    assert_eq!(sim.wall_hits(), 1);

    // Next tick it travels freely to the right.
    let (snap, _) = sim.step()?;
    assert_eq!(snap.positions, vec![Vec2::new(3.5, 5.0)]);
    Ok(())
}

/// A corner crossing flips both components in the same tick.
#[test]
fn corner_crossing_reflects_both_axes() -> Result<()> {
    let particles = vec![Particle::new(Vec2::new(9.0, 9.5), Vec2::new(2.0, 1.0))];
    let mut sim = GasSimulation::from_particles(ten_by_ten(1, 0.5), particles)?;
    let (snap, _) = sim.step()?;
    assert_eq!(snap.positions, vec![Vec2::new(9.5, 9.5)]);
    assert_eq!(snap.velocities, vec![Vec2::new(-2.0, -1.0)]);
    assert_eq!(sim.wall_hits(), 2);
    Ok(())
}
