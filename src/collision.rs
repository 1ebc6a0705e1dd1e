use crate::ensemble::Particle;
use crate::error::Error;
use gas_common::Vec2;
use log::warn;

/// Result of testing one particle pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Centers at least one diameter apart.
    Separate,
    /// Overlapping; velocities exchanged along the line of centers.
    Resolved,
    /// Overlapping with coincident centers; velocities left unchanged.
    Degenerate,
}

/// Collision counts for one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollisionTally {
    pub resolved: u64,
    pub degenerate: u64,
}

impl CollisionTally {
    fn record(&mut self, outcome: PairOutcome) {
        match outcome {
            PairOutcome::Resolved => self.resolved += 1,
            PairOutcome::Degenerate => self.degenerate += 1,
            PairOutcome::Separate => {}
        }
    }
}

/// True when two centers are closer than `diameter`.
#[inline]
pub fn in_contact(a: Vec2, b: Vec2, diameter: f64) -> bool {
    a.distance(b) < diameter
}

/// Post-collision velocities for two equal-mass disks.
///
/// ```text
/// v1' = v1 - [(v1 - v2) . (x1 - x2) / |x1 - x2|^2] (x1 - x2)
/// v2' = v2 - [(v2 - v1) . (x2 - x1) / |x2 - x1|^2] (x2 - x1)
/// ```
///
/// Returns `None` when the centers coincide and the impulse direction is undefined.
pub fn elastic_velocities(x1: Vec2, v1: Vec2, x2: Vec2, v2: Vec2) -> Option<(Vec2, Vec2)> {
    let sep = x1 - x2;
    let dist_sq = sep.length_squared();
    if dist_sq == 0.0 {
        return None;
    }
    let v1_new = v1 - sep * ((v1 - v2).dot(sep) / dist_sq);
    let sep_rev = -sep;
    let v2_new = v2 - sep_rev * ((v2 - v1).dot(sep_rev) / dist_sq);
    Some((v1_new, v2_new))
}

/// Tests one pair and, if the disks overlap, updates both velocities in place.
///
/// Positions are not corrected: overlapping disks are left to separate under their new
/// velocities on the following ticks.
pub fn resolve_pair(a: &mut Particle, b: &mut Particle, diameter: f64) -> PairOutcome {
    if !in_contact(a.position, b.position, diameter) {
        return PairOutcome::Separate;
    }
    match elastic_velocities(a.position, a.velocity, b.position, b.velocity) {
        Some((va, vb)) => {
            a.velocity = va;
            b.velocity = vb;
            PairOutcome::Resolved
        }
        None => PairOutcome::Degenerate,
    }
}

/// Resolves particle `i` against each index in `partners`, in the order given.
///
/// `partners` must yield indices greater than `i` in ascending order. `i`'s velocity is
/// updated sequentially, so a later partner sees the result of earlier ones.
pub fn resolve_against_later<I>(
    particles: &mut [Particle],
    i: usize,
    partners: I,
    diameter: f64,
    tick: u64,
) -> CollisionTally
where
    I: IntoIterator<Item = usize>,
{
    let mut tally = CollisionTally::default();
    for j in partners {
        debug_assert!(j > i, "partner {} must follow particle {}", j, i);
        let (head, tail) = particles.split_at_mut(j);
        let outcome = resolve_pair(&mut head[i], &mut tail[0], diameter);
        if outcome == PairOutcome::Degenerate {
            warn!("{}; velocity update skipped", Error::DegenerateCollision { tick, i, j });
        }
        tally.record(outcome);
    }
    tally
}

/// Brute-force sweep over every unordered pair `(i, j)`, `i < j`, in index order.
pub fn resolve_all_pairs(particles: &mut [Particle], diameter: f64, tick: u64) -> CollisionTally {
    let n = particles.len();
    let mut tally = CollisionTally::default();
    for i in 0..n {
        let sweep = resolve_against_later(particles, i, (i + 1)..n, diameter, tick);
        tally.resolved += sweep.resolved;
        tally.degenerate += sweep.degenerate;
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    const TOL: f64 = 1e-9;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() <= TOL * (1.0 + a.length().max(b.length()))
    }

    #[test]
    fn head_on_equal_mass_swaps_velocities() {
        let mut a = Particle::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let mut b = Particle::new(Vec2::new(1.5, 0.0), Vec2::new(-1.0, 0.0));
        let outcome = resolve_pair(&mut a, &mut b, 2.0);
        assert_eq!(outcome, PairOutcome::Resolved);
        assert!(close(a.velocity, Vec2::new(-1.0, 0.0)), "got {:?}", a.velocity);
        assert!(close(b.velocity, Vec2::new(1.0, 0.0)), "got {:?}", b.velocity);
    }

    #[test]
    fn separated_pair_untouched() {
        let mut a = Particle::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let mut b = Particle::new(Vec2::new(2.0, 0.0), Vec2::new(-1.0, 0.0));
        // Exactly one diameter apart is not a contact
        assert_eq!(resolve_pair(&mut a, &mut b, 2.0), PairOutcome::Separate);
        assert_eq!(a.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(b.velocity, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn coincident_centers_skip_update() {
        let x = Vec2::new(3.0, 3.0);
        let mut a = Particle::new(x, Vec2::new(0.7, -0.2));
        let mut b = Particle::new(x, Vec2::new(-0.1, 0.4));
        assert_eq!(resolve_pair(&mut a, &mut b, 2.0), PairOutcome::Degenerate);
        assert_eq!(a.velocity, Vec2::new(0.7, -0.2));
        assert_eq!(b.velocity, Vec2::new(-0.1, 0.4));
        assert!(elastic_velocities(x, a.velocity, x, b.velocity).is_none());
    }

    #[test]
    fn pair_formula_conserves_momentum_and_energy() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..500 {
            let x1 = Vec2::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
            let x2 = Vec2::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
            let v1 = Vec2::new(rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0));
            let v2 = Vec2::new(rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0));
            let (w1, w2) = elastic_velocities(x1, v1, x2, v2).expect("distinct centers");

            assert!(close(w1 + w2, v1 + v2), "momentum drift: {:?} vs {:?}", w1 + w2, v1 + v2);
            let e0 = v1.length_squared() + v2.length_squared();
            let e1 = w1.length_squared() + w2.length_squared();
            assert!((e1 - e0).abs() <= TOL * (1.0 + e0), "energy drift: {} vs {}", e1, e0);
        }
    }

    #[test]
    fn oblique_collision_keeps_tangential_components() {
        // Line of centers along y; x components are tangential
        let (w1, w2) = elastic_velocities(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.3, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-0.2, -0.5),
        )
        .unwrap();
        assert!(close(w1, Vec2::new(0.3, -0.5)));
        assert!(close(w2, Vec2::new(-0.2, 1.0)));
    }

    #[test]
    fn sequential_resolution_is_order_dependent() {
        // Particle 0 touches both 1 and 2; 0 is resolved against 1 first, then 2.
        let mut particles = vec![
            Particle::new(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0)),
            Particle::new(Vec2::new(6.5, 5.0), Vec2::new(0.0, 0.0)),
            Particle::new(Vec2::new(5.0, 6.5), Vec2::new(0.0, -1.0)),
        ];
        let tally = resolve_against_later(&mut particles, 0, [1, 2], 2.0, 1);
        assert_eq!(tally, CollisionTally { resolved: 2, degenerate: 0 });
        // Against 1: 0 hands its x velocity over and stops; against 2: swaps y components.
        assert!(close(particles[0].velocity, Vec2::new(0.0, -1.0)));
        assert!(close(particles[1].velocity, Vec2::new(1.0, 0.0)));
        assert!(close(particles[2].velocity, Vec2::new(0.0, 0.0)));

        let total: Vec2 = particles.iter().fold(Vec2::default(), |acc, p| acc + p.velocity);
        assert!(close(total, Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn brute_force_counts_degenerate_pairs() {
        let mut particles = vec![
            Particle::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)),
            Particle::new(Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)),
            Particle::new(Vec2::new(9.0, 9.0), Vec2::new(0.0, 0.5)),
        ];
        let tally = resolve_all_pairs(&mut particles, 1.0, 7);
        assert_eq!(tally, CollisionTally { resolved: 0, degenerate: 1 });
        assert_eq!(particles[0].velocity, Vec2::new(1.0, 0.0));
        assert_eq!(particles[1].velocity, Vec2::new(0.0, 1.0));
    }
}
