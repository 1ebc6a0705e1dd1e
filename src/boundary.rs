use crate::ensemble::Particle;

/// Walls touched by a particle during one reflection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WallHits {
    pub min_x: bool,
    pub max_x: bool,
    pub min_y: bool,
    pub max_y: bool,
}

impl WallHits {
    pub fn count(&self) -> u32 {
        self.min_x as u32 + self.max_x as u32 + self.min_y as u32 + self.max_y as u32
    }
}

/// Keeps a particle's extent inside `[0, width] x [0, height]`.
///
/// Each axis is handled on its own: when the lower edge (`center - radius`) is below 0
/// the center is clamped so the edge sits at 0 and that velocity component is negated;
/// otherwise, when the upper edge passes the wall, the center is clamped so the edge sits
/// on the wall and the component is negated. Reflection is exact, speed is unchanged.
pub fn reflect(particle: &mut Particle, radius: f64, width: f64, height: f64) -> WallHits {
    let (min_x, max_x) = reflect_axis(&mut particle.position.x, &mut particle.velocity.x, radius, width);
    let (min_y, max_y) = reflect_axis(&mut particle.position.y, &mut particle.velocity.y, radius, height);
    WallHits { min_x, max_x, min_y, max_y }
}

#[inline]
fn reflect_axis(position: &mut f64, velocity: &mut f64, radius: f64, extent: f64) -> (bool, bool) {
    if *position - radius < 0.0 {
        *position = radius;
        *velocity = -*velocity;
        (true, false)
    } else if *position + radius > extent {
        *position = extent - radius;
        *velocity = -*velocity;
        (false, true)
    } else {
        (false, false)
    }
}
