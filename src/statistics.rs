use gas_common::{FrameStatistics, Vec2};
use serde::{Deserialize, Serialize};

/// Computes the thermodynamic quantities of one frame from its velocity list.
///
/// Temperature uses the three-degree-of-freedom ideal-gas relation
/// `T = (2 / (3 k_B)) * (KE / N)`, which inverts the thermal speed rule
/// `v = sqrt(3 k_B T / m)` used for initial velocities.
pub fn frame_statistics(tick: u64, velocities: &[Vec2], mass: f64, boltzmann_constant: f64) -> FrameStatistics {
    let speeds: Vec<f64> = velocities.iter().map(|v| v.length()).collect();
    let speed_sum: f64 = speeds.iter().sum();
    let speed_sq_sum: f64 = speeds.iter().map(|s| s * s).sum();

    let total_kinetic_energy = 0.5 * mass * speed_sq_sum;
    let (average_speed, temperature) = if speeds.is_empty() {
        (0.0, 0.0)
    } else {
        let n = speeds.len() as f64;
        let average_kinetic_energy = total_kinetic_energy / n;
        (speed_sum / n, (2.0 / (3.0 * boltzmann_constant)) * average_kinetic_energy)
    };

    FrameStatistics {
        tick,
        speeds,
        total_kinetic_energy,
        average_speed,
        temperature,
    }
}

/// Turns per-tick velocities into [`FrameStatistics`] and keeps the run's average-speed series.
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    mass: f64,
    boltzmann_constant: f64,
    average_speed_series: Vec<f64>,
    last_frame: Option<FrameStatistics>,
}

impl StatisticsAggregator {
    pub fn new(mass: f64, boltzmann_constant: f64) -> Self {
        Self {
            mass,
            boltzmann_constant,
            average_speed_series: Vec::new(),
            last_frame: None,
        }
    }

    /// Computes this tick's statistics and appends its average speed to the series.
    pub fn record(&mut self, tick: u64, velocities: &[Vec2]) -> FrameStatistics {
        let stats = frame_statistics(tick, velocities, self.mass, self.boltzmann_constant);
        self.average_speed_series.push(stats.average_speed);
        self.last_frame = Some(stats.clone());
        stats
    }

    /// Average speed of every recorded tick, oldest first.
    pub fn average_speed_series(&self) -> &[f64] {
        &self.average_speed_series
    }

    pub fn last_frame(&self) -> Option<&FrameStatistics> {
        self.last_frame.as_ref()
    }

    /// Per-particle speeds of the most recent tick (empty before the first tick).
    pub fn final_speeds(&self) -> &[f64] {
        self.last_frame.as_ref().map(|f| f.speeds.as_slice()).unwrap_or(&[])
    }
}

/// Speed distribution binned for an external histogram plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedHistogram {
    /// `bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    /// Sample count per bin; the last bin includes its right edge.
    pub counts: Vec<u32>,
}

/// Bins `speeds` into `bins` equal-width bins spanning their min..max.
///
/// When every sample is equal the range is widened to `value ± 0.5`; an empty input spans 0..1.
pub fn speed_histogram(speeds: &[f64], bins: usize) -> SpeedHistogram {
    let bins = bins.max(1);
    let (mut lo, mut hi) = speeds
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    if speeds.is_empty() {
        lo = 0.0;
        hi = 1.0;
    } else if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|k| lo + width * k as f64).collect();
    let mut counts = vec![0u32; bins];
    for &s in speeds {
        let bin = (((s - lo) / width).floor() as usize).min(bins - 1);
        counts[bin] += 1;
    }
    SpeedHistogram { edges, counts }
}
