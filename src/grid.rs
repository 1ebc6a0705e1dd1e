use crate::ensemble::Particle;
use gas_common::{SimParams, Vec2};

// Calculates the (x, y) grid coordinates for a position, clamped to the grid
#[inline(always)]
fn get_grid_coords(pos: Vec2, params: &SimParams) -> (u32, u32) {
    let grid_x = (pos.x * params.inv_grid_cell_size).floor() as i64;
    let grid_y = (pos.y * params.inv_grid_cell_size).floor() as i64;
    // Clamp to grid dimensions to handle edge cases (x == width lands one past the last cell)
    let clamped_x = grid_x.clamp(0, params.grid_dim_x as i64 - 1) as u32;
    let clamped_y = grid_y.clamp(0, params.grid_dim_y as i64 - 1) as u32;
    (clamped_x, clamped_y)
}

// Calculates the 1D grid cell index for a given position
#[inline(always)]
pub fn get_grid_cell_idx(pos: Vec2, params: &SimParams) -> usize {
    let (x, y) = get_grid_coords(pos, params);
    y as usize * params.grid_dim_x as usize + x as usize
}

/// Uniform-grid broad phase with cells one diameter wide.
///
/// Built from the stored positions at the start of a tick. While particle `i` is being
/// processed, every particle `j > i` still sits where the grid recorded it, so
/// [`CollisionGrid::candidates_after`] returns a superset of the partners a brute-force
/// sweep would detect, in the same ascending order.
#[derive(Debug)]
pub struct CollisionGrid {
    // Grid cell index for each particle
    particle_grid_indices: Vec<usize>,
    // Number of particles in each grid cell
    cell_counts: Vec<u32>,
    // Start index in cell_particle_indices for each grid cell (prefix sum)
    cell_starts: Vec<u32>,
    // Particle indices sorted by grid cell, ascending within a cell
    cell_particle_indices: Vec<u32>,
}

impl CollisionGrid {
    pub fn new(params: &SimParams, num_particles: usize) -> Self {
        let num_grid_cells = params.num_grid_cells as usize;
        Self {
            particle_grid_indices: vec![0; num_particles],
            cell_counts: vec![0; num_grid_cells],
            cell_starts: vec![0; num_grid_cells],
            cell_particle_indices: vec![0; num_particles],
        }
    }

    /// Rebuilds the cell lists with a counting sort over the current positions.
    pub fn build(&mut self, particles: &[Particle], params: &SimParams) {
        let num_particles = particles.len();
        self.particle_grid_indices.resize(num_particles, 0);
        self.cell_particle_indices.resize(num_particles, 0);

        // Phase 1: Assign grid indices to each particle.
        for (grid_idx_out, p) in self.particle_grid_indices.iter_mut().zip(particles) {
            *grid_idx_out = get_grid_cell_idx(p.position, params);
        }

        // Phase 2: Count particles in each grid cell.
        self.cell_counts.iter_mut().for_each(|c| *c = 0);
        for &grid_idx in &self.particle_grid_indices {
            self.cell_counts[grid_idx] += 1;
        }

        // Phase 3: Calculate cell start indices using a prefix sum on cell counts.
        let mut total_sum = 0;
        for (start, &count) in self.cell_starts.iter_mut().zip(&self.cell_counts) {
            *start = total_sum;
            total_sum += count;
        }

        // Phase 4: Scatter particle indices. Visiting particles in index order keeps
        // each cell's block sorted.
        let mut write_offsets = self.cell_starts.clone();
        for (particle_idx, &grid_idx) in self.particle_grid_indices.iter().enumerate() {
            let slot = &mut write_offsets[grid_idx];
            self.cell_particle_indices[*slot as usize] = particle_idx as u32;
            *slot += 1;
        }
    }

    /// Helper to iterate over particles in the 3x3 cell region around `pos`.
    pub fn for_each_neighbor<F>(&self, pos: Vec2, params: &SimParams, mut f: F)
    where
        F: FnMut(usize),
    {
        let (center_x, center_y) = get_grid_coords(pos, params);
        let x_lo = center_x.saturating_sub(1);
        let y_lo = center_y.saturating_sub(1);
        let x_hi = (center_x + 1).min(params.grid_dim_x - 1);
        let y_hi = (center_y + 1).min(params.grid_dim_y - 1);

        for gy in y_lo..=y_hi {
            for gx in x_lo..=x_hi {
                let grid_idx = gy as usize * params.grid_dim_x as usize + gx as usize;
                let start = self.cell_starts[grid_idx] as usize;
                let end = start + self.cell_counts[grid_idx] as usize;
                for &neighbor_idx in &self.cell_particle_indices[start..end] {
                    f(neighbor_idx as usize);
                }
            }
        }
    }

    /// Fills `out` with the indices greater than `i` near `pos`, ascending.
    pub fn candidates_after(&self, i: usize, pos: Vec2, params: &SimParams, out: &mut Vec<usize>) {
        out.clear();
        self.for_each_neighbor(pos, params, |j| {
            if j > i {
                out.push(j);
            }
        });
        out.sort_unstable();
    }
}
