//! Synthetic street grids.
//!
//! Vertices sit on a `columns x rows` lattice, each displaced by a seeded
//! jitter. Horizontal and vertical neighbours are joined by a street unless
//! the street is dropped. Vertex `(col, row)` gets id `row * columns + col`.

use crate::{ExperimentError, GridConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use watchman_simulation::SimulationRunner;
use watchman_types::{Position, VertexId};

/// What a generated grid ended up containing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub vertices: usize,
    pub edges: usize,
    /// Diagonal of the bounding box of all vertices.
    pub diagonal: f64,
}

/// Fill `runner` with a grid and build its graph.
///
/// The same `grid` and `seed` always yield the same map.
pub fn populate_grid(
    runner: &mut SimulationRunner,
    grid: &GridConfig,
    seed: u64,
) -> Result<GridLayout, ExperimentError> {
    if grid.columns < 2 || grid.rows < 2 {
        return Err(ExperimentError::InvalidGrid(format!(
            "{}x{} has no streets",
            grid.columns, grid.rows
        )));
    }
    if !grid.spacing.is_finite() || grid.spacing <= 0.0 {
        return Err(ExperimentError::InvalidGrid(format!(
            "spacing {}",
            grid.spacing
        )));
    }
    if !(0.0..=1.0).contains(&grid.drop_ratio) {
        return Err(ExperimentError::InvalidGrid(format!(
            "drop ratio {}",
            grid.drop_ratio
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let offset = grid.jitter * grid.spacing;
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

    for row in 0..grid.rows {
        for col in 0..grid.columns {
            let (dx, dy) = if offset > 0.0 {
                (rng.gen_range(-offset..offset), rng.gen_range(-offset..offset))
            } else {
                (0.0, 0.0)
            };
            let x = col as f64 * grid.spacing + dx;
            let y = row as f64 * grid.spacing + dy;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            runner.add_vertex(vertex_id(grid, col, row), Position::new(x, y))?;
        }
    }

    let mut edges = 0;
    for row in 0..grid.rows {
        for col in 0..grid.columns {
            let here = vertex_id(grid, col, row);
            if col + 1 < grid.columns && !rng.gen_bool(grid.drop_ratio) {
                runner.add_edge(here, vertex_id(grid, col + 1, row))?;
                edges += 1;
            }
            if row + 1 < grid.rows && !rng.gen_bool(grid.drop_ratio) {
                runner.add_edge(here, vertex_id(grid, col, row + 1))?;
                edges += 1;
            }
        }
    }
    runner.build_graph()?;

    let layout = GridLayout {
        vertices: grid.vertex_count(),
        edges,
        diagonal: Position::new(min_x, min_y).distance(Position::new(max_x, max_y)),
    };
    debug!(
        vertices = layout.vertices,
        edges = layout.edges,
        diagonal = layout.diagonal,
        "Street grid generated"
    );
    Ok(layout)
}

fn vertex_id(grid: &GridConfig, col: u32, row: u32) -> VertexId {
    VertexId(row * grid.columns + col)
}
