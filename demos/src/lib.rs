//! Shared pieces for the waygraph demos: a generated waypoint town.
//!
//! The town is a jittered grid of waypoints. Neighbouring waypoints are
//! linked by paths costing their straight-line length times a small detour
//! factor, a few links are left out and a few become one-way streets.

use rand::{Rng, RngExt};
use waygraph_core::Position;
use waygraph_paths::{GraphData, GraphError, NodeId};

/// Waypoints per row.
pub const COLS: u32 = 12;
/// Waypoint rows.
pub const ROWS: u32 = 8;
/// Distance between grid lines before jitter.
pub const SPACING: f32 = 10.0;

/// Identity of the waypoint at grid cell (`col`, `row`).
pub fn waypoint(col: u32, row: u32) -> NodeId {
    NodeId(row * COLS + col)
}

/// Generate the demo town.
pub fn build_town(rng: &mut impl Rng) -> Result<GraphData, GraphError> {
    let mut graph = GraphData::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            let pos = Position::new(col as f32 * SPACING, row as f32 * SPACING, 0.0).shift(
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(0.0..1.0),
            );
            // Cells are added in identity order, so fresh ids match `waypoint`.
            graph.add_node(pos)?;
        }
    }

    for row in 0..ROWS {
        for col in 0..COLS {
            let here = waypoint(col, row);
            let mut neighbours = Vec::with_capacity(2);
            if col + 1 < COLS {
                neighbours.push(waypoint(col + 1, row));
            }
            if row + 1 < ROWS {
                neighbours.push(waypoint(col, row + 1));
            }
            for there in neighbours {
                // Leave out roughly one link in ten.
                if rng.random_range(0..10) == 0 {
                    continue;
                }
                let (Ok(a), Ok(b)) = (graph.node(here), graph.node(there)) else {
                    continue;
                };
                let cost = a.position.distance(b.position) * rng.random_range(1.0..1.3);
                let added = if rng.random_range(0..8) == 0 {
                    graph.add_one_way_path(here, there, cost)
                } else {
                    graph.add_path(here, there, cost)
                };
                if let Err(e) = added {
                    log::warn!("skipping link {here} - {there}: {e}");
                }
            }
        }
    }
    Ok(graph)
}
