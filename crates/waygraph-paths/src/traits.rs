use waygraph_core::Position;

use crate::distance::euclidean;

/// Estimate of the remaining cost between two positions.
///
/// Must never overestimate the true cost (admissible), otherwise the route
/// returned by a search is not guaranteed to be the cheapest one. With the
/// default [`Euclidean`] estimate this means every path cost must be at least
/// the straight-line distance between its endpoints.
pub trait Heuristic {
    /// Heuristic estimate of the cost from `from` to `to`. Must be >= 0.
    fn estimate(&self, from: Position, to: Position) -> f32;
}

/// Straight-line distance.
#[derive(Copy, Clone, Debug, Default)]
pub struct Euclidean;

impl Heuristic for Euclidean {
    #[inline]
    fn estimate(&self, from: Position, to: Position) -> f32 {
        euclidean(from, to)
    }
}

/// No estimate at all, turning the search into plain Dijkstra. Use it for
/// graphs whose path costs can be shorter than the distance they span.
#[derive(Copy, Clone, Debug, Default)]
pub struct Zero;

impl Heuristic for Zero {
    #[inline]
    fn estimate(&self, _from: Position, _to: Position) -> f32 {
        0.0
    }
}
