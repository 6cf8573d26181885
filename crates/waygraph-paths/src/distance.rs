use waygraph_core::Position;

/// Straight-line (Euclidean) distance between two positions.
#[inline]
pub fn euclidean(a: Position, b: Position) -> f32 {
    a.distance(b)
}
