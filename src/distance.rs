//! Distance metrics for nearest neighbor queries.
//!
//! The search prunes a subtree by measuring the distance from the query to the query projected
//! onto the splitting planes that bound it. That distance is only a lower bound on the distance to
//! every point inside the subtree when the metric is a sum of independent per-axis terms, so every
//! metric used with a [`BucketKDTree`][crate::kdtree::BucketKDTree] must be separable,
//! non-negative and symmetric.

use crate::r#type::IndexableNum;

/// A trait for calculating distances between two k-dimensional points.
///
/// Implementations are not required to check that both slices have the same length; the tree
/// validates dimensionality before any distance is computed.
pub trait DistanceMetric<N: IndexableNum> {
    /// Calculate the distance between two points.
    fn distance(&self, a: &[N], b: &[N]) -> N;
}

/// Squared Euclidean distance.
///
/// The final square root is omitted. Queries only compare distances with each other, and the
/// square is strictly monotonic over non-negative values, so ranking is unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclideanDistance;

impl<N: IndexableNum> DistanceMetric<N> for SquaredEuclideanDistance {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        a.iter().zip(b).fold(N::zero(), |acc, (&x, &y)| {
            let d = x - y;
            acc + d * d
        })
    }
}

/// Manhattan (taxicab) distance: the sum of the absolute differences along each axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanDistance;

impl<N: IndexableNum> DistanceMetric<N> for ManhattanDistance {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        a.iter()
            .zip(b)
            .fold(N::zero(), |acc, (&x, &y)| acc + (x - y).abs())
    }
}

impl<N: IndexableNum, D: DistanceMetric<N> + ?Sized> DistanceMetric<N> for &D {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        (**self).distance(a, b)
    }
}
