//! Branch-and-bound k-nearest-neighbor search.
//!
//! The search keeps the best `k` candidates found so far in a max-heap keyed by distance, so the
//! farthest accepted candidate is always at the top. At a split the side containing the query is
//! searched first. The other side is only searched if the query, moved onto the splitting plane,
//! is still closer than the farthest accepted candidate.
//!
//! The moved query accumulates as the search descends: every time the search crosses a plane,
//! the corresponding coordinate is snapped onto it. For separable metrics its distance to the
//! real query is then a lower bound on the distance to anything in the region being entered.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tinyvec::TinyVec;
use tracing::trace;

use crate::distance::DistanceMetric;
use crate::kdtree::node::{Bucket, Node, Split};
use crate::point::KDPoint;
use crate::r#type::IndexableNum;

/// A wrapper around a point and its distance for use in the priority queue.
#[derive(Debug)]
struct Candidate<'a, N: IndexableNum, E> {
    element: &'a E,
    dist: N,
}

impl<N: IndexableNum, E> PartialEq for Candidate<'_, N, E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N: IndexableNum, E> Eq for Candidate<'_, N, E> {}

impl<N: IndexableNum, E> Ord for Candidate<'_, N, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // NaN distances compare equal to everything rather than panicking
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
    }
}

impl<N: IndexableNum, E> PartialOrd for Candidate<'_, N, E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// State of a single k-nearest-neighbor query over one tree.
pub(crate) struct NeighborSearch<'a, 'q, N: IndexableNum, E, D: ?Sized> {
    target: &'q [N],
    k: usize,
    metric: &'q D,
    best: BinaryHeap<Candidate<'a, N, E>>,
    visited_buckets: usize,
    pruned_subtrees: usize,
}

impl<'a, 'q, N, E, D> NeighborSearch<'a, 'q, N, E, D>
where
    N: IndexableNum,
    E: KDPoint<N>,
    D: DistanceMetric<N> + ?Sized,
{
    pub(crate) fn new(target: &'q [N], k: usize, metric: &'q D) -> Self {
        Self {
            target,
            k,
            metric,
            best: BinaryHeap::new(),
            visited_buckets: 0,
            pruned_subtrees: 0,
        }
    }

    /// Run the search from `root`, returning up to `k` points closest-first with their
    /// distances.
    pub(crate) fn run(mut self, root: &'a Node<N, E>) -> Vec<(&'a E, N)> {
        if self.k == 0 {
            return vec![];
        }

        let mut closest: TinyVec<[N; 4]> = self.target.iter().copied().collect();
        self.visit(root, &mut closest);

        trace!(
            k = self.k,
            found = self.best.len(),
            visited_buckets = self.visited_buckets,
            pruned_subtrees = self.pruned_subtrees,
            "nearest neighbor search finished"
        );

        self.best
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.element, c.dist))
            .collect()
    }

    /// The distance of the farthest accepted candidate, or `None` while fewer than `k` have
    /// been found and nothing can be pruned yet.
    #[inline]
    fn farthest(&self) -> Option<N> {
        if self.best.len() < self.k {
            None
        } else {
            self.best.peek().map(|c| c.dist)
        }
    }

    #[inline]
    fn could_accept(&self, dist: N) -> bool {
        self.farthest().map_or(true, |farthest| dist < farthest)
    }

    fn accept(&mut self, element: &'a E, dist: N) {
        if self.best.len() >= self.k {
            self.best.pop();
        }
        self.best.push(Candidate { element, dist });
    }

    /// `closest` is the closest position to the target that the region of `node` could
    /// contain, as far as the planes crossed so far tell.
    fn visit(&mut self, node: &'a Node<N, E>, closest: &mut [N]) {
        match node {
            Node::Bucket(bucket) => self.visit_bucket(bucket),
            Node::Split(split) => self.visit_split(split, closest),
        }
    }

    fn visit_bucket(&mut self, bucket: &'a Bucket<E>) {
        self.visited_buckets += 1;
        for element in &bucket.points {
            let dist = self.metric.distance(self.target, element.coords());
            if self.could_accept(dist) {
                self.accept(element, dist);
            }
        }
    }

    fn visit_split(&mut self, split: &'a Split<N, E>, closest: &mut [N]) {
        let axis = split.axis;
        let (near, far) = if closest[axis] < split.median {
            (&split.left, &split.right)
        } else {
            (&split.right, &split.left)
        };

        self.visit(near, closest);

        let previous = closest[axis];
        closest[axis] = split.median;
        let boundary = self.metric.distance(self.target, closest);
        if self.could_accept(boundary) {
            self.visit(far, closest);
        } else {
            self.pruned_subtrees += 1;
        }
        closest[axis] = previous;
    }
}

#[cfg(test)]
mod test {
    use crate::distance::{ManhattanDistance, SquaredEuclideanDistance};
    use crate::kdtree::neighbors::NeighborSearch;
    use crate::kdtree::node::{Node, NodeOptions};
    use crate::point::Point;

    const OPTIONS: NodeOptions = NodeOptions {
        dimensions: 3,
        bucket_capacity: 2,
    };

    fn make_node() -> Node<f64, Point<f64, u32>> {
        let mut node = Node::empty(OPTIONS);
        for (c, data) in [
            ([0., 0., 0.], 1),
            ([1., 1., 1.], 2),
            ([2., 2., 2.], 3),
            ([-2., -2., -2.], 4),
        ] {
            node.insert(Point::new(&c, data), OPTIONS);
        }
        node
    }

    fn data(results: &[(&Point<f64, u32>, f64)]) -> Vec<u32> {
        results.iter().map(|(p, _)| *p.data()).collect()
    }

    #[test]
    fn nearest_is_exact_match() {
        let node = make_node();
        for (target, expected) in [
            ([0., 0., 0.], 1),
            ([1., 1., 1.], 2),
            ([2., 2., 2.], 3),
            ([-2., -2., -2.], 4),
        ] {
            let results = NeighborSearch::new(&target, 1, &SquaredEuclideanDistance).run(&node);
            assert_eq!(data(&results), vec![expected]);
            assert_eq!(results[0].1, 0.);
        }
    }

    #[test]
    fn results_are_closest_first() {
        let node = make_node();
        let target = [-2., -2., -2.];
        let results = NeighborSearch::new(&target, 4, &SquaredEuclideanDistance).run(&node);
        assert_eq!(data(&results), vec![4, 1, 2, 3]);
        let dists: Vec<f64> = results.iter().map(|(_, d)| *d).collect();
        assert_eq!(dists, vec![0., 12., 27., 48.]);
    }

    #[test]
    fn three_nearest_excludes_farthest() {
        let node = make_node();
        let target = [2., 2., 2.];
        let results = NeighborSearch::new(&target, 3, &SquaredEuclideanDistance).run(&node);
        assert_eq!(data(&results), vec![3, 2, 1]);
    }

    #[test]
    fn k_larger_than_tree_returns_everything() {
        let node = make_node();
        let target = [10., -3., 0.5];
        let results = NeighborSearch::new(&target, 10, &ManhattanDistance).run(&node);
        let mut found = data(&results);
        found.sort();
        assert_eq!(found, vec![1, 2, 3, 4]);
    }

    #[test]
    fn k_zero_returns_nothing() {
        let node = make_node();
        let target = [0., 0., 0.];
        let results = NeighborSearch::new(&target, 0, &SquaredEuclideanDistance).run(&node);
        assert!(results.is_empty());
    }

    #[test]
    fn empty_node_returns_nothing() {
        let node: Node<f64, Point<f64, u32>> = Node::empty(OPTIONS);
        let target = [0., 0., 0.];
        let results = NeighborSearch::new(&target, 3, &SquaredEuclideanDistance).run(&node);
        assert!(results.is_empty());
    }

    #[test]
    fn prunes_far_side() {
        // Two well separated clusters; a query inside one never needs the other.
        let options = NodeOptions {
            dimensions: 2,
            bucket_capacity: 4,
        };
        let mut node = Node::empty(options);
        for i in 0..4 {
            let offset = i as f64 * 0.1;
            node.insert(Point::new(&[offset, offset], i), options);
            node.insert(Point::new(&[100. + offset, offset], 10 + i), options);
        }
        assert!(!node.is_leaf());

        let target = [0.05, 0.05];
        let mut search = NeighborSearch::new(&target, 2, &SquaredEuclideanDistance);
        let mut closest = target;
        search.visit(&node, &mut closest);
        assert_eq!(search.pruned_subtrees, 1);
        assert_eq!(search.visited_buckets, 1);
        assert_eq!(closest, target, "closest position is restored after the search");
    }
}
