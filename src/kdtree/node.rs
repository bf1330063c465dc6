//! The recursive structure of a [`BucketKDTree`][crate::kdtree::BucketKDTree].
//!
//! A node is either a [`Bucket`] holding points directly, or a [`Split`] dividing its region in
//! two along a single axis. Every tree starts as one empty bucket. When a full bucket receives
//! another point it is replaced by a split over its widest axis, unless its points cannot be
//! separated, in which case its capacity is doubled instead.

use std::iter;
use std::mem;

use tracing::debug;

use crate::point::KDPoint;
use crate::r#type::IndexableNum;

/// Parameters shared by every node of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeOptions {
    pub(crate) dimensions: usize,
    /// Capacity of every freshly created bucket.
    pub(crate) bucket_capacity: usize,
}

/// A node in a [`BucketKDTree`][crate::kdtree::BucketKDTree].
#[derive(Debug, Clone)]
pub enum Node<N: IndexableNum, E> {
    /// A leaf region holding its points in insertion order.
    Bucket(Bucket<E>),
    /// An internal region divided in two by an axis-aligned plane.
    Split(Split<N, E>),
}

/// A leaf region holding up to `capacity` points.
#[derive(Debug, Clone)]
pub struct Bucket<E> {
    pub(crate) capacity: usize,
    pub(crate) points: Vec<E>,
}

/// An internal region divided by the plane `coords[axis] == median`.
///
/// Every point under `left` has `coords[axis] < median`; every point under `right` has
/// `coords[axis] >= median`.
#[derive(Debug, Clone)]
pub struct Split<N: IndexableNum, E> {
    pub(crate) axis: usize,
    pub(crate) median: N,
    pub(crate) left: Box<Node<N, E>>,
    pub(crate) right: Box<Node<N, E>>,
}

impl<N: IndexableNum, E: KDPoint<N>> Node<N, E> {
    pub(crate) fn empty(options: NodeOptions) -> Self {
        Node::Bucket(Bucket::new(options.bucket_capacity))
    }

    /// Insert a point, replacing this node with a split if a bucket overflows.
    pub(crate) fn insert(&mut self, element: E, options: NodeOptions) {
        match self {
            Node::Split(split) => split.insert(element, options),
            Node::Bucket(bucket) => {
                if let Some(split) = bucket.insert(element, options) {
                    *self = Node::Split(split);
                }
            }
        }
    }

    /// Remove and return the first point, in iteration order, matching `predicate`.
    pub(crate) fn remove_where<F>(&mut self, predicate: &mut F) -> Option<E>
    where
        F: FnMut(&E) -> bool,
    {
        match self {
            Node::Bucket(bucket) => {
                let index = bucket.points.iter().position(|e| predicate(e))?;
                Some(bucket.points.remove(index))
            }
            Node::Split(split) => split
                .left
                .remove_where(predicate)
                .or_else(|| split.right.remove_where(predicate)),
        }
    }

    /// Keep only the points matching `predicate`, returning how many were removed.
    pub(crate) fn retain<F>(&mut self, predicate: &mut F) -> usize
    where
        F: FnMut(&E) -> bool,
    {
        match self {
            Node::Bucket(bucket) => {
                let before = bucket.points.len();
                bucket.points.retain(|e| predicate(e));
                before - bucket.points.len()
            }
            Node::Split(split) => split.left.retain(predicate) + split.right.retain(predicate),
        }
    }
}

impl<N: IndexableNum, E> Node<N, E> {
    /// The number of points reachable from this node.
    pub fn len(&self) -> usize {
        match self {
            Node::Bucket(bucket) => bucket.points.len(),
            Node::Split(split) => split.left.len() + split.right.len(),
        }
    }

    /// Returns `true` if no points are reachable from this node.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of levels below and including this node. A lone bucket has height 1.
    pub fn height(&self) -> usize {
        match self {
            Node::Bucket(_) => 1,
            Node::Split(split) => 1 + split.left.height().max(split.right.height()),
        }
    }

    /// The number of buckets reachable from this node.
    pub fn num_buckets(&self) -> usize {
        match self {
            Node::Bucket(_) => 1,
            Node::Split(split) => split.left.num_buckets() + split.right.num_buckets(),
        }
    }

    /// Returns `true` if this is a bucket without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Bucket(_))
    }

    /// This node as a bucket, if it is one.
    pub fn as_bucket(&self) -> Option<&Bucket<E>> {
        match self {
            Node::Bucket(bucket) => Some(bucket),
            Node::Split(_) => None,
        }
    }

    /// This node as a split, if it is one.
    pub fn as_split(&self) -> Option<&Split<N, E>> {
        match self {
            Node::Split(split) => Some(split),
            Node::Bucket(_) => None,
        }
    }
}

impl<E> Bucket<E> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: Vec::with_capacity(capacity),
        }
    }

    /// The number of points this bucket holds before it must split or grow.
    ///
    /// This starts at the tree's bucket capacity and doubles each time the bucket overflows with
    /// points that cannot be separated.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The points in this bucket, in insertion order.
    pub fn points(&self) -> &[E] {
        &self.points
    }

    /// The number of points in this bucket.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if this bucket holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Store a point, or hand back the split that must replace this bucket.
    fn insert<N>(&mut self, element: E, options: NodeOptions) -> Option<Split<N, E>>
    where
        N: IndexableNum,
        E: KDPoint<N>,
    {
        if self.points.len() < self.capacity {
            self.points.push(element);
            return None;
        }

        match split_plane(&self.points, &element, options.dimensions) {
            Some((axis, median)) => {
                debug!(
                    axis,
                    median = ?median,
                    num_points = self.points.len() + 1,
                    "splitting bucket"
                );
                let points = mem::take(&mut self.points);
                let mut split = Split::new(axis, median, options);
                for e in points.into_iter().chain(iter::once(element)) {
                    split.insert(e, options);
                }
                Some(split)
            }
            None => {
                // Nothing separates these points, so splitting would recurse forever.
                self.capacity *= 2;
                debug!(
                    capacity = self.capacity,
                    "growing bucket with inseparable points"
                );
                self.points.push(element);
                None
            }
        }
    }
}

impl<N: IndexableNum, E> Split<N, E> {
    /// The axis that the children of this node are split over.
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// The coordinate of the splitting plane on [`axis`][Self::axis].
    pub fn median(&self) -> N {
        self.median
    }

    /// The child holding points with `coords[axis] < median`.
    pub fn left(&self) -> &Node<N, E> {
        &self.left
    }

    /// The child holding points with `coords[axis] >= median`.
    pub fn right(&self) -> &Node<N, E> {
        &self.right
    }
}

impl<N: IndexableNum, E: KDPoint<N>> Split<N, E> {
    fn new(axis: usize, median: N, options: NodeOptions) -> Self {
        Self {
            axis,
            median,
            left: Box::new(Node::empty(options)),
            right: Box::new(Node::empty(options)),
        }
    }

    fn insert(&mut self, element: E, options: NodeOptions) {
        if element.coords()[self.axis] < self.median {
            self.left.insert(element, options);
        } else {
            self.right.insert(element, options);
        }
    }
}

/// Choose the plane splitting an overflowing bucket.
///
/// The axis is the one along which the bucket's current points spread the most, the first such
/// axis on ties. The plane lies halfway between the extremes on that axis. Returns `None` if the
/// plane would leave either side empty once `incoming` is included.
fn split_plane<N, E>(points: &[E], incoming: &E, dimensions: usize) -> Option<(usize, N)>
where
    N: IndexableNum,
    E: KDPoint<N>,
{
    let first = points.first()?.coords();

    let mut best: Option<(usize, N)> = None;
    let mut max_range = N::neg_infinity();
    for axis in 0..dimensions {
        let mut min = first[axis];
        let mut max = min;
        for point in &points[1..] {
            let value = point.coords()[axis];
            if value < min {
                min = value;
            } else if value > max {
                max = value;
            }
        }

        let range = max - min;
        if range > max_range {
            max_range = range;
            best = Some((axis, min + range / (N::one() + N::one())));
        }
    }

    let (axis, median) = best?;
    let num_left = points
        .iter()
        .chain(iter::once(incoming))
        .filter(|e| e.coords()[axis] < median)
        .count();
    if num_left == 0 || num_left == points.len() + 1 {
        return None;
    }

    Some((axis, median))
}

#[cfg(test)]
mod test {
    use crate::kdtree::node::{split_plane, Node, NodeOptions};
    use crate::point::{KDPoint, Point};

    const OPTIONS: NodeOptions = NodeOptions {
        dimensions: 3,
        bucket_capacity: 2,
    };

    fn p(coords: [f64; 3], data: u32) -> Point<f64, u32> {
        Point::new(&coords, data)
    }

    #[test]
    fn bucket_accepts_points_up_to_capacity() {
        let mut node = Node::empty(OPTIONS);
        node.insert(p([0., 0., 0.], 1), OPTIONS);
        node.insert(p([1., 1., 1.], 2), OPTIONS);
        assert!(node.is_leaf());
        assert_eq!(node.len(), 2);
        assert_eq!(node.as_bucket().unwrap().capacity(), 2);
    }

    #[test]
    fn overflowing_bucket_becomes_split() {
        let mut node = Node::empty(OPTIONS);
        for (i, c) in [[0., 0., 0.], [1., 1., 1.], [2., 2., 2.]].into_iter().enumerate() {
            node.insert(p(c, i as u32), OPTIONS);
            assert_eq!(node.len(), i + 1);
        }

        let split = node.as_split().expect("third point should split the bucket");
        // All axes spread equally, so the first one wins.
        assert_eq!(split.axis(), 0);
        assert_eq!(split.median(), 0.5);
        assert_eq!(split.left().len(), 1);
        assert_eq!(split.right().len(), 2);
        for e in split.left().as_bucket().unwrap().points() {
            assert!(e.coords()[0] < 0.5);
        }
        for e in split.right().as_bucket().unwrap().points() {
            assert!(e.coords()[0] >= 0.5);
        }
    }

    #[test]
    fn split_uses_widest_axis() {
        let points = vec![p([0., 0., 0.], 1), p([1., 10., -2.], 2)];
        let incoming = p([0.5, 4., 0.], 3);
        assert_eq!(split_plane(&points, &incoming, 3), Some((1, 5.)));
    }

    #[test]
    fn split_ignores_later_equal_ranges() {
        let points = vec![p([0., 0., 0.], 1), p([1., 4., 4.], 2)];
        let incoming = p([0., 0., 0.], 3);
        assert_eq!(split_plane(&points, &incoming, 3), Some((1, 2.)));
    }

    #[test]
    fn inseparable_points_grow_bucket() {
        let mut node = Node::empty(OPTIONS);
        for i in 0..=OPTIONS.bucket_capacity {
            assert_eq!(node.len(), i);
            node.insert(p([0., 0., 0.], i as u32), OPTIONS);
        }

        let bucket = node.as_bucket().expect("duplicates must not split");
        assert_eq!(bucket.len(), OPTIONS.bucket_capacity + 1);
        assert_eq!(bucket.capacity(), OPTIONS.bucket_capacity * 2);
    }

    #[test]
    fn many_duplicates_terminate() {
        let mut node = Node::empty(OPTIONS);
        for i in 0..1000 {
            node.insert(p([7., 7., 7.], i), OPTIONS);
        }
        assert_eq!(node.len(), 1000);
        assert!(node.is_leaf());
        assert!(node.as_bucket().unwrap().capacity() >= 1000);
    }

    #[test]
    fn duplicates_beside_distinct_points() {
        let mut node = Node::empty(OPTIONS);
        for i in 0..50 {
            node.insert(p([1., 1., 1.], i), OPTIONS);
        }
        assert!(node.is_leaf());

        for i in 0..20 {
            node.insert(p([2. + i as f64, 1., 1.], 50 + i), OPTIONS);
        }
        assert_eq!(node.len(), 70);
        assert!(!node.is_leaf());
    }

    #[test]
    fn remove_where_takes_first_match() {
        let mut node = Node::empty(OPTIONS);
        for i in 0..20 {
            node.insert(p([i as f64, 0., 0.], i), OPTIONS);
        }
        let removed = node.remove_where(&mut |e: &Point<f64, u32>| *e.data() % 5 == 3);
        assert_eq!(removed.map(|e| *e.data()), Some(3));
        assert_eq!(node.len(), 19);
        assert!(node.remove_where(&mut |e: &Point<f64, u32>| *e.data() == 3).is_none());
    }

    #[test]
    fn retain_counts_removed_points() {
        let mut node = Node::empty(OPTIONS);
        for i in 0..20 {
            node.insert(p([i as f64, (i % 3) as f64, 0.], i), OPTIONS);
        }
        let removed = node.retain(&mut |e: &Point<f64, u32>| e.data() % 2 == 0);
        assert_eq!(removed, 10);
        assert_eq!(node.len(), 10);
        // Emptied buckets stay in place.
        assert!(node.num_buckets() > 1);
    }
}
