use crate::distance::{DistanceMetric, SquaredEuclideanDistance};
use crate::error::{check_dimensions, Result};
use crate::kdtree::neighbors::NeighborSearch;
use crate::kdtree::node::{Node, NodeOptions};
use crate::kdtree::traversal::{IntoIter, Iter};
use crate::point::{KDPoint, PointIdentity};
use crate::r#type::IndexableNum;

/// The bucket capacity used by [`BucketKDTree::new`].
///
/// Chosen empirically rather than derived.
pub const DEFAULT_BUCKET_CAPACITY: usize = 31;

/// A mutable bucket point-region k-d tree.
///
/// Points accumulate in buckets. A bucket that overflows is split in two halfway along the axis
/// over which its points spread the most. Points that cannot be separated, such as duplicates,
/// grow their bucket instead.
///
/// `E` is the stored element: a [`Point`][crate::Point], a shared handle to one, or any other
/// type implementing [`KDPoint`]. The tree never clones elements.
///
/// ```
/// use bucket_kdtree::{BucketKDTree, Point};
///
/// let mut tree = BucketKDTree::new_with_bucket_capacity(3, 2);
/// tree.add(Point::new(&[0., 0., 0.], 1)).unwrap();
/// tree.add(Point::new(&[1., 1., 1.], 2)).unwrap();
/// tree.add(Point::new(&[2., 2., 2.], 3)).unwrap();
///
/// let nearest = tree.nearest_neighbors(1, &[0.1, 0., 0.]).unwrap();
/// assert_eq!(*nearest[0].data(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct BucketKDTree<E, N: IndexableNum = f64> {
    root: Node<N, E>,
    options: NodeOptions,
    len: usize,
}

impl<E: KDPoint<N>, N: IndexableNum> BucketKDTree<E, N> {
    /// Create an empty tree with the provided number of dimensions and the default bucket
    /// capacity.
    pub fn new(dimensions: usize) -> Self {
        Self::new_with_bucket_capacity(dimensions, DEFAULT_BUCKET_CAPACITY)
    }

    /// Create an empty tree with the provided number of dimensions and bucket capacity.
    ///
    /// Panics if either is zero.
    pub fn new_with_bucket_capacity(dimensions: usize, bucket_capacity: usize) -> Self {
        assert!(dimensions > 0, "A tree needs at least one dimension.");
        assert!(bucket_capacity > 0, "Bucket capacity must be positive.");

        let options = NodeOptions {
            dimensions,
            bucket_capacity,
        };
        Self {
            root: Node::empty(options),
            options,
            len: 0,
        }
    }

    /// The number of coordinates of every point in this tree.
    pub fn dimensions(&self) -> usize {
        self.options.dimensions
    }

    /// The capacity given to every newly created bucket.
    pub fn bucket_capacity(&self) -> usize {
        self.options.bucket_capacity
    }

    /// The number of points in this tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of levels of this tree. An unsplit tree has height 1.
    pub fn height(&self) -> usize {
        self.root.height()
    }

    /// The number of buckets in this tree.
    pub fn num_buckets(&self) -> usize {
        self.root.num_buckets()
    }

    /// Access the root node of the tree for manual traversal.
    pub fn root(&self) -> &Node<N, E> {
        &self.root
    }

    /// Add a point to the tree.
    ///
    /// Fails if the point does not have exactly [`dimensions`][Self::dimensions] coordinates.
    pub fn add(&mut self, element: E) -> Result<()> {
        check_dimensions(self.options.dimensions, element.coords().len())?;
        self.root.insert(element, self.options);
        self.len += 1;
        Ok(())
    }

    /// Remove the first point, in iteration order, that is the same entity as `element`.
    ///
    /// Returns `false` if no such point is stored.
    pub fn remove(&mut self, element: &E) -> bool
    where
        E: PointIdentity,
    {
        self.remove_where(|e| e.is_same(element)).is_some()
    }

    /// Remove and return the first point, in iteration order, matching `predicate`.
    ///
    /// Buckets are never merged back together after removal.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Option<E>
    where
        F: FnMut(&E) -> bool,
    {
        let removed = self.root.remove_where(&mut predicate);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Keep only the points matching `predicate`.
    pub fn retain<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&E) -> bool,
    {
        self.len -= self.root.retain(&mut predicate);
    }

    /// Remove every point, leaving a single empty bucket.
    pub fn clear(&mut self) {
        self.root = Node::empty(self.options);
        self.len = 0;
    }

    /// An iterator over every point in the tree.
    pub fn iter(&self) -> Iter<'_, N, E> {
        Iter::new(&self.root, self.len)
    }

    /// Find up to `k` points closest to `target` by squared Euclidean distance.
    ///
    /// If the tree holds fewer than `k` points, all of them are returned. Results are ordered
    /// closest first; the relative order of equidistant points is unspecified.
    pub fn nearest_neighbors(&self, k: usize, target: &[N]) -> Result<Vec<&E>> {
        self.nearest_neighbors_with(k, target, &SquaredEuclideanDistance)
    }

    /// Find up to `k` points closest to `target` under the provided metric.
    ///
    /// The metric must be separable per axis for results to be exact.
    pub fn nearest_neighbors_with<D>(
        &self,
        k: usize,
        target: &[N],
        metric: &D,
    ) -> Result<Vec<&E>>
    where
        D: DistanceMetric<N> + ?Sized,
    {
        let results = self.nearest_neighbors_with_distance(k, target, metric)?;
        Ok(results.into_iter().map(|(e, _)| e).collect())
    }

    /// Find up to `k` points closest to the position of `point` by squared Euclidean distance.
    ///
    /// Whether `point` itself is stored in the tree makes no difference.
    pub fn nearest_neighbors_to(&self, k: usize, point: &impl KDPoint<N>) -> Result<Vec<&E>> {
        self.nearest_neighbors(k, point.coords())
    }

    /// Find up to `k` points closest to the position of `point` under the provided metric.
    pub fn nearest_neighbors_to_with<D>(
        &self,
        k: usize,
        point: &impl KDPoint<N>,
        metric: &D,
    ) -> Result<Vec<&E>>
    where
        D: DistanceMetric<N> + ?Sized,
    {
        self.nearest_neighbors_with(k, point.coords(), metric)
    }

    /// Find up to `k` points closest to `target`, each paired with its distance under `metric`.
    pub fn nearest_neighbors_with_distance<D>(
        &self,
        k: usize,
        target: &[N],
        metric: &D,
    ) -> Result<Vec<(&E, N)>>
    where
        D: DistanceMetric<N> + ?Sized,
    {
        check_dimensions(self.options.dimensions, target.len())?;
        Ok(NeighborSearch::new(target, k, metric).run(&self.root))
    }
}

impl<E: KDPoint<N>, N: IndexableNum> Extend<E> for BucketKDTree<E, N> {
    /// Panics if any point has the wrong number of coordinates.
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        for element in iter {
            if let Err(err) = self.add(element) {
                panic!("{}", err);
            }
        }
    }
}

impl<'a, E, N: IndexableNum> IntoIterator for &'a BucketKDTree<E, N> {
    type Item = &'a E;
    type IntoIter = Iter<'a, N, E>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(&self.root, self.len)
    }
}

impl<E, N: IndexableNum> IntoIterator for BucketKDTree<E, N> {
    type Item = E;
    type IntoIter = IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.root, self.len)
    }
}
