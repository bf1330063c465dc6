//! Points stored in a [`BucketKDTree`][crate::kdtree::BucketKDTree].

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tinyvec::TinyVec;

use crate::r#type::IndexableNum;

static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`Point`].
///
/// Two points are the same entity only if they share an id. Cloning a point keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u64);

impl PointId {
    fn next() -> Self {
        Self(NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Anything that has a position in k-dimensional space.
pub trait KDPoint<N: IndexableNum> {
    /// The coordinates of this point, one per dimension.
    fn coords(&self) -> &[N];
}

/// Identity comparison for elements stored in a tree.
///
/// Used by [`BucketKDTree::remove`][crate::kdtree::BucketKDTree::remove]. Identity is never
/// derived from coordinates or payload: two points built from equal values are distinct.
pub trait PointIdentity {
    /// Returns `true` if `self` and `other` refer to the same entity.
    fn is_same(&self, other: &Self) -> bool;
}

/// A fixed-length coordinate vector carrying an opaque payload.
///
/// Coordinates are copied in at construction and only handed out behind a shared borrow, so a
/// point stored in a tree cannot be moved by outside code. Up to four coordinates are stored
/// inline.
///
/// ```
/// use bucket_kdtree::{KDPoint, Point};
///
/// let point = Point::new(&[1.0, 2.0, 3.0], "payload");
/// assert_eq!(point.coords(), &[1.0, 2.0, 3.0]);
/// assert_eq!(point.coord(1), 2.0);
/// assert_eq!(*point.data(), "payload");
/// ```
#[derive(Debug, Clone)]
pub struct Point<N: IndexableNum, T> {
    coords: TinyVec<[N; 4]>,
    data: T,
    id: PointId,
}

impl<N: IndexableNum, T> Point<N, T> {
    /// Create a point with a copy of `coords` and the provided payload.
    pub fn new(coords: &[N], data: T) -> Self {
        Self {
            coords: coords.iter().copied().collect(),
            data,
            id: PointId::next(),
        }
    }

    /// The coordinate of this point on the given axis.
    ///
    /// Panics if `axis` is out of bounds.
    #[inline]
    pub fn coord(&self, axis: usize) -> N {
        self.coords[axis]
    }

    /// An owned copy of this point's coordinates.
    pub fn to_coords(&self) -> Vec<N> {
        self.coords.to_vec()
    }

    /// The number of coordinates of this point.
    pub fn dimensions(&self) -> usize {
        self.coords.len()
    }

    /// The payload carried by this point.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consume this point, returning its payload.
    pub fn into_data(self) -> T {
        self.data
    }

    /// The identity shared by this point and its clones.
    pub fn id(&self) -> PointId {
        self.id
    }
}

impl<N: IndexableNum, T> KDPoint<N> for Point<N, T> {
    #[inline]
    fn coords(&self) -> &[N] {
        &self.coords
    }
}

impl<N: IndexableNum, T> PointIdentity for Point<N, T> {
    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<N: IndexableNum, const D: usize> KDPoint<N> for [N; D] {
    #[inline]
    fn coords(&self) -> &[N] {
        self
    }
}

impl<N: IndexableNum> KDPoint<N> for Vec<N> {
    #[inline]
    fn coords(&self) -> &[N] {
        self
    }
}

impl<N: IndexableNum, P: KDPoint<N> + ?Sized> KDPoint<N> for &P {
    #[inline]
    fn coords(&self) -> &[N] {
        (**self).coords()
    }
}

impl<N: IndexableNum, P: KDPoint<N> + ?Sized> KDPoint<N> for Rc<P> {
    #[inline]
    fn coords(&self) -> &[N] {
        (**self).coords()
    }
}

impl<N: IndexableNum, P: KDPoint<N> + ?Sized> KDPoint<N> for Arc<P> {
    #[inline]
    fn coords(&self) -> &[N] {
        (**self).coords()
    }
}

impl<P: PointIdentity + ?Sized> PointIdentity for &P {
    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        (**self).is_same(*other)
    }
}

impl<P: PointIdentity + ?Sized> PointIdentity for Rc<P> {
    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || (**self).is_same(&**other)
    }
}

impl<P: PointIdentity + ?Sized> PointIdentity for Arc<P> {
    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).is_same(&**other)
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;
    use std::sync::Arc;

    use crate::point::{KDPoint, Point, PointIdentity};

    #[test]
    fn copies_coordinates() {
        let mut coords = vec![1.0, 2.0, 3.0];
        let point = Point::new(&coords, ());
        coords[0] = 100.0;
        assert_eq!(point.coords(), &[1.0, 2.0, 3.0]);

        let mut copy = point.to_coords();
        copy[1] = 100.0;
        assert_eq!(point.coord(1), 2.0);
    }

    #[test]
    fn stores_more_than_four_dimensions() {
        let coords: Vec<f64> = (0..7).map(f64::from).collect();
        let point = Point::new(&coords, 0u8);
        assert_eq!(point.dimensions(), 7);
        assert_eq!(point.coords(), coords.as_slice());
    }

    #[test]
    fn identity_is_not_value_equality() {
        let a = Point::new(&[0.0, 0.0], 1);
        let b = Point::new(&[0.0, 0.0], 1);
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a.clone()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn shared_handles_compare_by_identity() {
        let a = Rc::new(Point::new(&[1.0f32, 2.0], "a"));
        let b = Rc::new(Point::new(&[1.0f32, 2.0], "a"));
        assert!(a.is_same(&Rc::clone(&a)));
        assert!(!a.is_same(&b));
        assert_eq!(a.coords(), b.coords());
    }

    #[test]
    fn atomic_handles_compare_by_identity() {
        let a = Arc::new(Point::new(&[1.0, 2.0], 1));
        let b = Arc::new(Point::new(&[1.0, 2.0], 1));
        assert!(a.is_same(&Arc::clone(&a)));
        assert!(!a.is_same(&b));

        // Separate allocations around clones of one point are still that point.
        let c = Arc::new((*a).clone());
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(a.is_same(&c));
    }

    #[test]
    fn references_compare_by_identity() {
        let a = Point::new(&[0.0, 0.0], ());
        let b = Point::new(&[0.0, 0.0], ());
        let (ra, rb) = (&a, &b);
        assert!(PointIdentity::is_same(&ra, &ra));
        assert!(!PointIdentity::is_same(&ra, &rb));
    }
}
