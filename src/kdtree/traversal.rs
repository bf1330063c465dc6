//! Iterators over the points of a [`BucketKDTree`][crate::kdtree::BucketKDTree].

use std::iter::FusedIterator;
use std::slice;

use crate::kdtree::node::Node;
use crate::r#type::IndexableNum;

/// A borrowing iterator over every point in a tree.
///
/// Points are yielded bucket by bucket, all of a split's left side before its right side. That
/// order is a consequence of the layout, not a guarantee.
#[derive(Debug, Clone)]
pub struct Iter<'a, N: IndexableNum, E> {
    stack: Vec<&'a Node<N, E>>,
    bucket: slice::Iter<'a, E>,
    remaining: usize,
}

impl<'a, N: IndexableNum, E> Iter<'a, N, E> {
    pub(crate) fn new(root: &'a Node<N, E>, len: usize) -> Self {
        Self {
            stack: vec![root],
            bucket: slice::Iter::default(),
            remaining: len,
        }
    }
}

impl<'a, N: IndexableNum, E> Iterator for Iter<'a, N, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(element) = self.bucket.next() {
                self.remaining -= 1;
                return Some(element);
            }

            match self.stack.pop()? {
                Node::Bucket(bucket) => self.bucket = bucket.points.iter(),
                Node::Split(split) => {
                    // Note: pushed in backwards order to what gets popped
                    self.stack.push(&split.right);
                    self.stack.push(&split.left);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<N: IndexableNum, E> ExactSizeIterator for Iter<'_, N, E> {}

impl<N: IndexableNum, E> FusedIterator for Iter<'_, N, E> {}

/// An owning iterator over every point in a tree, in the same order as [`Iter`].
#[derive(Debug)]
pub struct IntoIter<E> {
    inner: std::vec::IntoIter<E>,
}

impl<E> IntoIter<E> {
    pub(crate) fn new<N: IndexableNum>(root: Node<N, E>, len: usize) -> Self {
        let mut points = Vec::with_capacity(len);
        drain_into(root, &mut points);
        Self {
            inner: points.into_iter(),
        }
    }
}

fn drain_into<N: IndexableNum, E>(node: Node<N, E>, out: &mut Vec<E>) {
    match node {
        Node::Bucket(bucket) => out.extend(bucket.points),
        Node::Split(split) => {
            drain_into(*split.left, out);
            drain_into(*split.right, out);
        }
    }
}

impl<E> Iterator for IntoIter<E> {
    type Item = E;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<E> ExactSizeIterator for IntoIter<E> {}

impl<E> FusedIterator for IntoIter<E> {}
