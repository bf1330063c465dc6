//! An implementation of a mutable bucket point-region K-D Tree.

#![warn(missing_docs)]

mod index;
mod neighbors;
mod node;
mod traversal;

pub use index::{BucketKDTree, DEFAULT_BUCKET_CAPACITY};
pub use node::{Bucket, Node, Split};
pub use traversal::{IntoIter, Iter};
