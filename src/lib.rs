#![doc = include_str!("../README.md")]

pub mod distance;
mod error;
pub mod kdtree;
mod point;
mod r#type;

pub use distance::{DistanceMetric, ManhattanDistance, SquaredEuclideanDistance};
pub use error::{BucketKDTreeError, Result};
pub use kdtree::{BucketKDTree, DEFAULT_BUCKET_CAPACITY};
pub use point::{KDPoint, Point, PointId, PointIdentity};
pub use r#type::IndexableNum;
