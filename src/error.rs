use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketKDTreeError {
    /// A point or query target does not have as many coordinates as the tree has dimensions.
    #[error("Expected {expected} coordinates, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, BucketKDTreeError>;

/// Check that a coordinate slice matches the dimensionality of a tree.
#[inline]
pub(crate) fn check_dimensions(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(BucketKDTreeError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
