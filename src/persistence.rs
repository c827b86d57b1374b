//! On-disk format for the similarity matrix.
//!
//! The persisted form is exactly the in-memory form: the row-major
//! lower-triangular byte stream, row `i` contributing `i` bytes, `n(n-1)/2`
//! bytes total. There is no header; the file is only meaningful alongside
//! the `user_count` (and user numbering) of the training run that produced
//! it. Load validates the length against that count and fails hard on a
//! mismatch.
//!
//! ```text
//! offset 0        : sim(1,0)
//! offset 1..3     : sim(2,0) sim(2,1)
//! offset 3..6     : sim(3,0) sim(3,1) sim(3,2)
//! ...
//! ```
//!
//! Because the stored bytes already are the final quantized values, a
//! write/read round-trip is loss-free.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::similarity::SimilarityMatrix;

/// Write the matrix to `path` as a single bulk operation.
pub fn save(matrix: &SimilarityMatrix, path: &Path) -> Result<()> {
    fs::write(path, matrix.as_bytes())?;
    Ok(())
}

/// Read a matrix for a session of `user_count` users.
///
/// Fails with [`crate::CoplayError::MatrixSizeMismatch`] when the file
/// length is not `n(n-1)/2` - the persisted matrix is unusable until the
/// correct user count is supplied.
pub fn load(path: &Path, user_count: usize) -> Result<SimilarityMatrix> {
    let data = fs::read(path)?;
    SimilarityMatrix::from_bytes(data, user_count)
}
