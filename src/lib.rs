//! coplay: user-based collaborative filtering over sparse play counts.
//!
//! Builds a pairwise user-similarity model from `(user, item, count)`
//! interactions, predicts a user's affinity for unseen items with a
//! k-nearest-neighbor weighted average, and scores prediction quality
//! against a held-out split.
//!
//! Pipeline, leaves first:
//!
//! - [`ids`]: external string identifiers <-> dense typed indices
//! - [`store`]: quantized log-counts, dense table + sorted sparse rows
//! - [`norm`]: per-user L2 norms, a cosine precomputation
//! - [`similarity`]: merge-join cosine/Pearson, lower-triangular matrix
//! - [`persistence`]: raw byte-stream matrix save/load
//! - [`predict`]: KNN prediction and top-N recommendation
//! - [`eval`]: RMSE and root-mean-absolute-error over a test set
//! - [`dataset`] / [`split`]: tab-separated parsing and per-user holdout
//! - [`session`]: the immutable-after-build object owning all of the above
//!
//! # Critical Nuances
//!
//! ## Log-domain counts
//!
//! Play counts are heavy-tailed, so everything downstream of parsing works
//! on `round(log2(count)) + 1` packed into one byte. The reverse map used
//! for reporting is `2^(level - 1)` with no rounding back - encode and
//! decode are **not** inverses, and both formulas are part of the persisted
//! data contract (see [`quantize`]).
//!
//! ## Index-assignment asymmetry
//!
//! User indices follow first appearance in the input; item indices follow
//! the lexicographic order of the catalog. A persisted similarity matrix is
//! only meaningful next to the user numbering that produced it, so this
//! asymmetry must survive any refactor.
//!
//! ## Sparsity is the performance model
//!
//! A similarity pair costs O(|items(u1)| + |items(u2)|) via merge-join over
//! sorted rows, not O(item_count). The dense count table exists for O(1)
//! prediction lookups and dominates memory at
//! `user_count * item_count` bytes.
//!
//! # Example
//!
//! ```
//! use coplay::{Config, Recommender};
//! use coplay::dataset::read_records;
//!
//! let log = "ann\tblue\t8\nann\tcoral\t2\nbea\tblue\t4\nbea\tcoral\t1\ncy\tblue\t16\n";
//! let records = read_records(std::io::Cursor::new(log))?;
//!
//! let session = Recommender::build(&records, Config::default())?;
//! let recs = session.recommend("cy", 5)?;
//! assert_eq!(recs[0].0, "coral");
//! # Ok::<(), coplay::CoplayError>(())
//! ```

pub mod dataset;
pub mod error;
pub mod eval;
pub mod ids;
pub mod norm;
pub mod persistence;
pub mod predict;
pub mod quantize;
pub mod session;
pub mod similarity;
pub mod split;
pub mod store;

// Re-exports
pub use error::{CoplayError, Result};
pub use eval::{evaluate, Evaluation, TestEntry};
pub use ids::{IdIndex, ItemIdx, UserIdx};
pub use predict::Predictor;
pub use session::{Config, Recommender};
pub use similarity::{SimilarityMatrix, SimilarityMetric};
