use std::fmt::Display;

use thiserror::Error;

/// Which input vector an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorRef {
  /// Position in the query batch (always 0 for a single query).
  Query(usize),
  Candidate(usize),
}

impl Display for VectorRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Query(i) => write!(f, "query {i}"),
      Self::Candidate(i) => write!(f, "candidate {i}"),
    }
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
  #[error("candidate {index} has dimension {found}, expected {expected}")]
  DimensionMismatch {
    index: usize,
    expected: usize,
    found: usize,
  },

  #[error("query {query} has dimension {found}, expected {expected}")]
  QueryDimensionMismatch {
    query: usize,
    expected: usize,
    found: usize,
  },

  #[error("{vector} has zero or non-finite norm")]
  DegenerateVector { vector: VectorRef },

  #[error("memory budget of {budget} bytes is below the {required} bytes needed for one block")]
  InvalidBudget { budget: usize, required: usize },
}

impl RankError {
  /// Re-label a single-query error with its position in a batch.
  #[must_use]
  pub(crate) fn for_query(self, query: usize) -> Self {
    match self {
      Self::DegenerateVector {
        vector: VectorRef::Query(_),
      } => Self::DegenerateVector {
        vector: VectorRef::Query(query),
      },
      other => other,
    }
  }
}
