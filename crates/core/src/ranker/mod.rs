use std::cmp::Ordering;

use cosrank_shared::similarity::{cosine_from_parts, l2_norm};
use enum_dispatch::enum_dispatch;
use serde::Serialize;

use crate::{RankError, VectorRef};

mod bounded;
pub use bounded::{BlockPlan, Bounded};

mod full_scan;
pub use full_scan::FullScan;

// ──────────────────────────────────────────────────
// Scored results
// ──────────────────────────────────────────────────

/// A candidate index together with its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredIdx {
  pub idx: usize,
  pub score: f32,
}

impl ScoredIdx {
  /// Total ranking order: higher score first, lower index first among ties.
  ///
  /// `Ordering::Less` means `self` ranks ahead of `other`, so this can be passed
  /// straight to `sort_by`.
  #[must_use]
  pub fn rank_order(&self, other: &Self) -> Ordering {
    other
      .score
      .total_cmp(&self.score)
      .then_with(|| self.idx.cmp(&other.idx))
  }
}

/// How a zero-norm candidate is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroVectorPolicy {
  /// Fail with [`RankError::DegenerateVector`].
  #[default]
  Reject,
  /// Score it `f32::NEG_INFINITY` so it ranks after every real candidate.
  RankLast,
}

// ──────────────────────────────────────────────────
// Strategy seam
// ──────────────────────────────────────────────────

#[enum_dispatch]
pub trait TopKRanker {
  /// The `min(k, N)` best candidates for `query`, best first.
  fn rank_scored(
    &self,
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<ScoredIdx>, RankError>;

  fn rank(
    &self,
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<usize>, RankError> {
    Ok(
      self
        .rank_scored(query, candidates, k)?
        .into_iter()
        .map(|s| s.idx)
        .collect(),
    )
  }

  /// Rank every query in `queries` against the same candidates.
  fn rank_batch(
    &self,
    queries: &[Vec<f32>],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<Vec<usize>>, RankError> {
    if k == 0 || candidates.is_empty() {
      return Ok(vec![Vec::new(); queries.len()]);
    }
    check_queries(queries)?;
    queries
      .iter()
      .enumerate()
      .map(|(i, query)| self.rank(query, candidates, k).map_err(|e| e.for_query(i)))
      .collect()
  }
}

/// The two interchangeable ranking strategies.
///
/// Parses from and displays as `full_scan` / `bounded`.
#[enum_dispatch(TopKRanker)]
#[derive(Debug, Clone, strum::Display, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
  FullScan(FullScan),
  Bounded(Bounded),
}

/// Exact top-K by cosine similarity with the full-scan strategy.
pub fn rank_top_k(
  query: &[f32],
  candidates: &[Vec<f32>],
  k: usize,
) -> Result<Vec<usize>, RankError> {
  FullScan::default().rank(query, candidates, k)
}

/// Exact top-K for each query, computed in blocks that fit in `memory_budget` bytes.
pub fn rank_top_k_bounded(
  queries: &[Vec<f32>],
  candidates: &[Vec<f32>],
  k: usize,
  memory_budget: usize,
) -> Result<Vec<Vec<usize>>, RankError> {
  Bounded::new(memory_budget).rank_batch(queries, candidates, k)
}

// ──────────────────────────────────────────────────
// Validation and scoring shared by both strategies
// ──────────────────────────────────────────────────

/// Every query in a batch must share the first query's dimension.
fn check_queries<Q: AsRef<[f32]>>(queries: &[Q]) -> Result<(), RankError> {
  let Some(first) = queries.first() else {
    return Ok(());
  };
  let expected = first.as_ref().len();
  match queries.iter().position(|q| q.as_ref().len() != expected) {
    Some(query) => Err(RankError::QueryDimensionMismatch {
      query,
      expected,
      found: queries[query].as_ref().len(),
    }),
    None => Ok(()),
  }
}

fn check_candidates(expected: usize, candidates: &[Vec<f32>]) -> Result<(), RankError> {
  match candidates.iter().position(|c| c.len() != expected) {
    Some(index) => Err(RankError::DimensionMismatch {
      index,
      expected,
      found: candidates[index].len(),
    }),
    None => Ok(()),
  }
}

/// Norm of query `index`; zero and non-finite norms leave the ranking undefined.
fn query_norm(query: &[f32], index: usize) -> Result<f64, RankError> {
  let norm = l2_norm(query);
  if norm > 0.0 && norm.is_finite() {
    Ok(norm)
  } else {
    Err(RankError::DegenerateVector {
      vector: VectorRef::Query(index),
    })
  }
}

fn score_candidate(
  dot: f64,
  query_norm: f64,
  candidate_norm: f64,
  index: usize,
  policy: ZeroVectorPolicy,
) -> Result<f32, RankError> {
  match cosine_from_parts(dot, query_norm, candidate_norm) {
    Some(score) if !score.is_nan() => Ok(score),
    _ => match policy {
      ZeroVectorPolicy::Reject => Err(RankError::DegenerateVector {
        vector: VectorRef::Candidate(index),
      }),
      ZeroVectorPolicy::RankLast => Ok(f32::NEG_INFINITY),
    },
  }
}
