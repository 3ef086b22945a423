use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::mem::size_of;

use cosrank_shared::DEFAULT_MAX_MEMORY;
use cosrank_shared::similarity::{dot, l2_norm};

use super::{
  RankError, ScoredIdx, TopKRanker, ZeroVectorPolicy, check_candidates, check_queries, query_norm,
  score_candidate,
};

// ──────────────────────────────────────────────────
// Memory accounting
// ──────────────────────────────────────────────────

/// One cell of the score block.
const SCORE_BYTES: usize = size_of::<f32>();

/// One candidate norm, cached for the current column block.
const NORM_BYTES: usize = size_of::<f64>();

/// One query norm, resident for the whole call.
const QUERY_NORM_BYTES: usize = size_of::<f64>();

/// One heap header in the per-query heap list.
const HEAP_BYTES: usize = size_of::<BinaryHeap<Reverse<Ranked>>>();

/// One retained heap entry.
const ENTRY_BYTES: usize = size_of::<Reverse<Ranked>>();

/// Block dimensions chosen for a call, and the bytes they account for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
  /// Queries per block.
  pub rows: usize,
  /// Candidates per block.
  pub cols: usize,
  /// Per-query heaps (headers and `k` entries) and norms, plus one block of
  /// scores and candidate norms. Matches the peak heap allocation of a call.
  pub planned_bytes: usize,
}

/// Memory-budgeted strategy.
///
/// Scores are computed `rows × cols` at a time and folded into one bounded
/// heap per query, so the full `Q × N` similarity matrix never exists.
#[derive(Debug, Clone, Copy)]
pub struct Bounded {
  pub memory_budget: usize,
  pub zero_vectors: ZeroVectorPolicy,
}

impl Default for Bounded {
  fn default() -> Self {
    // A budget past the address space is no limit at all.
    Self::new(usize::try_from(DEFAULT_MAX_MEMORY).unwrap_or(usize::MAX))
  }
}

impl Bounded {
  #[must_use]
  pub fn new(memory_budget: usize) -> Self {
    Self {
      memory_budget,
      zero_vectors: ZeroVectorPolicy::default(),
    }
  }

  #[must_use]
  pub const fn with_zero_vectors(mut self, zero_vectors: ZeroVectorPolicy) -> Self {
    self.zero_vectors = zero_vectors;
    self
  }

  /// Pick the largest block that fits in the budget.
  ///
  /// Columns are widened first, then rows are added while whole rows still fit.
  pub fn plan(
    &self,
    num_queries: usize,
    num_candidates: usize,
    k: usize,
  ) -> Result<BlockPlan, RankError> {
    let k = k.min(num_candidates);
    let per_query = k
      .saturating_mul(ENTRY_BYTES)
      .saturating_add(HEAP_BYTES + QUERY_NORM_BYTES);
    let resident = num_queries.saturating_mul(per_query);
    let required = resident.saturating_add(NORM_BYTES + SCORE_BYTES);
    if self.memory_budget < required {
      return Err(RankError::InvalidBudget {
        budget: self.memory_budget,
        required,
      });
    }

    let available = self.memory_budget - resident;
    let cols = (available / (NORM_BYTES + SCORE_BYTES)).clamp(1, num_candidates.max(1));
    let rows =
      ((available - cols * NORM_BYTES) / (cols * SCORE_BYTES)).clamp(1, num_queries.max(1));

    Ok(BlockPlan {
      rows,
      cols,
      planned_bytes: resident + cols * NORM_BYTES + rows * cols * SCORE_BYTES,
    })
  }

  fn rank_blocks<Q: AsRef<[f32]>>(
    &self,
    queries: &[Q],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<Vec<ScoredIdx>>, RankError> {
    let k = k.min(candidates.len());
    if k == 0 {
      return Ok(vec![Vec::new(); queries.len()]);
    }
    let Some(first) = queries.first() else {
      return Ok(Vec::new());
    };
    check_queries(queries)?;
    check_candidates(first.as_ref().len(), candidates)?;
    let plan = self.plan(queries.len(), candidates.len(), k)?;
    tracing::debug!(
      queries = queries.len(),
      candidates = candidates.len(),
      k,
      rows = plan.rows,
      cols = plan.cols,
      planned_bytes = plan.planned_bytes,
      memory_budget = self.memory_budget,
      "Bounded ranking planned"
    );

    // Every buffer below is sized exactly; the plan counts each one.
    let mut query_norms = Vec::with_capacity(queries.len());
    for (i, q) in queries.iter().enumerate() {
      query_norms.push(query_norm(q.as_ref(), i)?);
    }
    let mut heaps: Vec<BinaryHeap<Reverse<Ranked>>> = (0..queries.len())
      .map(|_| BinaryHeap::with_capacity(k))
      .collect();
    let mut norms: Vec<f64> = Vec::with_capacity(plan.cols);
    let mut block = vec![0.0_f32; plan.rows * plan.cols];

    for (col_block, cols) in candidates.chunks(plan.cols).enumerate() {
      let col_start = col_block * plan.cols;
      norms.clear();
      norms.extend(cols.iter().map(|c| l2_norm(c)));

      for (row_block, rows) in queries.chunks(plan.rows).enumerate() {
        let row_start = row_block * plan.rows;

        // === Fill the score block ===
        for (r, query) in rows.iter().enumerate() {
          let query = query.as_ref();
          let cells = &mut block[r * plan.cols..r * plan.cols + cols.len()];
          for (c, (cell, candidate)) in cells.iter_mut().zip(cols).enumerate() {
            *cell = score_candidate(
              dot(query, candidate),
              query_norms[row_start + r],
              norms[c],
              col_start + c,
              self.zero_vectors,
            )?;
          }
        }

        // === Fold it into the per-query heaps ===
        for r in 0..rows.len() {
          let heap = &mut heaps[row_start + r];
          let cells = &block[r * plan.cols..r * plan.cols + cols.len()];
          for (c, &score) in cells.iter().enumerate() {
            push_bounded(
              heap,
              ScoredIdx {
                idx: col_start + c,
                score,
              },
              k,
            );
          }
        }
      }
    }
    drop(block);
    drop(norms);
    drop(query_norms);

    Ok(
      heaps
        .into_iter()
        .map(|heap| {
          heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(s))| s)
            .collect()
        })
        .collect(),
    )
  }
}

impl TopKRanker for Bounded {
  fn rank_scored(
    &self,
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<ScoredIdx>, RankError> {
    Ok(
      self
        .rank_blocks(&[query], candidates, k)?
        .pop()
        .unwrap_or_default(),
    )
  }

  fn rank_batch(
    &self,
    queries: &[Vec<f32>],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<Vec<usize>>, RankError> {
    Ok(
      self
        .rank_blocks(queries, candidates, k)?
        .into_iter()
        .map(|scored| scored.into_iter().map(|s| s.idx).collect())
        .collect(),
    )
  }
}

// ──────────────────────────────────────────────────
// Bounded heap
// ──────────────────────────────────────────────────

/// Heap key: greater means ranked ahead, matching [`ScoredIdx::rank_order`].
#[derive(Debug, Clone, Copy)]
struct Ranked(ScoredIdx);

impl Ord for Ranked {
  fn cmp(&self, other: &Self) -> Ordering {
    other.0.rank_order(&self.0)
  }
}

impl PartialOrd for Ranked {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for Ranked {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Ranked {}

/// Keep the `k` best entries; the root of the min-heap is the current worst.
fn push_bounded(heap: &mut BinaryHeap<Reverse<Ranked>>, entry: ScoredIdx, k: usize) {
  let entry = Ranked(entry);
  if heap.len() < k {
    heap.push(Reverse(entry));
  } else if let Some(Reverse(worst)) = heap.peek()
    && entry > *worst
  {
    heap.pop();
    heap.push(Reverse(entry));
  }
}
