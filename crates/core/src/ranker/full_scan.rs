use cosrank_shared::similarity::{dot, l2_norm};

use super::{
  RankError, ScoredIdx, TopKRanker, ZeroVectorPolicy, check_candidates, query_norm, score_candidate,
};

/// Reference strategy: score every candidate, sort, truncate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullScan {
  pub zero_vectors: ZeroVectorPolicy,
}

impl FullScan {
  #[must_use]
  pub const fn with_zero_vectors(zero_vectors: ZeroVectorPolicy) -> Self {
    Self { zero_vectors }
  }
}

impl TopKRanker for FullScan {
  fn rank_scored(
    &self,
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
  ) -> Result<Vec<ScoredIdx>, RankError> {
    if k == 0 || candidates.is_empty() {
      return Ok(Vec::new());
    }
    check_candidates(query.len(), candidates)?;
    let query_norm = query_norm(query, 0)?;

    let mut scored = candidates
      .iter()
      .enumerate()
      .map(|(idx, candidate)| {
        let score = score_candidate(
          dot(query, candidate),
          query_norm,
          l2_norm(candidate),
          idx,
          self.zero_vectors,
        )?;
        Ok(ScoredIdx { idx, score })
      })
      .collect::<Result<Vec<_>, RankError>>()?;

    scored.sort_by(ScoredIdx::rank_order);
    scored.truncate(k);
    Ok(scored)
  }
}
