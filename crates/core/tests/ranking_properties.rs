use std::mem::size_of;

use cosrank_core::{
  Bounded, FullScan, RankError, ScoredIdx, TopKRanker, VectorRef, ZeroVectorPolicy, rank_top_k,
  rank_top_k_bounded,
};
use cosrank_shared::similarity::cosine_similarity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vectors(rng: &mut StdRng, n: usize, dim: usize) -> Vec<Vec<f32>> {
  (0..n)
    .map(|_| (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect())
    .collect()
}

/// Candidates built from a handful of directions so exact score ties are common.
fn tied_vectors(rng: &mut StdRng, n: usize) -> Vec<Vec<f32>> {
  let directions = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
  (0..n)
    .map(|_| {
      let dir = directions[rng.random_range(0..directions.len())];
      let scale = [1.0_f32, 2.0, 4.0][rng.random_range(0..3)];
      dir.iter().map(|x| x * scale).collect()
    })
    .collect()
}

fn budgets() -> [usize; 4] {
  // From a few blocks of a single candidate up to everything at once.
  [400, 2_048, 65_536, 1 << 30]
}

#[test]
fn concrete_scenario() {
  let candidates = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]];
  assert_eq!(rank_top_k(&[1.0, 0.0], &candidates, 2).unwrap(), vec![0, 1]);
  assert_eq!(
    rank_top_k_bounded(&[vec![1.0, 0.0]], &candidates, 2, 1 << 20).unwrap(),
    vec![vec![0, 1]]
  );
}

#[test]
fn tie_scenario() {
  let candidates = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
  assert_eq!(rank_top_k(&[1.0, 1.0], &candidates, 1).unwrap(), vec![0]);
  assert_eq!(
    rank_top_k_bounded(&[vec![1.0, 1.0]], &candidates, 1, 1 << 20).unwrap(),
    vec![vec![0]]
  );
}

#[test]
fn bounded_matches_full_scan() {
  let mut rng = StdRng::seed_from_u64(0x5eed);
  for round in 0..40 {
    let n = rng.random_range(0..120);
    let dim = rng.random_range(1..24);
    let k = rng.random_range(0..n + 3);
    let num_queries = rng.random_range(1..5);
    let queries = random_vectors(&mut rng, num_queries, dim);
    let candidates = random_vectors(&mut rng, n, dim);

    let expected: Vec<Vec<usize>> = queries
      .iter()
      .map(|q| rank_top_k(q, &candidates, k).unwrap())
      .collect();
    for budget in budgets() {
      match rank_top_k_bounded(&queries, &candidates, k, budget) {
        Ok(got) => assert_eq!(got, expected, "round {round}, budget {budget}"),
        Err(RankError::InvalidBudget { required, .. }) => assert!(required > budget),
        Err(e) => panic!("round {round}: unexpected {e}"),
      }
    }
  }
}

#[test]
fn bounded_matches_full_scan_with_ties() {
  let mut rng = StdRng::seed_from_u64(17);
  for _ in 0..20 {
    let candidates = tied_vectors(&mut rng, 60);
    let query = [1.0, 0.5, 0.0];
    for k in [1, 5, 17, 60] {
      // The smallest accepted budget fits one candidate; add room for six more.
      let Err(RankError::InvalidBudget { required, .. }) = Bounded::new(0).plan(1, 60, k) else {
        panic!("a zero budget must be rejected");
      };
      let budget = required + 6 * (size_of::<f64>() + size_of::<f32>());
      assert_eq!(Bounded::new(budget).plan(1, 60, k).unwrap().cols, 7);
      let expected = rank_top_k(&query, &candidates, k).unwrap();
      let got = Bounded::new(budget).rank(&query, &candidates, k).unwrap();
      assert_eq!(got, expected, "k = {k}");
    }
  }
}

#[test]
fn results_are_true_top_k() {
  let mut rng = StdRng::seed_from_u64(99);
  for _ in 0..25 {
    let candidates = random_vectors(&mut rng, 80, 12);
    let query = random_vectors(&mut rng, 1, 12).remove(0);
    let k = rng.random_range(1..30);
    let scored: Vec<ScoredIdx> = FullScan::default()
      .rank_scored(&query, &candidates, k)
      .unwrap();

    assert_eq!(scored.len(), k);
    let mut seen: Vec<usize> = scored.iter().map(|s| s.idx).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), k, "duplicate indices");

    let cutoff = scored.last().unwrap().score;
    for (idx, candidate) in candidates.iter().enumerate() {
      if seen.binary_search(&idx).is_err() {
        let score = cosine_similarity(&query, candidate).unwrap();
        assert!(score <= cutoff, "{idx} scored {score} above cutoff {cutoff}");
      }
    }
    assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(scored.iter().all(|s| (-1.0..=1.0).contains(&s.score)));
  }
}

#[test]
fn growing_k_extends_prefix() {
  let mut rng = StdRng::seed_from_u64(3);
  let candidates = tied_vectors(&mut rng, 40);
  let query = [0.2, 1.0, 0.3];
  for k in 0..candidates.len() {
    let shorter = rank_top_k(&query, &candidates, k).unwrap();
    let longer = rank_top_k(&query, &candidates, k + 1).unwrap();
    assert_eq!(&longer[..k], &shorter[..], "k = {k}");
  }
}

#[test]
fn boundaries() {
  let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
  let query = [1.0, 0.2];

  assert!(rank_top_k(&query, &[], 5).unwrap().is_empty());
  assert!(rank_top_k(&query, &candidates, 0).unwrap().is_empty());
  assert_eq!(rank_top_k(&query, &candidates, 3).unwrap(), vec![1, 2, 0]);
  assert_eq!(rank_top_k(&query, &candidates, 99).unwrap(), vec![1, 2, 0]);

  assert_eq!(
    rank_top_k_bounded(&[query.to_vec()], &[], 5, 0).unwrap(),
    vec![Vec::<usize>::new()]
  );
  assert_eq!(
    rank_top_k_bounded(&[query.to_vec()], &candidates, 99, 1 << 16).unwrap(),
    vec![vec![1, 2, 0]]
  );
}

#[test]
fn degenerate_vectors_never_yield_nan() {
  let candidates = vec![vec![0.5, 0.5], vec![0.0, 0.0], vec![-1.0, 0.0]];
  let query = [1.0, 0.0];

  let expected = Err(RankError::DegenerateVector {
    vector: VectorRef::Candidate(1),
  });
  assert_eq!(rank_top_k(&query, &candidates, 3), expected);
  assert_eq!(Bounded::new(1 << 16).rank(&query, &candidates, 3), expected);

  let last = FullScan::with_zero_vectors(ZeroVectorPolicy::RankLast)
    .rank_scored(&query, &candidates, 3)
    .unwrap();
  assert_eq!(last.iter().map(|s| s.idx).collect::<Vec<_>>(), vec![0, 2, 1]);
  assert!(last.iter().all(|s| !s.score.is_nan()));
  assert_eq!(
    Bounded::new(1 << 16)
      .with_zero_vectors(ZeroVectorPolicy::RankLast)
      .rank(&query, &candidates, 3)
      .unwrap(),
    vec![0, 2, 1]
  );
}

#[test]
fn dimension_mismatch_is_fatal() {
  let candidates = vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]];
  let expected = Err(RankError::DimensionMismatch {
    index: 1,
    expected: 3,
    found: 2,
  });
  assert_eq!(rank_top_k(&[1.0, 0.0, 0.0], &candidates, 1), expected);
  assert_eq!(
    Bounded::new(1 << 16).rank(&[1.0, 0.0, 0.0], &candidates, 1),
    expected
  );
}

#[test]
fn bounded_plan_stays_within_budget() {
  let mut rng = StdRng::seed_from_u64(11);
  for _ in 0..200 {
    let queries = rng.random_range(1..50);
    let candidates = rng.random_range(1..5_000);
    let k = rng.random_range(1..64);
    let budget = rng.random_range(0..200_000);
    match Bounded::new(budget).plan(queries, candidates, k) {
      Ok(plan) => {
        assert!(plan.planned_bytes <= budget);
        assert!((1..=queries).contains(&plan.rows));
        assert!((1..=candidates).contains(&plan.cols));
      }
      Err(RankError::InvalidBudget { required, .. }) => assert!(budget < required),
      Err(e) => panic!("unexpected {e}"),
    }
  }
}
