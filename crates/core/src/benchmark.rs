use std::hint::black_box;
use std::io::Write;
use std::time::{Duration, Instant};

use cosrank_shared::AppError;
use serde::Serialize;

use crate::{Bounded, FullScan, Strategy, TopKRanker};

/// Wall-clock totals for `iterations` runs of each strategy.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
  pub iterations: u32,
  pub full_scan: Duration,
  pub bounded: Duration,
}

/// Time both strategies on the same inputs and write one line per strategy to `out`.
///
/// Each strategy runs once untimed first so bad inputs fail before any timing starts.
pub fn benchmark<W: Write>(
  query: &[f32],
  candidates: &[Vec<f32>],
  k: usize,
  memory_budget: usize,
  iterations: u32,
  out: &mut W,
) -> Result<BenchmarkReport, AppError> {
  let strategies = [
    Strategy::from(FullScan::default()),
    Strategy::from(Bounded::new(memory_budget)),
  ];
  for strategy in &strategies {
    strategy
      .rank(query, candidates, k)
      .map_err(|e| AppError::new(e).context(format!("{strategy} ranker rejected the inputs")))?;
  }

  let mut timings = [Duration::ZERO; 2];
  for (strategy, elapsed) in strategies.iter().zip(timings.iter_mut()) {
    let start = Instant::now();
    for _ in 0..iterations {
      black_box(strategy.rank(black_box(query), black_box(candidates), k)?);
    }
    *elapsed = start.elapsed();

    let name: &'static str = strategy.into();
    tracing::info!(
      strategy = name,
      iterations,
      elapsed_ms = elapsed.as_secs_f64() * 1e3,
      "Benchmark finished"
    );
    writeln!(
      out,
      "Time taken for {} ranker: {:.5} seconds",
      name.replace('_', " "),
      elapsed.as_secs_f64()
    )?;
  }

  let [full_scan, bounded] = timings;
  Ok(BenchmarkReport {
    iterations,
    full_scan,
    bounded,
  })
}
