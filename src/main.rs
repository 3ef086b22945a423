use cosrank_core::{Bounded, FullScan, TopKRanker, benchmark};
use cosrank_shared::{AppEnv, AppError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod corpus;

use crate::corpus::Corpus;

fn main() -> Result<(), AppError> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .with(tracing_error::ErrorLayer::default())
    .init();
  dotenvy::dotenv().ok();

  let env = AppEnv::load()?;
  let mut rng = match env.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_os_rng(),
  };
  let corpus = Corpus::generate(&mut rng, env.num_docs, env.dimension);
  tracing::debug!(
    num_docs = env.num_docs,
    dimension = env.dimension,
    top_k = env.top_k,
    max_memory = env.max_memory,
    iterations = env.iterations,
    seed = ?env.seed,
    "Synthetic corpus ready"
  );

  println!(
    "top indices using full scan: {:?}",
    FullScan::default().rank(&corpus.query, &corpus.documents, env.top_k)?
  );
  println!(
    "top indices using bounded: {:?}",
    Bounded::new(env.memory_budget()).rank(&corpus.query, &corpus.documents, env.top_k)?
  );

  let report = benchmark(
    &corpus.query,
    &corpus.documents,
    env.top_k,
    env.memory_budget(),
    env.iterations,
    &mut std::io::stdout().lock(),
  )?;
  tracing::debug!(report = %serde_json::to_string(&report)?, "Benchmark report");

  Ok(())
}
