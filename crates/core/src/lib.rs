mod error;
pub use error::{RankError, VectorRef};

mod ranker;
pub use ranker::{BlockPlan, Bounded, FullScan, ScoredIdx, Strategy, TopKRanker, ZeroVectorPolicy};
pub use ranker::{rank_top_k, rank_top_k_bounded};

mod benchmark;
pub use benchmark::{BenchmarkReport, benchmark};
