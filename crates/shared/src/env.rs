use std::env;
use std::str::FromStr;

use anyhow::anyhow;

use crate::AppError;

/// 5 GB, the budget the retrieval experiments were tuned for.
///
/// Kept as `u64` so it fits on 32-bit targets; see [`AppEnv::memory_budget`].
pub const DEFAULT_MAX_MEMORY: u64 = 5_000_000_000;

pub struct AppEnv {
  pub num_docs: usize,
  pub dimension: usize,
  pub top_k: usize,
  pub max_memory: u64,
  pub iterations: u32,
  pub seed: Option<u64>,
}

impl AppEnv {
  /// Read the harness settings from the process environment.
  ///
  /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
  pub fn load() -> Result<Self, AppError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Same as [`AppEnv::load`] but reads variables through `lookup`.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
  where
    F: Fn(&str) -> Option<String>,
  {
    Ok(Self {
      num_docs: parse_or(&lookup, "COSRANK_NUM_DOCS", 10)?,
      dimension: parse_or(&lookup, "COSRANK_DIMENSION", 100)?,
      top_k: parse_or(&lookup, "COSRANK_TOP_K", 1)?,
      max_memory: parse_or(&lookup, "COSRANK_MAX_MEMORY", DEFAULT_MAX_MEMORY)?,
      iterations: parse_or(&lookup, "COSRANK_ITERATIONS", 100)?,
      seed: parse_opt(&lookup, "COSRANK_SEED")?,
    })
  }

  /// `max_memory` in bytes as a `usize`, saturating where the address space is smaller.
  #[must_use]
  pub fn memory_budget(&self) -> usize {
    usize::try_from(self.max_memory).unwrap_or(usize::MAX)
  }
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(key) {
    None => Ok(None),
    Some(raw) if raw.trim().is_empty() => Ok(None),
    Some(raw) => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|e| AppError::new(anyhow!("{key}: invalid value {raw:?}: {e}"))),
  }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: std::fmt::Display,
{
  Ok(parse_opt(lookup, key)?.unwrap_or(default))
}
