//! Vector math shared by the ranking strategies.
//!
//! Every strategy scores through [`cosine_from_parts`] with inputs produced by
//! [`dot`] and [`l2_norm`], so the same pair always yields the same bits.

/// Dot product accumulated in `f64`.
///
/// Callers must pass slices of equal length; extra elements are ignored.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
  debug_assert_eq!(a.len(), b.len(), "embedding dimensions must match");
  a.iter()
    .zip(b.iter())
    .fold(0.0_f64, |acc, (&x, &y)| f64::from(x).mul_add(f64::from(y), acc))
}

/// Euclidean length accumulated in `f64`.
#[must_use]
pub fn l2_norm(v: &[f32]) -> f64 {
  v.iter()
    .fold(0.0_f64, |acc, &x| f64::from(x).mul_add(f64::from(x), acc))
    .sqrt()
}

/// Cosine similarity from a precomputed dot product and both norms.
///
/// Returns `None` when either norm is zero. The result is clamped to [-1.0, 1.0].
#[must_use]
pub fn cosine_from_parts(dot: f64, norm_a: f64, norm_b: f64) -> Option<f32> {
  let denom = norm_a * norm_b;
  if denom == 0.0 {
    return None;
  }
  Some((dot / denom).clamp(-1.0, 1.0) as f32)
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in [-1.0, 1.0] where 1.0 means identical direction, or `None`
/// if the dimensions differ or either vector has zero length.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
  if a.len() != b.len() {
    return None;
  }
  cosine_from_parts(dot(a, b), l2_norm(a), l2_norm(b))
}
