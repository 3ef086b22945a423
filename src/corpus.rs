use rand::Rng;

/// Random document embeddings plus one query, all of the same dimension.
pub struct Corpus {
  pub query: Vec<f32>,
  pub documents: Vec<Vec<f32>>,
}

impl Corpus {
  /// Documents are uniform in [-1, 1), the query uniform in [0, 1).
  ///
  /// A zero vector is possible in principle; ranking then reports it as degenerate.
  pub fn generate<R: Rng>(rng: &mut R, num_docs: usize, dimension: usize) -> Self {
    let documents = (0..num_docs)
      .map(|_| {
        (0..dimension)
          .map(|_| rng.random_range(-1.0..1.0))
          .collect()
      })
      .collect();
    let query = (0..dimension).map(|_| rng.random::<f32>()).collect();
    Self { query, documents }
  }
}
