mod error;
pub use error::AppError;

mod env;
pub use env::{AppEnv, DEFAULT_MAX_MEMORY};

pub mod similarity;
