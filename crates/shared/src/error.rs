use std::{
  backtrace::{Backtrace, BacktraceStatus},
  fmt::{Debug, Display},
};

/// Application-level error for the harness and benchmark boundary.
///
/// Typed ranking errors convert into this with `?`; the wrapped error stays
/// reachable through [`AppError::downcast_ref`].
pub struct AppError {
  err: anyhow::Error,
}

impl AppError {
  pub fn new<E: Into<anyhow::Error>>(err: E) -> Self {
    Self { err: err.into() }
  }

  /// Wrap with an extra line of context, keeping the source chain.
  #[must_use]
  pub fn context<C>(self, context: C) -> Self
  where
    C: Display + Send + Sync + 'static,
  {
    Self {
      err: self.err.context(context),
    }
  }

  pub fn downcast_ref<E>(&self) -> Option<&E>
  where
    E: Display + Debug + Send + Sync + 'static,
  {
    self.err.downcast_ref::<E>()
  }

  /// Get backtrace from anyhow (requires `RUST_BACKTRACE=1` to capture)
  pub fn backtrace(&self) -> &Backtrace {
    self.err.backtrace()
  }
}

// `main` returns `Result<(), AppError>`, so this is what a failed run prints.
impl Debug for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:#}", self.err)?;
    if cfg!(debug_assertions) {
      let bt = self.err.backtrace();
      if bt.status() == BacktraceStatus::Captured {
        write!(f, "\nBacktrace:\n{bt}")?;
      } else {
        write!(f, "\n(hint: set RUST_BACKTRACE=1 to enable backtrace)")?;
      }
    }
    Ok(())
  }
}

impl Display for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:#}", self.err)
  }
}

impl<E> From<E> for AppError
where
  E: Into<anyhow::Error>,
{
  fn from(err: E) -> Self {
    Self::new(err)
  }
}
