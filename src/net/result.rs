//! Typed outcomes for single and cache-fused remote calls.

use super::error::NetworkError;

/// Outcome of exactly one remote call attempt.
///
/// Built by the request handler when the call resolves; immutable and never
/// reused across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkResult<T, E> {
  Success(T),
  Error(NetworkError<E>),
}

impl<T, E> NetworkResult<T, E> {
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success(_))
  }

  /// The successful value, consuming the result.
  pub fn success(self) -> Option<T> {
    match self {
      Self::Success(value) => Some(value),
      Self::Error(_) => None,
    }
  }

  pub fn error(&self) -> Option<&NetworkError<E>> {
    match self {
      Self::Success(_) => None,
      Self::Error(error) => Some(error),
    }
  }

  /// Map the successful value, leaving errors untouched.
  pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> NetworkResult<U, E> {
    match self {
      Self::Success(value) => NetworkResult::Success(f(value)),
      Self::Error(error) => NetworkResult::Error(error),
    }
  }

  /// Convert into a plain `Result` for `?`-style composition.
  pub fn into_result(self) -> Result<T, NetworkError<E>> {
    match self {
      Self::Success(value) => Ok(value),
      Self::Error(error) => Err(error),
    }
  }
}

/// Outcome of a cache-fused read.
///
/// Always carries the best-known local snapshot: possibly absent while
/// loading or after a failure, always present on success. One fused
/// operation emits an ordered sequence of these, `Loading` first, ending
/// after the terminal `Success`/`Error` emissions or when the local source's
/// own sequence ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedResult<T, E> {
  /// Emitted before the remote call resolves, with whatever is cached.
  Loading(Option<T>),
  /// Fresh local state after a successful refresh (or a cache-only read).
  Success(T),
  /// The remote call failed; paired with the latest local snapshot.
  Error(Option<T>, NetworkError<E>),
}

impl<T, E> CachedResult<T, E> {
  /// The local data snapshot carried by this state, if any.
  pub fn data(&self) -> Option<&T> {
    match self {
      Self::Loading(data) => data.as_ref(),
      Self::Success(data) => Some(data),
      Self::Error(data, _) => data.as_ref(),
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, Self::Loading(_))
  }

  pub fn error(&self) -> Option<&NetworkError<E>> {
    match self {
      Self::Error(_, error) => Some(error),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn network_result_accessors() {
    let ok: NetworkResult<u32, ()> = NetworkResult::Success(7);
    assert!(ok.is_success());
    assert_eq!(ok.clone().success(), Some(7));
    assert_eq!(ok.map(|v| v * 2).into_result(), Ok(14));

    let err: NetworkResult<u32, ()> = NetworkResult::Error(NetworkError::NotFound);
    assert!(!err.is_success());
    assert_eq!(err.error(), Some(&NetworkError::NotFound));
  }

  #[test]
  fn cached_result_exposes_latest_snapshot() {
    let loading: CachedResult<u32, ()> = CachedResult::Loading(Some(1));
    assert_eq!(loading.data(), Some(&1));
    assert!(loading.is_loading());

    let failed: CachedResult<u32, ()> = CachedResult::Error(None, NetworkError::NotFound);
    assert_eq!(failed.data(), None);
    assert_eq!(failed.error(), Some(&NetworkError::NotFound));
  }
}
