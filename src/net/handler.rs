//! Request orchestration: one remote call in, one typed result out.

use std::future::Future;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::NetworkError;
use super::fault::ApiFault;
use super::result::{CachedResult, NetworkResult};

/// How the remote API wraps error bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Envelope {
  /// The body is the error shape itself.
  #[default]
  Plain,
  /// The body nests the error shape inside a single-field JSON object.
  Enveloped,
}

/// Stateless orchestrator that runs remote calls and converts every outcome
/// into a typed result.
///
/// The only configuration is the error-body [`Envelope`] strategy; nothing is
/// retained across calls. Callers own the remote operation and the local
/// store and lend them in per call. Dropping a returned future or stream
/// cancels the in-flight call and any pending local write.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestHandler {
  envelope: Envelope,
}

impl RequestHandler {
  pub fn new(envelope: Envelope) -> Self {
    Self { envelope }
  }

  /// Run one remote call and classify its outcome.
  ///
  /// The call is invoked exactly once. A normal return becomes `Success`;
  /// any fault is classified into exactly one [`NetworkError`] variant. No
  /// retry happens here - retry policy belongs to the caller.
  pub async fn handle<T, E, F, Fut>(&self, remote_call: F) -> NetworkResult<T, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiFault>>,
    E: DeserializeOwned,
  {
    match remote_call().await {
      Ok(value) => NetworkResult::Success(value),
      Err(fault) => NetworkResult::Error(self.classify(fault)),
    }
  }

  /// Lazy single-element wrapper around [`RequestHandler::handle`].
  ///
  /// The call runs only when the stream is polled, yields its one result and
  /// completes. Lets sequence-composing callers integrate a one-shot call
  /// without special-casing it.
  pub fn handle_as_stream<T, E, F, Fut>(
    &self,
    remote_call: F,
  ) -> impl Stream<Item = NetworkResult<T, E>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiFault>>,
    E: DeserializeOwned,
  {
    let handler = *self;
    stream::once(async move { handler.handle(remote_call).await })
  }

  /// Cache-fused read: merge one remote call with a local data source.
  ///
  /// The returned stream is cold and one-shot. When consumed it:
  ///
  /// 1. emits `Loading(None)`;
  /// 2. reads the first value from `fetch_from_local`;
  /// 3. asks `should_fetch_from_remote` whether a refresh is warranted - if
  ///    not, re-subscribes to `fetch_from_local` and re-emits every value as
  ///    `Success`;
  /// 4. otherwise emits `Loading(local)` and runs the remote call once. On
  ///    success the value is written through `save_remote_data` before the
  ///    local source is re-read, so consumers always see the freshest local
  ///    state; on failure every re-read value is paired with the error.
  ///
  /// A failed write-through does not escape the stream: it is logged and
  /// surfaced as a terminal `Error` carrying the latest local snapshot and
  /// an `Unknown` error.
  pub fn handle_with_cache<Db, T, E, L, Ls, P, F, Fut, S, SFut>(
    &self,
    fetch_from_local: L,
    should_fetch_from_remote: P,
    remote_call: F,
    save_remote_data: S,
  ) -> BoxStream<'static, CachedResult<Db, E>>
  where
    Db: Clone + Send + 'static,
    T: Send + 'static,
    E: DeserializeOwned + Clone + Send + 'static,
    L: Fn() -> Ls + Send + 'static,
    Ls: Stream<Item = Db> + Send + 'static,
    P: FnOnce(Option<&Db>) -> bool + Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ApiFault>> + Send + 'static,
    S: FnOnce(T) -> SFut + Send + 'static,
    SFut: Future<Output = color_eyre::Result<()>> + Send + 'static,
  {
    let handler = *self;

    stream::once(future::ready(CachedResult::Loading(None)))
      .chain(
        stream::once(async move {
          let mut first = fetch_from_local().boxed();
          let local = first.next().await;
          drop(first);

          if !should_fetch_from_remote(local.as_ref()) {
            return fetch_from_local().map(CachedResult::Success).boxed();
          }

          let loading = stream::once(future::ready(CachedResult::Loading(local)));

          let settled = stream::once(async move {
            match handler.handle(remote_call).await {
              NetworkResult::Success(value) => {
                if let Err(err) = save_remote_data(value).await {
                  warn!("write-through to the local store failed: {err:#}");
                  let error = NetworkError::Unknown {
                    code: -1,
                    detail: Some(err.to_string()),
                  };
                  let mut latest = fetch_from_local().boxed();
                  let data = latest.next().await;
                  return stream::once(future::ready(CachedResult::Error(data, error))).boxed();
                }

                fetch_from_local().map(CachedResult::Success).boxed()
              }
              NetworkResult::Error(error) => fetch_from_local()
                .map(move |data| CachedResult::Error(Some(data), error.clone()))
                .boxed(),
            }
          })
          .flatten();

          loading.chain(settled).boxed()
        })
        .flatten(),
      )
      .boxed()
  }

  /// Classify a fault into exactly one [`NetworkError`].
  ///
  /// Precedence, first match wins: transport security failure, plain I/O
  /// failure, status 404, status 500, any other status with a decodable
  /// error body, decode failure of a successful response. An error body
  /// that fails to decode yields `Unknown`.
  pub fn classify<E: DeserializeOwned>(&self, fault: ApiFault) -> NetworkError<E> {
    debug!("remote call fault: {fault}");

    match fault {
      ApiFault::UntrustedConnection { detail } => NetworkError::UntrustedConnection {
        detail: Some(detail),
      },
      ApiFault::Io { detail } => NetworkError::Network {
        detail: Some(detail),
      },
      ApiFault::Http { status: 404, .. } => NetworkError::NotFound,
      ApiFault::Http { status: 500, .. } => NetworkError::ServerError { code: 500 },
      ApiFault::Http { status, body } => match self.decode_error_body::<E>(&body) {
        Ok(error) => NetworkError::ErrorBody {
          code: i32::from(status),
          error,
        },
        Err(err) => {
          warn!("undecodable error body for status {status}: {err}");
          NetworkError::Unknown {
            code: -1,
            detail: Some(err.to_string()),
          }
        }
      },
      ApiFault::Decode { detail } => NetworkError::ResponseSerialization {
        detail: Some(detail),
      },
    }
  }

  /// Decode an error body into `E`, unwrapping the outer JSON object first
  /// when the API envelopes its errors.
  fn decode_error_body<E: DeserializeOwned>(&self, body: &[u8]) -> Result<E, serde_json::Error> {
    match self.envelope {
      Envelope::Plain => serde_json::from_slice(body),
      Envelope::Enveloped => {
        use serde::de::Error as _;

        let value: serde_json::Value = serde_json::from_slice(body)?;
        let inner = match value {
          serde_json::Value::Object(map) => map
            .into_iter()
            .next()
            .map(|(_, inner)| inner)
            .unwrap_or(serde_json::Value::Null),
          _ => return Err(serde_json::Error::custom("expected an enveloped JSON object")),
        };

        serde_json::from_value(inner)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;

  use color_eyre::eyre::eyre;
  use serde::Deserialize;

  use super::*;
  use crate::net::ErrorMapper;
  use crate::store::{LocalStore, MemoryStore};

  #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
  struct TestError {
    message: String,
  }

  impl ErrorMapper for TestError {
    fn map_error(&self) -> Option<String> {
      Some(self.message.clone())
    }
  }

  fn handler() -> RequestHandler {
    RequestHandler::new(Envelope::Plain)
  }

  fn classify(fault: ApiFault) -> NetworkError<TestError> {
    handler().classify(fault)
  }

  #[test]
  fn io_faults_classify_as_network() {
    let error = classify(ApiFault::Io {
      detail: "connection reset".into(),
    });

    assert!(matches!(error, NetworkError::Network { .. }));
    assert_eq!(error.code(), -1);
  }

  #[test]
  fn tls_faults_classify_as_untrusted_connection() {
    let error = classify(ApiFault::UntrustedConnection {
      detail: "certificate expired".into(),
    });

    assert!(matches!(error, NetworkError::UntrustedConnection { .. }));
  }

  #[test]
  fn status_404_classifies_as_not_found_regardless_of_body() {
    let error = classify(ApiFault::Http {
      status: 404,
      body: br#"{"message": "gone"}"#.to_vec(),
    });

    assert_eq!(error, NetworkError::NotFound);
  }

  #[test]
  fn status_500_classifies_as_server_error() {
    let error = classify(ApiFault::Http {
      status: 500,
      body: Vec::new(),
    });

    assert_eq!(error, NetworkError::ServerError { code: 500 });
  }

  #[test]
  fn other_statuses_with_decodable_body_classify_as_error_body() {
    let error = classify(ApiFault::Http {
      status: 422,
      body: br#"{"message": "unprocessable"}"#.to_vec(),
    });

    assert_eq!(
      error,
      NetworkError::ErrorBody {
        code: 422,
        error: TestError {
          message: "unprocessable".into(),
        },
      }
    );
  }

  #[test]
  fn other_statuses_with_undecodable_body_classify_as_unknown() {
    let error = classify(ApiFault::Http {
      status: 422,
      body: b"<html>nope</html>".to_vec(),
    });

    assert!(matches!(error, NetworkError::Unknown { code: -1, .. }));
  }

  #[test]
  fn decode_faults_classify_as_response_serialization() {
    let error = classify(ApiFault::Decode {
      detail: "missing field `id`".into(),
    });

    assert!(matches!(error, NetworkError::ResponseSerialization { .. }));
  }

  #[test]
  fn classification_is_idempotent() {
    let fault = || ApiFault::Http {
      status: 422,
      body: br#"{"message": "same"}"#.to_vec(),
    };

    assert_eq!(classify(fault()), classify(fault()));
  }

  #[test]
  fn enveloped_bodies_are_unwrapped_before_decoding() {
    let enveloped = RequestHandler::new(Envelope::Enveloped);

    let error: NetworkError<TestError> = enveloped.classify(ApiFault::Http {
      status: 422,
      body: br#"{"error": {"message": "wrapped"}}"#.to_vec(),
    });

    assert_eq!(
      error,
      NetworkError::ErrorBody {
        code: 422,
        error: TestError {
          message: "wrapped".into(),
        },
      }
    );
  }

  #[test]
  fn enveloped_non_object_bodies_fail_to_decode() {
    let enveloped = RequestHandler::new(Envelope::Enveloped);

    let error: NetworkError<TestError> = enveloped.classify(ApiFault::Http {
      status: 422,
      body: br#"["not", "an", "object"]"#.to_vec(),
    });

    assert!(matches!(error, NetworkError::Unknown { .. }));
  }

  #[tokio::test]
  async fn handle_wraps_a_normal_return_in_success() {
    let result: NetworkResult<u32, TestError> = handler().handle(|| async { Ok(42) }).await;

    assert_eq!(result, NetworkResult::Success(42));
  }

  #[tokio::test]
  async fn handle_never_raises() {
    let result: NetworkResult<u32, TestError> = handler()
      .handle(|| async {
        Err(ApiFault::Io {
          detail: "timed out".into(),
        })
      })
      .await;

    assert!(matches!(
      result,
      NetworkResult::Error(NetworkError::Network { .. })
    ));
  }

  #[tokio::test]
  async fn handle_as_stream_is_lazy_and_single_shot() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);

    let stream = handler().handle_as_stream::<u32, TestError, _, _>(move || {
      flag.store(true, Ordering::SeqCst);
      async { Ok(7) }
    });

    assert!(!called.load(Ordering::SeqCst));

    let results: Vec<_> = stream.collect().await;
    assert!(called.load(Ordering::SeqCst));
    assert_eq!(results, vec![NetworkResult::Success(7)]);
  }

  #[tokio::test]
  async fn fused_read_refreshes_and_reemits_fresh_local_state() {
    let store: MemoryStore<String> = MemoryStore::new();
    let fetch_store = store.clone();
    let save_store = store.clone();

    let states: Vec<CachedResult<String, TestError>> = handler()
      .handle_with_cache(
        move || fetch_store.watch(),
        |_| true,
        || async { Ok("fresh".to_string()) },
        move |value: String| async move { save_store.save(&format!("{value}-stored")).await },
      )
      .collect()
      .await;

    assert_eq!(
      states,
      vec![
        CachedResult::Loading(None),
        CachedResult::Loading(None),
        CachedResult::Success("fresh-stored".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn fused_read_without_remote_reemits_every_local_value() {
    let fetched = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fetched);

    let states: Vec<CachedResult<&str, TestError>> = handler()
      .handle_with_cache(
        || stream::iter(vec!["a", "b"]),
        |_| false,
        move || {
          flag.store(true, Ordering::SeqCst);
          async { Ok("unused") }
        },
        |_| async { Ok(()) },
      )
      .collect()
      .await;

    assert_eq!(
      states,
      vec![
        CachedResult::Loading(None),
        CachedResult::Success("a"),
        CachedResult::Success("b"),
      ]
    );
    assert!(!fetched.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn fused_read_pairs_failures_with_the_cached_value() {
    let store: MemoryStore<String> = MemoryStore::new();
    store.save(&"cached".to_string()).await.unwrap();
    let fetch_store = store.clone();

    let states: Vec<CachedResult<String, TestError>> = handler()
      .handle_with_cache(
        move || fetch_store.watch(),
        |_| true,
        || async {
          Err::<String, _>(ApiFault::Http {
            status: 404,
            body: Vec::new(),
          })
        },
        |_| async { Ok(()) },
      )
      .collect()
      .await;

    assert_eq!(
      states,
      vec![
        CachedResult::Loading(None),
        CachedResult::Loading(Some("cached".to_string())),
        CachedResult::Error(Some("cached".to_string()), NetworkError::NotFound),
      ]
    );
  }

  #[tokio::test]
  async fn fused_read_surfaces_write_through_failures_as_unknown() {
    let store: MemoryStore<String> = MemoryStore::new();
    let fetch_store = store.clone();

    let states: Vec<CachedResult<String, TestError>> = handler()
      .handle_with_cache(
        move || fetch_store.watch(),
        |_| true,
        || async { Ok("fresh".to_string()) },
        |_| async { Err(eyre!("disk full")) },
      )
      .collect()
      .await;

    assert_eq!(states.len(), 3);
    assert!(matches!(
      &states[2],
      CachedResult::Error(None, NetworkError::Unknown { code: -1, .. })
    ));
  }
}
