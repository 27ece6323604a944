//! Transport fault shapes recognized by error classification.

use thiserror::Error;

/// A fault raised by one remote call attempt.
///
/// The client adapter reduces every transport failure to one of these shapes
/// before classification sees it: a security failure, a plain I/O failure
/// with no status, an HTTP response with a non-success status (body bytes
/// captured for error-body decoding), or a successful response whose body
/// didn't match the expected shape.
#[derive(Debug, Error)]
pub enum ApiFault {
  /// Certificate or TLS negotiation failure.
  #[error("untrusted connection: {detail}")]
  UntrustedConnection { detail: String },

  /// No connectivity, timeout or connection reset; no status available.
  #[error("network error: {detail}")]
  Io { detail: String },

  /// The remote answered with a non-success status.
  #[error("http status {status}")]
  Http { status: u16, body: Vec<u8> },

  /// The response body could not be decoded into the expected shape.
  #[error("response decoding failed: {detail}")]
  Decode { detail: String },
}

impl ApiFault {
  /// Map a reqwest transport error into a fault shape.
  ///
  /// Responses that carried a status never take this path - the client turns
  /// those into [`ApiFault::Http`] with the body bytes before returning.
  pub fn from_transport(err: reqwest::Error) -> Self {
    if err.is_decode() {
      return Self::Decode {
        detail: err.to_string(),
      };
    }

    if is_tls_failure(&err) {
      return Self::UntrustedConnection {
        detail: err.to_string(),
      };
    }

    Self::Io {
      detail: err.to_string(),
    }
  }

  /// Wrap a serde decoding error of a successful response body.
  pub fn from_decode(err: serde_json::Error) -> Self {
    Self::Decode {
      detail: err.to_string(),
    }
  }
}

/// Walk the source chain looking for a certificate/TLS failure.
///
/// reqwest doesn't expose the underlying TLS error types, so this matches on
/// the rendered messages of the rustls/hyper causes.
fn is_tls_failure(err: &reqwest::Error) -> bool {
  let mut source = std::error::Error::source(err);

  while let Some(cause) = source {
    let text = cause.to_string().to_lowercase();
    if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
      return true;
    }
    source = cause.source();
  }

  false
}
