//! Closed taxonomy of network failures and the error-body mapping capability.

use std::fmt;

/// Maps a decoded error body to a message that can be shown to the user.
///
/// Implemented by every error-body shape the caller expects from an API.
/// Returning `None` means the body carries nothing worth showing and the
/// per-variant default description is used instead.
pub trait ErrorMapper {
  fn map_error(&self) -> Option<String>;
}

/// Presentation hint paired with each failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorIcon {
  CloudOff,
  LinkOff,
  ErrorOutline,
  NoEncryption,
}

/// Every way a remote call can fail.
///
/// Exactly one variant matches any given fault (see
/// [`RequestHandler::classify`](super::RequestHandler::classify) for the
/// precedence order). `code()` is the HTTP status when one exists and `-1`
/// otherwise. `E` is the caller-supplied error-body shape, populated only on
/// [`NetworkError::ErrorBody`].
///
/// Variants carry the rendered message of the underlying fault as `detail`
/// rather than the fault itself, so results stay cheap value objects that
/// compare structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError<E> {
  /// Transport security failure: expired or invalid certificate, failed TLS
  /// negotiation.
  UntrustedConnection { detail: Option<String> },
  /// I/O-level failure: no connectivity, timeout, connection reset.
  Network { detail: Option<String> },
  /// The remote answered 404.
  NotFound,
  /// The remote reported a server-side fault.
  ServerError { code: i32 },
  /// A client-side fault status whose body decoded into `E`.
  ErrorBody { code: i32, error: E },
  /// The response could not be decoded into the expected shape.
  ResponseSerialization { detail: Option<String> },
  /// Nothing else matched.
  Unknown { code: i32, detail: Option<String> },
}

impl<E> NetworkError<E> {
  /// The HTTP status behind this failure, or `-1` when none exists.
  pub fn code(&self) -> i32 {
    match self {
      Self::UntrustedConnection { .. } | Self::Network { .. } | Self::ResponseSerialization { .. } => {
        -1
      }
      Self::NotFound => 404,
      Self::ServerError { code } | Self::ErrorBody { code, .. } | Self::Unknown { code, .. } => {
        *code
      }
    }
  }

  /// Fixed description for each failure kind, shown when the error body
  /// offers nothing better.
  pub fn description(&self) -> &'static str {
    match self {
      Self::UntrustedConnection { .. } => "The connection to the server is not trusted",
      Self::Network { .. } => "Couldn't reach the server. Check your connection and try again",
      Self::NotFound => "The requested content wasn't found",
      Self::ServerError { .. } => "The server ran into an internal error",
      Self::ErrorBody { .. } | Self::Unknown { .. } => {
        "Something unexpected happened. Try again later"
      }
      Self::ResponseSerialization { .. } => "The server sent a response that couldn't be read",
    }
  }

  /// Icon hint for each failure kind.
  pub fn icon(&self) -> ErrorIcon {
    match self {
      Self::Network { .. } => ErrorIcon::CloudOff,
      Self::NotFound => ErrorIcon::LinkOff,
      Self::UntrustedConnection { .. } => ErrorIcon::NoEncryption,
      Self::ServerError { .. }
      | Self::ErrorBody { .. }
      | Self::ResponseSerialization { .. }
      | Self::Unknown { .. } => ErrorIcon::ErrorOutline,
    }
  }
}

impl<E: ErrorMapper> NetworkError<E> {
  /// The message to surface to the user: the decoded body's own message when
  /// present and non-blank, the per-variant default otherwise.
  pub fn display_message(&self) -> String {
    if let Self::ErrorBody { error, .. } = self {
      if let Some(message) = error.map_error() {
        if !message.trim().is_empty() {
          return message;
        }
      }
    }

    self.description().to_string()
  }
}

impl<E> fmt::Display for NetworkError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.description())
  }
}

impl<E: fmt::Debug> std::error::Error for NetworkError<E> {}
