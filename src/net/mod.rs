//! Network result abstraction.
//!
//! Converts arbitrary remote-call failures into a closed, typed error
//! taxonomy, optionally fused with a local-cache read/write cycle:
//! - Typed outcomes ([`NetworkResult`], [`CachedResult`]) that callers match
//!   exhaustively
//! - A closed failure taxonomy ([`NetworkError`]) with per-variant
//!   presentation hints, overridable through the [`ErrorMapper`] capability
//! - A stateless [`RequestHandler`] offering a single-shot call wrapper, a
//!   lazy stream wrapper and a cache-fused read

mod error;
mod fault;
mod handler;
mod result;

pub use error::{ErrorIcon, ErrorMapper, NetworkError};
pub use fault::ApiFault;
pub use handler::{Envelope, RequestHandler};
pub use result::{CachedResult, NetworkResult};
