//! Stream authentication and identity pinning.
//!
//! The credential is read from the stream's `authorization` metadata when the
//! first health check request arrives. Once verified, the stream is pinned to
//! that request's node id and later requests are only compared against it.

mod authenticator;
mod verifier;
pub use authenticator::*;
pub use verifier::*;


/// Metadata key carrying the proxy credential.
pub const AUTHORIZATION_KEY: &str = "authorization";
