//! Health Discovery Error Hierarchy
//!
//! Errors are grouped by the layer that raises them. Whether an error closes
//! the offending stream or is recovered locally is decided by
//! [`Error::is_fatal_to_stream`].

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

use crate::ProxyKind;
use crate::ResourceKey;
use crate::StreamId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (transport, tasks, signals)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Wire protocol violations on a single stream
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Stream authentication failures
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Topology store failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Snapshot build failures
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Per-stream bookkeeping failures
    #[error(transparent)]
    Stream(#[from] StreamError),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Node id is not of the form "<mesh>.<name>"
    #[error("Malformed node id {0:?}: expected \"<mesh>.<name>\"")]
    MalformedNodeId(String),

    /// A later request on an authenticated stream claimed another node id
    #[error("Node identity changed on stream from {pinned:?} to {received:?}")]
    NodeIdentityChanged { pinned: String, received: String },

    /// First request of a stream carried no node at all
    #[error("Health check request carries no node")]
    MissingNode,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Zero or several `authorization` metadata entries on the stream
    #[error("Expected exactly one authorization entry, found {found}")]
    MissingOrAmbiguousCredential { found: usize },

    /// The verifier rejected the credential
    #[error("Authentication failed for {key}: {reason}")]
    AuthenticationFailed { key: ResourceKey, reason: String },

    /// No verification strategy is registered for the proxy kind
    #[error("No verifier registered for proxy kind {0}")]
    NoVerifier(ProxyKind),

    /// Request arrived for a stream that was never opened
    #[error("Stream {0} is unknown to the authenticator")]
    UnknownStream(StreamId),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The proxy record is absent from the topology store
    #[error("Proxy {0} not found")]
    ProxyNotFound(ResourceKey),

    /// Optimistic concurrency check failed on update
    #[error("Write conflict on {key}: expected version {expected}, found {actual}")]
    StoreWriteConflict {
        key: ResourceKey,
        expected: u64,
        actual: u64,
    },

    /// Failures reading bootstrap records
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] toml::de::Error),

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Candidate snapshot failed its consistency check
    #[error("Inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),

    /// Any other snapshot build failure
    #[error("Snapshot generation failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Health report on a stream that never authenticated
    #[error("Stream {0} has no associated proxy")]
    NoAssociatedProxy(StreamId),

    /// Outbound or inbound channel dropped
    #[error("Stream channel closed: {0}")]
    ChannelClosed(String),

    /// Transport level receive failure
    #[error(transparent)]
    Receive(#[from] Box<tonic::Status>),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Internal server error")]
    ServerUnavailable,

    #[error("Node failed to start: {0}")]
    NodeStartFailed(String),

    #[error(transparent)]
    Transport(#[from] Box<tonic::transport::Error>),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("Retry timeout after {0:?}")]
    RetryTimeout(Duration),

    #[error("{0}")]
    SignalSenderClosed(String),
}

impl Error {
    /// Returns `true` when the error must close the stream it was raised on.
    ///
    /// Malformed node ids, store and generation failures are recovered
    /// locally: they are logged and the stream keeps running.
    pub fn is_fatal_to_stream(&self) -> bool {
        match self {
            Error::Protocol(ProtocolError::MalformedNodeId(_)) => false,
            Error::Protocol(ProtocolError::MissingNode) => false,
            Error::Store(_) => false,
            Error::Generation(_) => false,
            Error::Stream(StreamError::NoAssociatedProxy(_)) => false,
            _ => true,
        }
    }

    pub fn is_proxy_not_found(&self) -> bool {
        matches!(self, Error::Store(StoreError::ProxyNotFound(_)))
    }
}

// ============== Conversion Implementations ============== //
impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        SystemError::Transport(Box::new(err)).into()
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        SystemError::TaskFailed(err).into()
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        StreamError::Receive(Box::new(status)).into()
    }
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match &err {
            Error::Auth(_) => tonic::Status::unauthenticated(err.to_string()),
            Error::Protocol(ProtocolError::NodeIdentityChanged { .. }) => {
                tonic::Status::failed_precondition(err.to_string())
            }
            Error::Protocol(_) => tonic::Status::invalid_argument(err.to_string()),
            Error::Stream(StreamError::Receive(status)) => (**status).clone(),
            Error::Store(StoreError::ProxyNotFound(_)) => tonic::Status::not_found(err.to_string()),
            _ => tonic::Status::internal(err.to_string()),
        }
    }
}
