use serde::{Deserialize, Serialize};

/// Failure taxonomy shared by every interface in the system.
///
/// The enum is serializable because server-side errors travel inside the
/// response envelope and are re-raised on the client with the original
/// cause intact. `Remote` is reserved for transport and protocol failures
/// produced by the RPC layer itself; everything else is an application
/// error that a target object returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DfsError {
    /// Transport or protocol failure: connection refused, short or corrupt
    /// stream, unknown status code, server not started.
    #[error("remote call failed: {0}")]
    Remote(String),
    /// A path, file, directory or method the caller named does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Malformed path string, reserved character in a component, bad
    /// hostname, or a similar caller mistake.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Negative offset or length, or a read past the end of a file.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
    /// Permission denied or a lower-level filesystem failure.
    #[error("i/o failure: {0}")]
    Io(String),
    /// `start` was called on a server that is running or already stopped.
    #[error("server already started")]
    AlreadyStarted,
    /// The exact (storage, command) stub pair is already registered.
    #[error("storage server already registered")]
    AlreadyRegistered,
    /// No handler matches the requested method name and parameter types.
    #[error("no such method: {0}")]
    NoSuchMethod(String),
    /// Request decoding failed or the server hit an unexpected condition.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl DfsError {
    pub fn remote(err: impl std::fmt::Display) -> Self {
        Self::Remote(err.to_string())
    }

    pub fn io(err: impl std::fmt::Display) -> Self {
        Self::Io(err.to_string())
    }
}

pub type DfsResult<T> = Result<T, DfsError>;
