//! Wire Protocol
//!
//! Defines the frame codec and the request/response envelopes exchanged
//! between stubs and skeletons.
//!
//! A frame is a 4-byte big-endian payload length followed by a
//! bincode-encoded value. A session is: connect, one request frame, one
//! response frame, close. Short or oversized frames are transport failures.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::error::{DfsError, DfsResult};

/// Upper bound on a single frame payload. Large enough for a full-file
/// write request, small enough to stop a corrupt length prefix from
/// exhausting memory.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// One remote invocation: the method name, the ordered parameter-type
/// descriptors that participate in method resolution, and the encoded
/// argument value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    pub method: String,
    pub param_types: Vec<String>,
    pub args: Vec<u8>,
}

/// The status-coded reply envelope.
///
/// `payload` is the encoded return value when the status is `Ok`, and an
/// encoded [`DfsError`] otherwise; the client decodes and re-raises it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResponse {
    pub status: u16,
    pub payload: Vec<u8>,
}

impl WireResponse {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            status: ResponseStatus::Ok.code(),
            payload,
        }
    }

    /// An error envelope carrying `error` for the client to re-raise.
    pub fn fault(status: ResponseStatus, error: &DfsError) -> Self {
        // An empty payload decodes as a transport failure on the client.
        let payload = bincode::serialize(error).unwrap_or_default();
        Self {
            status: status.code(),
            payload,
        }
    }
}

/// Response status codes.
///
/// `Unauthorized`, `Forbidden`, `Conflict` and `Unavailable` are defined
/// for protocol completeness but never emitted by this implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ResponseStatus {
    /// Successful invocation; the payload is the return value.
    Ok = 200,
    /// The target method returned an error; the payload carries it.
    BadRequest = 400,
    /// Reserved: invocation denied by the runtime.
    Unauthorized = 401,
    /// Reserved.
    Forbidden = 403,
    /// No handler matches the requested method name and parameter types.
    NotFound = 404,
    /// Reserved.
    Conflict = 409,
    /// Request decoding failed or the server hit an unexpected condition.
    InternalServerError = 500,
    /// Reserved.
    Unavailable = 503,
}

impl ResponseStatus {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ResponseStatus {
    type Error = DfsError;

    fn try_from(code: u16) -> DfsResult<Self> {
        Ok(match code {
            200 => ResponseStatus::Ok,
            400 => ResponseStatus::BadRequest,
            401 => ResponseStatus::Unauthorized,
            403 => ResponseStatus::Forbidden,
            404 => ResponseStatus::NotFound,
            409 => ResponseStatus::Conflict,
            500 => ResponseStatus::InternalServerError,
            503 => ResponseStatus::Unavailable,
            other => return Err(DfsError::Remote(format!("unknown status code {other}"))),
        })
    }
}

/// Writes one frame and flushes the stream.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> DfsResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = bincode::serialize(value).map_err(DfsError::remote)?;
    if payload.len() > MAX_FRAME_BYTES as usize {
        return Err(DfsError::Remote(format!(
            "frame of {} bytes exceeds the {} byte limit",
            payload.len(),
            MAX_FRAME_BYTES
        )));
    }
    writer
        .write_u32(payload.len() as u32)
        .await
        .map_err(DfsError::remote)?;
    writer.write_all(&payload).await.map_err(DfsError::remote)?;
    writer.flush().await.map_err(DfsError::remote)?;
    Ok(())
}

/// Reads one frame. A short stream, an oversized length prefix, or a
/// payload that does not decode are all transport failures.
pub async fn read_frame<R, T>(reader: &mut R) -> DfsResult<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await.map_err(DfsError::remote)?;
    if len > MAX_FRAME_BYTES {
        return Err(DfsError::Remote(format!(
            "frame length {len} exceeds the {MAX_FRAME_BYTES} byte limit"
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(DfsError::remote)?;
    bincode::deserialize(&payload).map_err(DfsError::remote)
}
