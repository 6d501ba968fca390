//! Storage Wire Protocol
//!
//! Interface and method names, parameter-type descriptors, and the request
//! DTOs for the two remote interfaces a storage server exposes. These are
//! shared by the server-side dispatch tables and the client stubs so both
//! ends resolve methods against the same signatures.

use serde::{Deserialize, Serialize};

use crate::common::path::Path;

/// Interface serving client byte access (`size`, `read`, `write`).
pub const STORAGE_INTERFACE: &str = "storage";
/// Interface serving naming-server commands (`create`, `delete`).
pub const COMMAND_INTERFACE: &str = "command";

pub const METHOD_SIZE: &str = "size";
pub const SIZE_PARAMS: &[&str] = &["path"];

pub const METHOD_READ: &str = "read";
pub const READ_PARAMS: &[&str] = &["path", "i64", "i64"];

pub const METHOD_WRITE: &str = "write";
pub const WRITE_PARAMS: &[&str] = &["path", "i64", "bytes"];

pub const METHOD_CREATE: &str = "create";
pub const CREATE_PARAMS: &[&str] = &["path"];

pub const METHOD_DELETE: &str = "delete";
pub const DELETE_PARAMS: &[&str] = &["path"];

/// Byte-range read request. Offsets and lengths are signed on the wire so
/// a negative value is representable and can be rejected as out of bounds
/// rather than silently wrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRequest {
    pub path: Path,
    pub offset: i64,
    pub length: i64,
}

/// Byte-range write request. The file is extended when the write runs past
/// its current end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    pub path: Path,
    pub offset: i64,
    pub data: Vec<u8>,
}
