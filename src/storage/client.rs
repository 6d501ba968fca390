//! Typed stubs for the two storage-server interfaces.
//!
//! A stub carries only the interface identity and the server's address;
//! every method performs one remote exchange. Stubs are serializable so
//! they can travel through registration and `get_storage` calls.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::protocol::{
    COMMAND_INTERFACE, CREATE_PARAMS, DELETE_PARAMS, METHOD_CREATE, METHOD_DELETE, METHOD_READ,
    METHOD_SIZE, METHOD_WRITE, READ_PARAMS, ReadRequest, SIZE_PARAMS, STORAGE_INTERFACE,
    WRITE_PARAMS, WriteRequest,
};
use crate::common::error::{DfsError, DfsResult};
use crate::common::path::Path;
use crate::rpc::skeleton::Skeleton;
use crate::rpc::stub::StubRef;

fn check_interface(skeleton: &Skeleton, expected: &str) -> DfsResult<()> {
    if skeleton.interface_name() != expected {
        return Err(DfsError::InvalidArgument(format!(
            "skeleton serves {:?}, not the {expected:?} interface",
            skeleton.interface_name()
        )));
    }
    Ok(())
}

/// Client access to a storage server's byte operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageStub {
    endpoint: StubRef,
}

impl StorageStub {
    pub fn for_address(addr: SocketAddr) -> Self {
        Self {
            endpoint: StubRef::for_address(STORAGE_INTERFACE, addr),
        }
    }

    pub fn for_skeleton(skeleton: &Skeleton) -> DfsResult<Self> {
        check_interface(skeleton, STORAGE_INTERFACE)?;
        Ok(Self {
            endpoint: StubRef::for_skeleton(skeleton)?,
        })
    }

    pub async fn for_skeleton_with_hostname(
        skeleton: &Skeleton,
        hostname: &str,
    ) -> DfsResult<Self> {
        check_interface(skeleton, STORAGE_INTERFACE)?;
        Ok(Self {
            endpoint: StubRef::for_skeleton_with_hostname(skeleton, hostname).await?,
        })
    }

    pub async fn size(&self, path: &Path) -> DfsResult<u64> {
        self.endpoint.call(METHOD_SIZE, SIZE_PARAMS, path).await
    }

    pub async fn read(&self, path: &Path, offset: i64, length: i64) -> DfsResult<Vec<u8>> {
        let request = ReadRequest {
            path: path.clone(),
            offset,
            length,
        };
        self.endpoint.call(METHOD_READ, READ_PARAMS, &request).await
    }

    pub async fn write(&self, path: &Path, offset: i64, data: Vec<u8>) -> DfsResult<()> {
        let request = WriteRequest {
            path: path.clone(),
            offset,
            data,
        };
        self.endpoint
            .call(METHOD_WRITE, WRITE_PARAMS, &request)
            .await
    }
}

impl fmt::Display for StorageStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.endpoint.fmt(f)
    }
}

/// Naming-server access to a storage server's structural commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandStub {
    endpoint: StubRef,
}

impl CommandStub {
    pub fn for_address(addr: SocketAddr) -> Self {
        Self {
            endpoint: StubRef::for_address(COMMAND_INTERFACE, addr),
        }
    }

    pub fn for_skeleton(skeleton: &Skeleton) -> DfsResult<Self> {
        check_interface(skeleton, COMMAND_INTERFACE)?;
        Ok(Self {
            endpoint: StubRef::for_skeleton(skeleton)?,
        })
    }

    pub async fn for_skeleton_with_hostname(
        skeleton: &Skeleton,
        hostname: &str,
    ) -> DfsResult<Self> {
        check_interface(skeleton, COMMAND_INTERFACE)?;
        Ok(Self {
            endpoint: StubRef::for_skeleton_with_hostname(skeleton, hostname).await?,
        })
    }

    pub async fn create(&self, path: &Path) -> DfsResult<bool> {
        self.endpoint.call(METHOD_CREATE, CREATE_PARAMS, path).await
    }

    pub async fn delete(&self, path: &Path) -> DfsResult<bool> {
        self.endpoint.call(METHOD_DELETE, DELETE_PARAMS, path).await
    }
}

impl fmt::Display for CommandStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.endpoint.fmt(f)
    }
}
