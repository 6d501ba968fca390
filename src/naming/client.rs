//! Typed stubs for the naming server's two interfaces, plus the
//! well-known-port helpers clients and storage servers bootstrap with.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::protocol::{
    CREATE_DIRECTORY_PARAMS, CREATE_FILE_PARAMS, DELETE_PARAMS, GET_STORAGE_PARAMS,
    IS_DIRECTORY_PARAMS, LIST_PARAMS, METHOD_CREATE_DIRECTORY, METHOD_CREATE_FILE, METHOD_DELETE,
    METHOD_GET_STORAGE, METHOD_IS_DIRECTORY, METHOD_LIST, METHOD_REGISTER, REGISTER_PARAMS,
    REGISTRATION_INTERFACE, REGISTRATION_PORT, RegisterRequest, SERVICE_INTERFACE, SERVICE_PORT,
};
use crate::common::error::DfsResult;
use crate::common::path::Path;
use crate::rpc::stub::{StubRef, resolve_host};
use crate::storage::client::{CommandStub, StorageStub};

/// Client access to the naming server's filesystem operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceStub {
    endpoint: StubRef,
}

impl ServiceStub {
    pub fn for_address(addr: SocketAddr) -> Self {
        Self {
            endpoint: StubRef::for_address(SERVICE_INTERFACE, addr),
        }
    }

    /// A stub for the naming server running on `hostname` at the
    /// well-known service port.
    pub async fn connect(hostname: &str) -> DfsResult<Self> {
        Ok(Self::for_address(
            resolve_host(hostname, SERVICE_PORT).await?,
        ))
    }

    pub async fn is_directory(&self, path: &Path) -> DfsResult<bool> {
        self.endpoint
            .call(METHOD_IS_DIRECTORY, IS_DIRECTORY_PARAMS, path)
            .await
    }

    pub async fn list(&self, path: &Path) -> DfsResult<Vec<String>> {
        self.endpoint.call(METHOD_LIST, LIST_PARAMS, path).await
    }

    pub async fn create_file(&self, path: &Path) -> DfsResult<bool> {
        self.endpoint
            .call(METHOD_CREATE_FILE, CREATE_FILE_PARAMS, path)
            .await
    }

    pub async fn create_directory(&self, path: &Path) -> DfsResult<bool> {
        self.endpoint
            .call(METHOD_CREATE_DIRECTORY, CREATE_DIRECTORY_PARAMS, path)
            .await
    }

    pub async fn delete(&self, path: &Path) -> DfsResult<bool> {
        self.endpoint.call(METHOD_DELETE, DELETE_PARAMS, path).await
    }

    pub async fn get_storage(&self, path: &Path) -> DfsResult<StorageStub> {
        self.endpoint
            .call(METHOD_GET_STORAGE, GET_STORAGE_PARAMS, path)
            .await
    }
}

impl fmt::Display for ServiceStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.endpoint.fmt(f)
    }
}

/// Storage-server access to the naming server's registration interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationStub {
    endpoint: StubRef,
}

impl RegistrationStub {
    pub fn for_address(addr: SocketAddr) -> Self {
        Self {
            endpoint: StubRef::for_address(REGISTRATION_INTERFACE, addr),
        }
    }

    /// A stub for the naming server running on `hostname` at the
    /// well-known registration port.
    pub async fn connect(hostname: &str) -> DfsResult<Self> {
        Ok(Self::for_address(
            resolve_host(hostname, REGISTRATION_PORT).await?,
        ))
    }

    /// Advertises a storage server's inventory; the reply lists the files
    /// the naming server already assigns elsewhere.
    pub async fn register(
        &self,
        storage: StorageStub,
        command: CommandStub,
        files: Vec<Path>,
    ) -> DfsResult<Vec<Path>> {
        let request = RegisterRequest {
            storage,
            command,
            files,
        };
        self.endpoint
            .call(METHOD_REGISTER, REGISTER_PARAMS, &request)
            .await
    }
}

impl fmt::Display for RegistrationStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.endpoint.fmt(f)
    }
}
