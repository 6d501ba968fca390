//! Storage Server
//!
//! Hosts a subtree of the local filesystem and serves the `storage` and
//! `command` interfaces. Every logical path is resolved against the
//! server's root directory and can never escape it.

use std::io::ErrorKind;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::client::{CommandStub, StorageStub};
use super::protocol::{
    COMMAND_INTERFACE, CREATE_PARAMS, DELETE_PARAMS, METHOD_CREATE, METHOD_DELETE, METHOD_READ,
    METHOD_SIZE, METHOD_WRITE, READ_PARAMS, ReadRequest, SIZE_PARAMS, STORAGE_INTERFACE,
    WRITE_PARAMS, WriteRequest,
};
use crate::common::error::{DfsError, DfsResult};
use crate::common::path::Path;
use crate::naming::client::RegistrationStub;
use crate::rpc::registry::{RpcInterface, decode_args, encode_reply};
use crate::rpc::skeleton::Skeleton;

/// A storage server rooted at a directory of the local filesystem.
///
/// All five operations are serialized by one internal mutex; individual
/// byte ranges are not locked.
pub struct StorageServer {
    root: PathBuf,
    io_lock: Mutex<()>,
    skeletons: Mutex<Option<(Skeleton, Skeleton)>>,
    alive: AtomicBool,
}

impl StorageServer {
    /// Creates the server. The root is validated when `start` is called.
    pub fn new(root: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            root: root.into(),
            io_lock: Mutex::new(()),
            skeletons: Mutex::new(None),
            alive: AtomicBool::new(false),
        })
    }

    /// Starts both skeletons and registers with the naming server.
    ///
    /// `hostname` is the externally-routable name of this host; the stubs
    /// handed to the naming server carry it. Files the naming server
    /// reports as duplicates are deleted locally, pruning any directories
    /// that become empty. A failure at any step rolls the server back to
    /// stopped and is returned to the caller.
    pub async fn start(
        self: &Arc<Self>,
        hostname: &str,
        naming: &RegistrationStub,
    ) -> DfsResult<()> {
        if self.alive.swap(true, Ordering::SeqCst) {
            return Err(DfsError::AlreadyStarted);
        }
        let started = self.try_start(hostname, naming).await;
        if started.is_err() {
            self.shutdown_skeletons().await;
            self.alive.store(false, Ordering::SeqCst);
        }
        started
    }

    async fn try_start(
        self: &Arc<Self>,
        hostname: &str,
        naming: &RegistrationStub,
    ) -> DfsResult<()> {
        let meta = fs::metadata(&self.root).await.map_err(|_| {
            DfsError::NotFound(format!(
                "storage root {} does not exist",
                self.root.display()
            ))
        })?;
        if !meta.is_dir() {
            return Err(DfsError::NotFound(format!(
                "storage root {} is not a directory",
                self.root.display()
            )));
        }

        let storage_skeleton = Skeleton::new(storage_interface(self.clone()));
        let command_skeleton = Skeleton::new(command_interface(self.clone()));
        storage_skeleton.start().await?;
        command_skeleton.start().await?;
        let storage_stub =
            StorageStub::for_skeleton_with_hostname(&storage_skeleton, hostname).await?;
        let command_stub =
            CommandStub::for_skeleton_with_hostname(&command_skeleton, hostname).await?;
        *self.skeletons.lock().await = Some((storage_skeleton, command_skeleton));

        let files = Path::list(&self.root)?;
        tracing::info!(
            "registering {} with {} file(s) under {}",
            storage_stub,
            files.len(),
            self.root.display()
        );
        let duplicates = naming.register(storage_stub, command_stub, files).await?;
        if !duplicates.is_empty() {
            tracing::info!("pruning {} duplicate file(s)", duplicates.len());
        }
        for duplicate in &duplicates {
            self.delete(duplicate).await?;
        }
        Ok(())
    }

    /// Stops both skeletons. The server cannot be restarted.
    pub async fn stop(&self) {
        self.shutdown_skeletons().await;
        tracing::info!("storage server for {} stopped", self.root.display());
    }

    async fn shutdown_skeletons(&self) {
        let skeletons = self.skeletons.lock().await.take();
        if let Some((storage, command)) = skeletons {
            storage.stop().await;
            command.stop().await;
        }
    }

    fn not_found(&self, path: &Path) -> DfsError {
        DfsError::NotFound(format!("no such file {path}"))
    }

    /// Length in bytes of the file at `path`.
    pub async fn size(&self, path: &Path) -> DfsResult<u64> {
        let _io = self.io_lock.lock().await;
        let local = path.to_local(&self.root)?;
        let meta = fs::metadata(&local)
            .await
            .map_err(|_| self.not_found(path))?;
        if !meta.is_file() {
            return Err(self.not_found(path));
        }
        Ok(meta.len())
    }

    /// Reads exactly `length` bytes starting at `offset`.
    pub async fn read(&self, path: &Path, offset: i64, length: i64) -> DfsResult<Vec<u8>> {
        let _io = self.io_lock.lock().await;
        let local = path.to_local(&self.root)?;
        let meta = fs::metadata(&local)
            .await
            .map_err(|_| self.not_found(path))?;
        if !meta.is_file() {
            return Err(self.not_found(path));
        }
        if offset < 0 || length < 0 {
            return Err(DfsError::OutOfBounds(format!(
                "negative offset or length ({offset}, {length})"
            )));
        }
        if offset as u64 + length as u64 > meta.len() {
            return Err(DfsError::OutOfBounds(format!(
                "read of {length} byte(s) at offset {offset} past the end of {path} ({} byte(s))",
                meta.len()
            )));
        }
        let mut file = fs::File::open(&local).await.map_err(DfsError::io)?;
        file.seek(SeekFrom::Start(offset as u64))
            .await
            .map_err(DfsError::io)?;
        let mut data = vec![0u8; length as usize];
        file.read_exact(&mut data).await.map_err(DfsError::io)?;
        Ok(data)
    }

    /// Writes `data` starting at `offset`, extending the file if the write
    /// runs past its current end.
    pub async fn write(&self, path: &Path, offset: i64, data: &[u8]) -> DfsResult<()> {
        let _io = self.io_lock.lock().await;
        let local = path.to_local(&self.root)?;
        let meta = fs::metadata(&local)
            .await
            .map_err(|_| self.not_found(path))?;
        if !meta.is_file() {
            return Err(self.not_found(path));
        }
        if offset < 0 {
            return Err(DfsError::OutOfBounds(format!("negative offset {offset}")));
        }
        let mut file = OpenOptions::new()
            .write(true)
            .open(&local)
            .await
            .map_err(DfsError::io)?;
        file.seek(SeekFrom::Start(offset as u64))
            .await
            .map_err(DfsError::io)?;
        file.write_all(data).await.map_err(DfsError::io)?;
        file.flush().await.map_err(DfsError::io)?;
        Ok(())
    }

    /// Creates an empty file, building any missing parent directories.
    /// Returns whether the file was newly created; false on the root.
    pub async fn create(&self, path: &Path) -> DfsResult<bool> {
        if path.is_root() {
            return Ok(false);
        }
        let _io = self.io_lock.lock().await;
        let local = path.to_local(&self.root)?;
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).await.map_err(DfsError::io)?;
        }
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&local)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(DfsError::io(err)),
        }
    }

    /// Deletes the target (recursively for a directory), then prunes empty
    /// ancestor directories up to, but never including, the root. Returns
    /// false on the root and on a missing target.
    pub async fn delete(&self, path: &Path) -> DfsResult<bool> {
        if path.is_root() {
            return Ok(false);
        }
        let _io = self.io_lock.lock().await;
        let local = path.to_local(&self.root)?;
        let meta = match fs::metadata(&local).await {
            Ok(meta) => meta,
            Err(_) => return Ok(false),
        };
        if meta.is_dir() {
            fs::remove_dir_all(&local).await.map_err(DfsError::io)?;
        } else {
            fs::remove_file(&local).await.map_err(DfsError::io)?;
        }

        let mut current = path.parent();
        while let Some(dir) = current {
            if dir.is_root() {
                break;
            }
            // remove_dir refuses non-empty directories, which is exactly
            // the stopping condition for pruning.
            if fs::remove_dir(dir.to_local(&self.root)?).await.is_err() {
                break;
            }
            current = dir.parent();
        }
        Ok(true)
    }
}

pub(crate) fn storage_interface(server: Arc<StorageServer>) -> RpcInterface {
    let mut iface = RpcInterface::new(STORAGE_INTERFACE);
    {
        let server = server.clone();
        iface.register(METHOD_SIZE, SIZE_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let size = server.size(&path).await?;
                encode_reply(&size)
            }
        });
    }
    {
        let server = server.clone();
        iface.register(METHOD_READ, READ_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let request: ReadRequest = decode_args(&args)?;
                let data = server
                    .read(&request.path, request.offset, request.length)
                    .await?;
                encode_reply(&data)
            }
        });
    }
    {
        let server = server.clone();
        iface.register(METHOD_WRITE, WRITE_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let request: WriteRequest = decode_args(&args)?;
                server
                    .write(&request.path, request.offset, &request.data)
                    .await?;
                encode_reply(&())
            }
        });
    }
    iface
}

pub(crate) fn command_interface(server: Arc<StorageServer>) -> RpcInterface {
    let mut iface = RpcInterface::new(COMMAND_INTERFACE);
    {
        let server = server.clone();
        iface.register(METHOD_CREATE, CREATE_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let created = server.create(&path).await?;
                encode_reply(&created)
            }
        });
    }
    {
        let server = server.clone();
        iface.register(METHOD_DELETE, DELETE_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let deleted = server.delete(&path).await?;
                encode_reply(&deleted)
            }
        });
    }
    iface
}
