//! Naming Server
//!
//! Owns the directory tree and the registered-server list, and serves the
//! `service` and `registration` interfaces through two skeletons. The tree
//! is guarded by one read-write lock so every mutation appears atomic to
//! concurrent readers; the registered list has its own lock, and
//! containment-check-then-add is a single critical section.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use super::protocol::{
    CREATE_DIRECTORY_PARAMS, CREATE_FILE_PARAMS, DELETE_PARAMS, GET_STORAGE_PARAMS,
    IS_DIRECTORY_PARAMS, LIST_PARAMS, METHOD_CREATE_DIRECTORY, METHOD_CREATE_FILE, METHOD_DELETE,
    METHOD_GET_STORAGE, METHOD_IS_DIRECTORY, METHOD_LIST, METHOD_REGISTER, REGISTER_PARAMS,
    REGISTRATION_INTERFACE, REGISTRATION_PORT, RegisterRequest, SERVICE_INTERFACE, SERVICE_PORT,
};
use super::tree::{PathNode, ServerStubs};
use crate::common::error::{DfsError, DfsResult};
use crate::common::path::Path;
use crate::rpc::registry::{RpcInterface, decode_args, encode_reply};
use crate::rpc::skeleton::Skeleton;
use crate::storage::client::{CommandStub, StorageStub};

/// The central directory service of one filesystem instance.
pub struct NamingServer {
    tree: RwLock<PathNode>,
    registered: Mutex<Vec<ServerStubs>>,
    skeletons: Mutex<Option<(Skeleton, Skeleton)>>,
    alive: AtomicBool,
    service_port: u16,
    registration_port: u16,
}

impl NamingServer {
    /// A naming server at the well-known ports. Not started.
    pub fn new() -> Arc<Self> {
        Self::with_ports(SERVICE_PORT, REGISTRATION_PORT)
    }

    /// A naming server at explicit ports (zero for system-assigned).
    pub fn with_ports(service_port: u16, registration_port: u16) -> Arc<Self> {
        Arc::new(Self {
            tree: RwLock::new(PathNode::new_dir(Path::root())),
            registered: Mutex::new(Vec::new()),
            skeletons: Mutex::new(None),
            alive: AtomicBool::new(false),
            service_port,
            registration_port,
        })
    }

    /// Starts both skeletons; afterwards the service and registration
    /// interfaces are remotely accessible. The server cannot be started
    /// twice or restarted.
    pub async fn start(self: &Arc<Self>) -> DfsResult<()> {
        if self.alive.swap(true, Ordering::SeqCst) {
            return Err(DfsError::AlreadyStarted);
        }
        let service = Skeleton::with_address(
            service_interface(self.clone()),
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.service_port)),
        );
        let registration = Skeleton::with_address(
            registration_interface(self.clone()),
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.registration_port)),
        );
        if let Err(err) = service.start().await {
            self.alive.store(false, Ordering::SeqCst);
            return Err(err);
        }
        if let Err(err) = registration.start().await {
            service.stop().await;
            self.alive.store(false, Ordering::SeqCst);
            return Err(err);
        }
        tracing::info!(
            "naming server up: service on {:?}, registration on {:?}",
            service.address(),
            registration.address()
        );
        *self.skeletons.lock().await = Some((service, registration));
        Ok(())
    }

    /// Stops both skeletons; in-flight requests complete first.
    pub async fn stop(&self) {
        let skeletons = self.skeletons.lock().await.take();
        if let Some((service, registration)) = skeletons {
            service.stop().await;
            registration.stop().await;
            tracing::info!("naming server stopped");
        }
    }

    /// Bound address of the service interface, once started.
    pub async fn service_addr(&self) -> Option<SocketAddr> {
        self.skeletons
            .lock()
            .await
            .as_ref()
            .and_then(|(service, _)| service.address())
    }

    /// Bound address of the registration interface, once started.
    pub async fn registration_addr(&self) -> Option<SocketAddr> {
        self.skeletons
            .lock()
            .await
            .as_ref()
            .and_then(|(_, registration)| registration.address())
    }

    /// True for the root and for any existing non-file node; `NotFound`
    /// when the path is absent from the tree.
    pub async fn is_directory(&self, path: &Path) -> DfsResult<bool> {
        if path.is_root() {
            return Ok(true);
        }
        let tree = self.tree.read().await;
        Ok(!tree.node_at(path)?.is_file())
    }

    /// Names of the immediate children of a directory.
    pub async fn list(&self, path: &Path) -> DfsResult<Vec<String>> {
        let tree = self.tree.read().await;
        let node = tree.node_at(path)?;
        if node.is_file() {
            return Err(DfsError::NotFound(format!("{path} is not a directory")));
        }
        Ok(node.child_names())
    }

    /// Creates a file in the tree and commands a randomly chosen storage
    /// server to materialize it.
    ///
    /// False on the root and when the terminal name already exists; every
    /// non-terminal component must be an existing directory.
    pub async fn create_file(&self, path: &Path) -> DfsResult<bool> {
        let (Some(parent_path), Some(name)) = (path.parent(), path.last()) else {
            return Ok(false);
        };
        let mut tree = self.tree.write().await;
        let parent = tree.node_at_mut(&parent_path)?;
        if parent.is_file() {
            return Err(DfsError::NotFound(format!(
                "{parent_path} is not a directory"
            )));
        }
        if parent.has_child(name) {
            return Ok(false);
        }
        let stubs = self.pick_storage().await?;
        parent.add_child(name, PathNode::new_file(path.clone(), stubs.clone()))?;
        drop(tree);

        stubs.command.create(path).await?;
        tracing::info!("created file {} on {}", path, stubs.storage);
        Ok(true)
    }

    /// Creates a directory node. Same walk rules as `create_file`; no
    /// storage server is involved.
    pub async fn create_directory(&self, path: &Path) -> DfsResult<bool> {
        let (Some(parent_path), Some(name)) = (path.parent(), path.last()) else {
            return Ok(false);
        };
        let mut tree = self.tree.write().await;
        let parent = tree.node_at_mut(&parent_path)?;
        if parent.is_file() {
            return Err(DfsError::NotFound(format!(
                "{parent_path} is not a directory"
            )));
        }
        if parent.has_child(name) {
            return Ok(false);
        }
        parent.add_child(name, PathNode::new_dir(path.clone()))?;
        Ok(true)
    }

    /// Removes the subtree at `path` and issues a `delete` command for
    /// every file in it to its owning storage server. False on the root
    /// and on a missing target.
    pub async fn delete(&self, path: &Path) -> DfsResult<bool> {
        let (Some(parent_path), Some(name)) = (path.parent(), path.last()) else {
            return Ok(false);
        };
        let removed = {
            let mut tree = self.tree.write().await;
            let parent = match tree.node_at_mut(&parent_path) {
                Ok(node) => node,
                Err(_) => return Ok(false),
            };
            match parent.delete_child(name) {
                Ok(node) => node,
                Err(_) => return Ok(false),
            }
        };

        let mut targets = Vec::new();
        if let Some(stubs) = removed.stubs() {
            targets.push((removed.path().clone(), stubs.clone()));
        } else {
            for node in removed.descendants() {
                if let Some(stubs) = node.stubs() {
                    targets.push((node.path().clone(), stubs.clone()));
                }
            }
        }
        for (file, stubs) in targets {
            if let Err(err) = stubs.command.delete(&file).await {
                tracing::warn!("delete command for {} failed on {}: {}", file, stubs.command, err);
            }
        }
        Ok(true)
    }

    /// The storage stub of the file at `path`.
    pub async fn get_storage(&self, path: &Path) -> DfsResult<StorageStub> {
        let tree = self.tree.read().await;
        let node = tree.node_at(path)?;
        match node.stubs() {
            Some(stubs) => Ok(stubs.storage.clone()),
            None => Err(DfsError::NotFound(format!(
                "{path} is not a registered file"
            ))),
        }
    }

    /// Registers a storage server and reconciles its offered inventory
    /// against the tree.
    ///
    /// Returns the offered paths that were already assigned elsewhere; the
    /// caller must delete those files locally. Registering the exact same
    /// stub pair twice fails with `AlreadyRegistered`.
    pub async fn register(
        &self,
        storage: StorageStub,
        command: CommandStub,
        files: Vec<Path>,
    ) -> DfsResult<Vec<Path>> {
        let stubs = ServerStubs { storage, command };
        {
            let mut registered = self.registered.lock().await;
            if registered.contains(&stubs) {
                return Err(DfsError::AlreadyRegistered);
            }
            registered.push(stubs.clone());
        }
        tracing::info!(
            "registered storage server {} offering {} file(s)",
            stubs.storage,
            files.len()
        );

        let mut duplicates = Vec::new();
        let mut tree = self.tree.write().await;
        for file in files {
            // The root cannot be a file.
            if file.is_root() {
                continue;
            }
            if !tree.insert_file(&file, &stubs)? {
                duplicates.push(file);
            }
        }
        Ok(duplicates)
    }

    async fn pick_storage(&self) -> DfsResult<ServerStubs> {
        let registered = self.registered.lock().await;
        if registered.is_empty() {
            return Err(DfsError::NotFound(
                "no storage servers registered".to_string(),
            ));
        }
        let index = rand::thread_rng().gen_range(0..registered.len());
        Ok(registered[index].clone())
    }
}

pub(crate) fn service_interface(server: Arc<NamingServer>) -> RpcInterface {
    let mut iface = RpcInterface::new(SERVICE_INTERFACE);
    {
        let server = server.clone();
        iface.register(METHOD_IS_DIRECTORY, IS_DIRECTORY_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let is_dir = server.is_directory(&path).await?;
                encode_reply(&is_dir)
            }
        });
    }
    {
        let server = server.clone();
        iface.register(METHOD_LIST, LIST_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let names = server.list(&path).await?;
                encode_reply(&names)
            }
        });
    }
    {
        let server = server.clone();
        iface.register(METHOD_CREATE_FILE, CREATE_FILE_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let created = server.create_file(&path).await?;
                encode_reply(&created)
            }
        });
    }
    {
        let server = server.clone();
        iface.register(
            METHOD_CREATE_DIRECTORY,
            CREATE_DIRECTORY_PARAMS,
            move |args| {
                let server = server.clone();
                async move {
                    let path: Path = decode_args(&args)?;
                    let created = server.create_directory(&path).await?;
                    encode_reply(&created)
                }
            },
        );
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
    {
        let server = server.clone();
        iface.register(METHOD_GET_STORAGE, GET_STORAGE_PARAMS, move |args| {
            let server = server.clone();
            async move {
                let path: Path = decode_args(&args)?;
                let stub = server.get_storage(&path).await?;
                encode_reply(&stub)
            }
        });
    }
    iface
}

pub(crate) fn registration_interface(server: Arc<NamingServer>) -> RpcInterface {
    let mut iface = RpcInterface::new(REGISTRATION_INTERFACE);
    iface.register(METHOD_REGISTER, REGISTER_PARAMS, move |args| {
        let server = server.clone();
        async move {
            let request: RegisterRequest = decode_args(&args)?;
            let duplicates = server
                .register(request.storage, request.command, request.files)
                .await?;
            encode_reply(&duplicates)
        }
    });
    iface
}
