//! Skeleton
//!
//! The server side of the substrate. A skeleton binds a TCP listener,
//! spawns one listener task, and serves each accepted connection on a
//! dedicated short-lived worker task that reads one request, dispatches it
//! against the interface registry, and writes one response.
//!
//! The lifecycle is strictly monotonic: CREATED, then RUNNING after a
//! successful `start`, then STOPPED after `stop` or a fatal listener
//! error. A stopped skeleton cannot be restarted.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};

use super::protocol::{ResponseStatus, WireRequest, WireResponse, read_frame, write_frame};
use super::registry::RpcInterface;
use crate::common::error::{DfsError, DfsResult};

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Observation points for skeleton lifecycle and worker failures.
///
/// `listen_error` decides whether the listener keeps accepting after a
/// top-level accept failure; returning `false` (the default) winds the
/// skeleton down with that failure as the stop cause. The hooks are for
/// reporting; shutdown is always driven by the runtime itself.
pub trait SkeletonHooks: Send + Sync {
    /// Called exactly once when the listener has fully wound down.
    /// `cause` is `None` for an orderly stop.
    fn stopped(&self, cause: Option<DfsError>) {
        let _ = cause;
    }

    /// Called on a top-level accept failure; `true` resumes accepting.
    fn listen_error(&self, error: &std::io::Error) -> bool {
        let _ = error;
        false
    }

    /// Called on a top-level worker failure.
    fn service_error(&self, error: &DfsError) {
        let _ = error;
    }
}

struct DefaultHooks;

impl SkeletonHooks for DefaultHooks {}

struct ListenerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// A multithreaded TCP server dispatching remote invocations of one
/// interface to its registered handlers.
pub struct Skeleton {
    iface: Arc<RpcInterface>,
    hooks: Arc<dyn SkeletonHooks>,
    requested_addr: Option<SocketAddr>,
    phase: Arc<AtomicU8>,
    bound_addr: OnceLock<SocketAddr>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl Skeleton {
    /// A skeleton with a system-assigned address, determined when `start`
    /// is called.
    pub fn new(iface: RpcInterface) -> Self {
        Self::build(iface, None)
    }

    /// A skeleton bound to a fixed address. Use this when the port number
    /// is significant (well-known services).
    pub fn with_address(iface: RpcInterface, addr: SocketAddr) -> Self {
        Self::build(iface, Some(addr))
    }

    fn build(iface: RpcInterface, requested_addr: Option<SocketAddr>) -> Self {
        Self {
            iface: Arc::new(iface),
            hooks: Arc::new(DefaultHooks),
            requested_addr,
            phase: Arc::new(AtomicU8::new(CREATED)),
            bound_addr: OnceLock::new(),
            listener: Mutex::new(None),
        }
    }

    /// Replaces the default lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn SkeletonHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn interface_name(&self) -> &'static str {
        self.iface.name()
    }

    /// The skeleton's address: the bound address once started, otherwise
    /// the fixed address it was created with, if any.
    pub fn address(&self) -> Option<SocketAddr> {
        self.bound_addr.get().copied().or(self.requested_addr)
    }

    /// Binds the listening socket, spawns the listener task, and returns
    /// the bound address immediately.
    ///
    /// Fails with `AlreadyStarted` on a skeleton that is running or was
    /// ever stopped; a bind failure also transitions the skeleton to
    /// stopped.
    pub async fn start(&self) -> DfsResult<SocketAddr> {
        if self
            .phase
            .compare_exchange(CREATED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DfsError::AlreadyStarted);
        }

        let bind_addr = self
            .requested_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));
        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                self.phase.store(STOPPED, Ordering::SeqCst);
                return Err(DfsError::Remote(format!(
                    "listening socket could not be created on {bind_addr}: {err}"
                )));
            }
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                self.phase.store(STOPPED, Ordering::SeqCst);
                return Err(DfsError::remote(err));
            }
        };
        let _ = self.bound_addr.set(addr);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(listener_loop(
            listener,
            self.iface.clone(),
            self.hooks.clone(),
            self.phase.clone(),
            shutdown_rx,
        ));
        *self.listener.lock().await = Some(ListenerHandle { shutdown, task });

        tracing::info!("skeleton for {} listening on {}", self.iface.name(), addr);
        Ok(addr)
    }

    /// Signals the listener to cease accepting and waits for it to wind
    /// down; in-flight workers run to completion first. Idempotent, and a
    /// no-op beyond the state transition on a never-started skeleton.
    pub async fn stop(&self) {
        self.phase.store(STOPPED, Ordering::SeqCst);
        let handle = self.listener.lock().await.take();
        if let Some(ListenerHandle { shutdown, task }) = handle {
            let _ = shutdown.send(true);
            let _ = task.await;
            tracing::info!("skeleton for {} stopped", self.iface.name());
        }
    }
}

async fn listener_loop(
    listener: TcpListener,
    iface: Arc<RpcInterface>,
    hooks: Arc<dyn SkeletonHooks>,
    phase: Arc<AtomicU8>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut workers = JoinSet::new();
    let mut cause: Option<DfsError> = None;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!("accepted connection from {}", peer);
                    workers.spawn(serve_connection(stream, iface.clone(), hooks.clone()));
                }
                Err(err) => {
                    tracing::warn!("accept failed on {}: {}", iface.name(), err);
                    if !hooks.listen_error(&err) {
                        cause = Some(DfsError::io(err));
                        break;
                    }
                }
            },
            Some(_) = workers.join_next(), if !workers.is_empty() => {}
        }
    }

    // Stop accepting before draining so a fatal listen error also leaves
    // the skeleton unrestartable.
    phase.store(STOPPED, Ordering::SeqCst);
    drop(listener);
    while workers.join_next().await.is_some() {}
    hooks.stopped(cause);
}

/// One request lifecycle: read, dispatch, respond, close.
///
/// Exactly one status and one payload are written on every path; a request
/// that does not decode gets an `InternalServerError` envelope before the
/// failure is reported to `service_error`.
async fn serve_connection(
    mut stream: TcpStream,
    iface: Arc<RpcInterface>,
    hooks: Arc<dyn SkeletonHooks>,
) {
    let response = match read_frame::<_, WireRequest>(&mut stream).await {
        Ok(request) => iface.dispatch(&request).await,
        Err(err) => {
            let response = WireResponse::fault(
                ResponseStatus::InternalServerError,
                &DfsError::Internal(format!("malformed request: {err}")),
            );
            hooks.service_error(&err);
            response
        }
    };
    if let Err(err) = write_frame(&mut stream, &response).await {
        hooks.service_error(&err);
    }
}
