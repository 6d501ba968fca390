//! Stub
//!
//! The client side of the substrate. A [`StubRef`] is a serializable handle
//! carrying an interface name and a socket address; each remote call opens
//! a fresh connection, performs one request/response exchange, and closes.
//!
//! Comparison, hashing and display of stubs are purely local: two stubs are
//! equal when they name the same interface and the same address, and would
//! therefore reach the same skeleton.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

use super::protocol::{ResponseStatus, WireRequest, WireResponse, read_frame, write_frame};
use super::skeleton::Skeleton;
use crate::common::error::{DfsError, DfsResult};

/// A remote endpoint reference: interface identity plus network address.
///
/// The address is fixed at creation and never modified. Stubs are
/// serializable so they can be transmitted through other remote calls
/// (registration sends storage stubs to the naming server, which later
/// hands them to clients).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StubRef {
    interface: String,
    addr: SocketAddr,
}

impl StubRef {
    /// A stub for a remote server at a known address. Used when
    /// bootstrapping: the server is already running somewhere and there is
    /// no skeleton object to take the address from.
    pub fn for_address(interface: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            interface: interface.into(),
            addr,
        }
    }

    /// A stub addressed at a local skeleton.
    ///
    /// The skeleton must have been created with a fixed address or already
    /// started; a wildcard bound address is reported as loopback, since
    /// such a stub is only meaningful on the local host.
    pub fn for_skeleton(skeleton: &Skeleton) -> DfsResult<Self> {
        let mut addr = skeleton.address().ok_or_else(|| {
            DfsError::InvalidArgument(
                "skeleton has no address; start it or give it a fixed address".to_string(),
            )
        })?;
        if addr.ip().is_unspecified() {
            addr.set_ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        Ok(Self {
            interface: skeleton.interface_name().to_string(),
            addr,
        })
    }

    /// A stub carrying the skeleton's port but an externally-routable
    /// hostname, for skeletons bound behind private or wildcard addresses.
    pub async fn for_skeleton_with_hostname(
        skeleton: &Skeleton,
        hostname: &str,
    ) -> DfsResult<Self> {
        let port = skeleton
            .address()
            .ok_or_else(|| {
                DfsError::InvalidArgument(
                    "skeleton has no address; start it or give it a fixed address".to_string(),
                )
            })?
            .port();
        Ok(Self {
            interface: skeleton.interface_name().to_string(),
            addr: resolve_host(hostname, port).await?,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Performs one remote invocation.
    ///
    /// Connects, sends the request, and reads the response envelope. An
    /// `Ok` status yields the decoded return value; any other status
    /// carries the server-side error, which is decoded and returned so the
    /// caller observes the original failure. Connection and protocol
    /// problems surface as `Remote`.
    pub async fn call<A, R>(
        &self,
        method: &str,
        param_types: &[&str],
        args: &A,
    ) -> DfsResult<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .map_err(DfsError::remote)?;
        let request = WireRequest {
            method: method.to_string(),
            param_types: param_types.iter().map(|t| t.to_string()).collect(),
            args: bincode::serialize(args).map_err(DfsError::remote)?,
        };
        write_frame(&mut stream, &request).await?;
        let response: WireResponse = read_frame(&mut stream).await?;
        match ResponseStatus::try_from(response.status)? {
            ResponseStatus::Ok => {
                bincode::deserialize(&response.payload).map_err(DfsError::remote)
            }
            _ => {
                let fault: DfsError =
                    bincode::deserialize(&response.payload).map_err(DfsError::remote)?;
                Err(fault)
            }
        }
    }
}

impl fmt::Display for StubRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.interface, self.addr)
    }
}

/// Resolves a hostname to a socket address on the given port. An
/// unresolvable hostname is an `InvalidArgument` failure.
///
/// IPv4 results are preferred because skeletons listen on IPv4 sockets.
pub async fn resolve_host(hostname: &str, port: u16) -> DfsResult<SocketAddr> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((hostname, port))
        .await
        .map_err(|err| DfsError::InvalidArgument(format!("unknown host {hostname}: {err}")))?
        .collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| DfsError::InvalidArgument(format!("unknown host {hostname}")))
}
