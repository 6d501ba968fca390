//! Distributed Filesystem Library
//!
//! This library crate defines the core modules that make up the distributed
//! filesystem. It serves as the foundation for the node binary (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`common`**: Shared building blocks: the immutable `Path` value used by
//!   every filesystem interface, and the error taxonomy that travels across
//!   the wire.
//! - **`rpc`**: The remote-call substrate. A skeleton hosts a TCP listener
//!   and dispatches one framed request per connection against a registry of
//!   method handlers; a stub is a serializable handle that opens a
//!   short-lived connection per call and re-raises remote errors locally.
//! - **`naming`**: The coordination layer. A single naming server owns the
//!   in-memory directory tree, answers client service calls, and reconciles
//!   the file inventories that storage servers advertise at registration.
//! - **`storage`**: The data layer. Storage servers host a subtree of the
//!   local filesystem and serve byte-range reads and writes plus
//!   create/delete commands issued by the naming server.

pub mod common;
pub mod naming;
pub mod rpc;
pub mod storage;
