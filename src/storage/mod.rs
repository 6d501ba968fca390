//! Storage Server Module
//!
//! Storage servers respond to client file access requests. The files
//! accessible through a storage server are those under a given root
//! directory of the local filesystem; logical path `/a/b/c` maps directly
//! onto `<root>/a/b/c`.
//!
//! ## Core Concepts
//! - **Two interfaces**: `storage` (size/read/write) serves clients;
//!   `command` (create/delete) serves the naming server. Each runs on its
//!   own skeleton with a system-assigned port.
//! - **Registration**: on start the server advertises its file inventory to
//!   the naming server and deletes any files the naming server reports as
//!   duplicates, pruning directories that become empty.
//! - **Serialization**: all five operations share one mutex; there is no
//!   finer-grained locking of file bytes.

pub mod client;
pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;
