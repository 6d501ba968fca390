//! Naming Server Module
//!
//! Each instance of the filesystem is centered on a single naming server.
//! The naming server maintains the directory tree; it stores no file data.
//! Its primary purpose is to map each logical path to the storage server
//! hosting the file's contents.
//!
//! ## Core Concepts
//! - **Two interfaces at well-known ports**: `service` answers client
//!   operations (lookup, listing, create, delete); `registration` accepts
//!   storage servers advertising their local file inventories.
//! - **Duplicate reconciliation**: when a registering server offers a file
//!   the tree already assigns elsewhere, the path is returned to the server
//!   so it deletes its local copy; the existing assignment never changes.
//! - **Placement**: a newly created file lands on a storage server chosen
//!   uniformly at random from the registered set.

pub mod client;
pub mod protocol;
pub mod server;
pub mod tree;

#[cfg(test)]
mod tests;
