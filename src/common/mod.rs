//! Shared Building Blocks
//!
//! Types used by every other module:
//!
//! - **`path`**: the immutable, forward-slash-delimited `Path` value that all
//!   filesystem interfaces exchange, plus host-filesystem helpers (recursive
//!   listing, root-jailed resolution).
//! - **`error`**: the `DfsError` taxonomy. The same enum is returned by local
//!   calls and carried inside the RPC response envelope, so a remote failure
//!   is re-raised on the client exactly as it was thrown on the server.

pub mod error;
pub mod path;

#[cfg(test)]
mod tests;
