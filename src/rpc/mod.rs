//! Remote Call Substrate
//!
//! Implements the network-transparent call mechanism the naming and storage
//! servers run on. A *skeleton* encapsulates a TCP listener that accepts
//! connections and forwards decoded requests to a target object; a *stub* is
//! a lightweight, serializable handle that performs one request/response
//! exchange per method call against a skeleton's address.
//!
//! ## Session shape
//! Each connection carries exactly one request and one response, then
//! closes. Frames are length-prefixed bincode values; the response is a
//! status-coded envelope whose payload is either the return value or the
//! serialized error that the client re-raises.
//!
//! ## Submodules
//! - **`protocol`**: frame codec, request/response envelopes, status codes.
//! - **`registry`**: the dispatch table mapping (method, parameter types) to
//!   async handler closures.
//! - **`skeleton`**: listener lifecycle and the per-connection workers.
//! - **`stub`**: the client side: connect, send, decode, re-raise.

pub mod protocol;
pub mod registry;
pub mod skeleton;
pub mod stub;
