//! Dispatch Registry
//!
//! Maps (method name, parameter-type list) to executable handler closures.
//! Each skeleton serves exactly one [`RpcInterface`]; the interface is the
//! unit a stub is typed against, and its dispatch table is the static
//! replacement for runtime reflection: a method exists if and only if a
//! handler was registered for its signature.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::protocol::{ResponseStatus, WireRequest, WireResponse};
use crate::common::error::DfsError;

/// Failure modes of a method handler, mapped to distinct statuses.
#[derive(Debug)]
pub enum DispatchError {
    /// The target method returned an error; sent as `BadRequest` with the
    /// error as the payload so the client re-raises it.
    Fault(DfsError),
    /// Argument decoding or reply encoding failed; sent as
    /// `InternalServerError`.
    Decode(String),
}

impl From<DfsError> for DispatchError {
    fn from(err: DfsError) -> Self {
        Self::Fault(err)
    }
}

/// Decodes a handler's argument value from the raw request bytes.
pub fn decode_args<T: DeserializeOwned>(args: &[u8]) -> Result<T, DispatchError> {
    bincode::deserialize(args).map_err(|err| DispatchError::Decode(err.to_string()))
}

/// Encodes a handler's return value.
pub fn encode_reply<T: Serialize>(value: &T) -> Result<Vec<u8>, DispatchError> {
    bincode::serialize(value).map_err(|err| DispatchError::Decode(err.to_string()))
}

type MethodHandler = Arc<
    dyn Fn(Vec<u8>) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, DispatchError>> + Send>>
        + Send
        + Sync,
>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey {
    method: String,
    param_types: Vec<String>,
}

/// A named remote interface: the dispatch table a skeleton serves and a
/// stub is addressed to.
pub struct RpcInterface {
    name: &'static str,
    methods: HashMap<MethodKey, MethodHandler>,
}

impl RpcInterface {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a handler under a method signature.
    ///
    /// The handler receives the raw argument bytes and produces either the
    /// encoded return value or a [`DispatchError`]; the framework fault type
    /// in the signature is what makes a method remotely callable.
    pub fn register<F, Fut>(
        &mut self,
        method: &'static str,
        param_types: &'static [&'static str],
        handler: F,
    ) where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>, DispatchError>> + Send + 'static,
    {
        let handler: MethodHandler = Arc::new(move |args| {
            Box::pin(handler(args))
                as Pin<Box<dyn Future<Output = Result<Vec<u8>, DispatchError>> + Send>>
        });
        let key = MethodKey {
            method: method.to_string(),
            param_types: param_types.iter().map(|t| t.to_string()).collect(),
        };
        self.methods.insert(key, handler);
    }

    /// Resolves and invokes the handler for one request, producing exactly
    /// one status and one payload in every case.
    pub async fn dispatch(&self, request: &WireRequest) -> WireResponse {
        let key = MethodKey {
            method: request.method.clone(),
            param_types: request.param_types.clone(),
        };
        let Some(handler) = self.methods.get(&key) else {
            return WireResponse::fault(
                ResponseStatus::NotFound,
                &DfsError::NoSuchMethod(format!(
                    "{}.{}({})",
                    self.name,
                    request.method,
                    request.param_types.join(", ")
                )),
            );
        };
        match handler(request.args.clone()).await {
            Ok(payload) => WireResponse::ok(payload),
            Err(DispatchError::Fault(err)) => {
                WireResponse::fault(ResponseStatus::BadRequest, &err)
            }
            Err(DispatchError::Decode(message)) => WireResponse::fault(
                ResponseStatus::InternalServerError,
                &DfsError::Internal(message),
            ),
        }
    }
}
