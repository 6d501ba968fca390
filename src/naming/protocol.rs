//! Naming Wire Protocol
//!
//! Well-known ports, interface and method names, parameter-type
//! descriptors, and the request DTOs for the naming server's two remote
//! interfaces.
//!
//! Stubs for the naming server are typically created from a bare network
//! address, so both interfaces live at fixed ports every participant
//! knows.

use serde::{Deserialize, Serialize};

use crate::common::path::Path;
use crate::storage::client::{CommandStub, StorageStub};

/// Port of the `service` interface (client operations).
pub const SERVICE_PORT: u16 = 6000;
/// Port of the `registration` interface (storage servers).
pub const REGISTRATION_PORT: u16 = 6001;

pub const SERVICE_INTERFACE: &str = "naming.service";
pub const REGISTRATION_INTERFACE: &str = "naming.registration";

pub const METHOD_IS_DIRECTORY: &str = "is_directory";
pub const IS_DIRECTORY_PARAMS: &[&str] = &["path"];

pub const METHOD_LIST: &str = "list";
pub const LIST_PARAMS: &[&str] = &["path"];

pub const METHOD_CREATE_FILE: &str = "create_file";
pub const CREATE_FILE_PARAMS: &[&str] = &["path"];

pub const METHOD_CREATE_DIRECTORY: &str = "create_directory";
pub const CREATE_DIRECTORY_PARAMS: &[&str] = &["path"];

pub const METHOD_DELETE: &str = "delete";
pub const DELETE_PARAMS: &[&str] = &["path"];

pub const METHOD_GET_STORAGE: &str = "get_storage";
pub const GET_STORAGE_PARAMS: &[&str] = &["path"];

pub const METHOD_REGISTER: &str = "register";
pub const REGISTER_PARAMS: &[&str] = &["storage_stub", "command_stub", "path_list"];

/// A storage server's registration offer: its two stubs and the inventory
/// of files found under its root. The reply is the list of offered paths
/// the naming server already assigns to another server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub storage: StorageStub,
    pub command: CommandStub,
    pub files: Vec<Path>,
}
