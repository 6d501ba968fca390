//! Directory Tree
//!
//! The naming server's in-memory view of the filesystem. A node either
//! carries the stub pair of the storage server owning a file (a leaf) or a
//! map of named children (a directory); the root is always a directory.

use std::collections::HashMap;

use crate::common::error::{DfsError, DfsResult};
use crate::common::path::Path;
use crate::storage::client::{CommandStub, StorageStub};

/// The stub pair of one storage server. Two pairs are equal when both
/// stubs match, meaning they reach the same server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerStubs {
    pub storage: StorageStub,
    pub command: CommandStub,
}

/// One node of the directory tree.
///
/// Invariants: a node with stubs has no children (it is a file leaf); a
/// node without stubs is a directory; the key under which a child is
/// stored equals the last component of the child's path.
#[derive(Debug)]
pub struct PathNode {
    path: Path,
    stubs: Option<ServerStubs>,
    children: HashMap<String, PathNode>,
}

impl PathNode {
    pub fn new_dir(path: Path) -> Self {
        Self {
            path,
            stubs: None,
            children: HashMap::new(),
        }
    }

    pub fn new_file(path: Path, stubs: ServerStubs) -> Self {
        Self {
            path,
            stubs: Some(stubs),
            children: HashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_file(&self) -> bool {
        self.stubs.is_some()
    }

    /// The owning server's stubs; `None` for a directory.
    pub fn stubs(&self) -> Option<&ServerStubs> {
        self.stubs.as_ref()
    }

    /// Names of the immediate children.
    pub fn child_names(&self) -> Vec<String> {
        self.children.keys().cloned().collect()
    }

    pub fn child(&self, name: &str) -> DfsResult<&PathNode> {
        self.children.get(name).ok_or_else(|| {
            DfsError::NotFound(format!("no entry named {name:?} under {}", self.path))
        })
    }

    pub fn child_mut(&mut self, name: &str) -> DfsResult<&mut PathNode> {
        let path = self.path.clone();
        self.children
            .get_mut(name)
            .ok_or_else(|| DfsError::NotFound(format!("no entry named {name:?} under {path}")))
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn has_file_child(&self, name: &str) -> bool {
        self.children.get(name).map(PathNode::is_file).unwrap_or(false)
    }

    pub fn has_directory_child(&self, name: &str) -> bool {
        self.children
            .get(name)
            .map(|child| !child.is_file())
            .unwrap_or(false)
    }

    pub fn add_child(&mut self, name: &str, node: PathNode) -> DfsResult<()> {
        if self.children.contains_key(name) {
            return Err(DfsError::InvalidArgument(format!(
                "entry {name:?} already exists under {}",
                self.path
            )));
        }
        self.children.insert(name.to_string(), node);
        Ok(())
    }

    /// Removes and returns a child subtree.
    pub fn delete_child(&mut self, name: &str) -> DfsResult<PathNode> {
        let path = self.path.clone();
        self.children
            .remove(name)
            .ok_or_else(|| DfsError::NotFound(format!("no entry named {name:?} under {path}")))
    }

    /// Walks the components of `path` down from this node.
    pub fn node_at(&self, path: &Path) -> DfsResult<&PathNode> {
        let mut current = self;
        for component in path.components() {
            current = current.child(component)?;
        }
        Ok(current)
    }

    pub fn node_at_mut(&mut self, path: &Path) -> DfsResult<&mut PathNode> {
        let mut current = self;
        for component in path.components() {
            current = current.child_mut(component)?;
        }
        Ok(current)
    }

    /// All file leaves below this node.
    pub fn descendants(&self) -> Vec<&PathNode> {
        let mut nodes = Vec::new();
        self.collect_descendants(&mut nodes);
        nodes
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a PathNode>) {
        for child in self.children.values() {
            if child.is_file() {
                out.push(child);
            } else {
                child.collect_descendants(out);
            }
        }
    }

    /// Inserts a file leaf for `file`, creating missing intermediate
    /// directory nodes along the way.
    ///
    /// Returns false when the candidate is a duplicate: either a node
    /// already occupies the terminal position, or a file node blocks a
    /// non-terminal position. The existing assignment is never modified.
    pub fn insert_file(&mut self, file: &Path, stubs: &ServerStubs) -> DfsResult<bool> {
        self.insert_at(file, 0, stubs)
    }

    fn insert_at(&mut self, file: &Path, depth: usize, stubs: &ServerStubs) -> DfsResult<bool> {
        let components = file.components();
        let name = &components[depth];
        if depth == components.len() - 1 {
            if self.children.contains_key(name) {
                return Ok(false);
            }
            self.add_child(name, PathNode::new_file(file.clone(), stubs.clone()))?;
            return Ok(true);
        }
        if !self.children.contains_key(name) {
            self.add_child(name, PathNode::new_dir(file.prefix(depth + 1)))?;
        }
        let child = self.child_mut(name)?;
        if child.is_file() {
            return Ok(false);
        }
        child.insert_at(file, depth + 1, stubs)
    }
}
