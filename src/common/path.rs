use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{DfsError, DfsResult};

/// Component delimiter in the string form of a path.
pub const SEPARATOR: char = '/';
/// Reserved for application use; never valid inside a component.
pub const RESERVED: char = ':';

/// Distributed filesystem path.
///
/// A path is an immutable ordered sequence of non-empty components; the root
/// is the empty sequence. The string form is `/` for the root and otherwise
/// the components joined by forward slashes with a leading slash. Neither
/// the slash nor the colon may appear inside a component.
///
/// Two paths are equal when they share all the same components, and the
/// string form round-trips through [`Path::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    components: Vec<String>,
}

impl Path {
    /// The root directory path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Appends one component, yielding the child path.
    ///
    /// Fails with `InvalidArgument` if the component is empty or contains a
    /// slash or a colon.
    pub fn child(&self, component: &str) -> DfsResult<Path> {
        if component.is_empty()
            || component.contains(SEPARATOR)
            || component.contains(RESERVED)
        {
            return Err(DfsError::InvalidArgument(format!(
                "invalid path component {component:?}"
            )));
        }
        let mut components = self.components.clone();
        components.push(component.to_string());
        Ok(Path { components })
    }

    /// Parses the string form of a path.
    ///
    /// The string must begin with a forward slash and must not contain a
    /// colon. Empty components produced by doubled or trailing slashes are
    /// dropped.
    pub fn parse(s: &str) -> DfsResult<Path> {
        if !s.starts_with(SEPARATOR) {
            return Err(DfsError::InvalidArgument(format!(
                "path {s:?} does not begin with {SEPARATOR:?}"
            )));
        }
        if s.contains(RESERVED) {
            return Err(DfsError::InvalidArgument(format!(
                "path {s:?} contains the reserved character {RESERVED:?}"
            )));
        }
        Ok(Path {
            components: s
                .split(SEPARATOR)
                .filter(|component| !component.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// The components of the path, in order; empty for the root.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        Some(Path {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// The last component, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// True when `other`'s components are a prefix of this path's components.
    /// Every path is a subpath of itself.
    pub fn is_subpath(&self, other: &Path) -> bool {
        self.components.starts_with(&other.components)
    }

    /// The path formed by the first `len` components.
    pub fn prefix(&self, len: usize) -> Path {
        Path {
            components: self.components[..len.min(self.components.len())].to_vec(),
        }
    }

    /// Lists all regular files in a directory tree on the local filesystem,
    /// as paths relative to `dir`.
    ///
    /// Fails with `NotFound` if `dir` does not exist and `InvalidArgument`
    /// if it exists but is not a directory.
    pub fn list(dir: &std::path::Path) -> DfsResult<Vec<Path>> {
        let meta = std::fs::metadata(dir).map_err(|_| {
            DfsError::NotFound(format!("directory {} does not exist", dir.display()))
        })?;
        if !meta.is_dir() {
            return Err(DfsError::InvalidArgument(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        let mut files = Vec::new();
        collect_files(dir, &Path::root(), &mut files)?;
        Ok(files)
    }

    /// Resolves this path against a host-filesystem root.
    ///
    /// The resolution is jailed: `.` and `..` components are rejected so the
    /// result can never escape `root`.
    pub fn to_local(&self, root: &std::path::Path) -> DfsResult<PathBuf> {
        let mut resolved = root.to_path_buf();
        for component in &self.components {
            if component == "." || component == ".." {
                return Err(DfsError::InvalidArgument(format!(
                    "path {self} escapes the storage root"
                )));
            }
            resolved.push(component);
        }
        Ok(resolved)
    }
}

fn collect_files(
    dir: &std::path::Path,
    prefix: &Path,
    out: &mut Vec<Path>,
) -> DfsResult<()> {
    for entry in std::fs::read_dir(dir).map_err(DfsError::io)? {
        let entry = entry.map_err(DfsError::io)?;
        let name = entry.file_name().into_string().map_err(|name| {
            DfsError::InvalidArgument(format!("file name {name:?} is not valid UTF-8"))
        })?;
        let child = prefix.child(&name)?;
        let file_type = entry.file_type().map_err(DfsError::io)?;
        if file_type.is_dir() {
            collect_files(&entry.path(), &child, out)?;
        } else if file_type.is_file() {
            out.push(child);
        }
    }
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = DfsError;

    fn from_str(s: &str) -> DfsResult<Path> {
        Path::parse(s)
    }
}
