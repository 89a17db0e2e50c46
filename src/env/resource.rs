//! Resources backing property layers.

use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::ResourceError;

/// Prefix selecting the filesystem explicitly.
const FILE_PREFIX: &str = "file:";

/// The loaded content of a location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    location: String,
    description: String,
    bytes: Vec<u8>,
}

impl Resource {
    pub fn new(location: impl Into<String>, description: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            location: location.into(),
            description: description.into(),
            bytes,
        }
    }

    /// The location as requested.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Human-readable description, used as the default layer name.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Loads resources by location string.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, location: &str) -> Result<Resource, ResourceError>;
}

// ============================================================================
// FILESYSTEM
// ============================================================================

/// Loads resources from the filesystem, relative paths against a base directory.
#[derive(Clone, Debug)]
pub struct FileSystemResourceLoader {
    base: PathBuf,
}

impl FileSystemResourceLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, location: &str) -> PathBuf {
        let raw = Path::new(location.strip_prefix(FILE_PREFIX).unwrap_or(location));
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.base.join(raw)
        }
    }
}

impl Default for FileSystemResourceLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn load(&self, location: &str) -> Result<Resource, ResourceError> {
        let path = self.path_for(location);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Resource::new(location, format!("file [{}]", path.display()), bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ResourceError::NotFound {
                location: location.to_string(),
            }),
            Err(source) => Err(ResourceError::Io {
                location: location.to_string(),
                source,
            }),
        }
    }
}

// ============================================================================
// IN MEMORY
// ============================================================================

/// Serves resources registered in memory.
#[derive(Debug, Default)]
pub struct InMemoryResourceLoader {
    resources: RwLock<IndexMap<String, Vec<u8>>>,
}

impl InMemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content for a location, replacing any previous content.
    pub fn insert(&self, location: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.resources.write().insert(location.into(), content.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, location: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(location, content);
        self
    }
}

impl ResourceLoader for InMemoryResourceLoader {
    fn load(&self, location: &str) -> Result<Resource, ResourceError> {
        self.resources
            .read()
            .get(location)
            .map(|bytes| Resource::new(location, format!("resource [{location}]"), bytes.clone()))
            .ok_or_else(|| ResourceError::NotFound {
                location: location.to_string(),
            })
    }
}
