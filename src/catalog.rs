//! Image catalog: the ordered set of image references known to a session.
//!
//! References are origin-agnostic. A local file becomes `file:<path>`, a remote
//! image `web:<url>`, and adapters may mint any other scheme they understand.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Scheme prefix for local files.
pub const FILE_SCHEME: &str = "file:";

/// Scheme prefix for remote images.
pub const WEB_SCHEME: &str = "web:";

/// Remote demo images offered when no files have been selected.
pub const DEMO_IMAGE_URLS: &[&str] = &[
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1460.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1461.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1462.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1463.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1464.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1465.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1466.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1467.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1468.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1469.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1470.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1471.png",
    "https://cs3d-jpg-example.s3.us-east-2.amazonaws.com/a_vm1472.png",
];

/// Opaque identifier of a loadable image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a local file.
    pub fn from_path(path: &Path) -> Self {
        Self(format!("{}{}", FILE_SCHEME, path.display()))
    }

    /// Identifier for a remote image.
    pub fn web(url: &str) -> Self {
        Self(format!("{}{}", WEB_SCHEME, url))
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local file path, if this identifier refers to one.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.0.strip_prefix(FILE_SCHEME).map(PathBuf::from)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ImageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An image identifier paired with its display name. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    id: ImageId,
    name: String,
}

impl ImageReference {
    /// Create a reference from an id and display name.
    pub fn new(id: impl Into<ImageId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Reference to a local file, named after the file name.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: ImageId::from_path(path),
            name,
        }
    }

    /// Reference to a remote image, named after the last URL segment.
    pub fn from_url(url: &str) -> Self {
        let name = url.rsplit('/').next().unwrap_or(url).to_string();
        Self {
            id: ImageId::web(url),
            name,
        }
    }

    /// The image identifier.
    pub fn id(&self) -> &ImageId {
        &self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// References for the built-in demo list.
pub fn demo_references() -> Vec<ImageReference> {
    DEMO_IMAGE_URLS
        .iter()
        .map(|url| ImageReference::from_url(url))
        .collect()
}

/// Ordered collection of image references, independent of any viewport.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    images: Vec<ImageReference>,
}

impl ImageCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reference. Returns false if its id is already cataloged.
    pub fn add(&mut self, reference: ImageReference) -> bool {
        if self.contains(reference.id()) {
            log::debug!("Catalog already holds {}", reference.id());
            return false;
        }
        self.images.push(reference);
        true
    }

    /// Append several references, returning the ids that were newly added.
    pub fn extend(&mut self, references: impl IntoIterator<Item = ImageReference>) -> Vec<ImageId> {
        let mut added = Vec::new();
        for reference in references {
            let id = reference.id().clone();
            if self.add(reference) {
                added.push(id);
            }
        }
        added
    }

    /// Look up a reference by id.
    pub fn get(&self, id: &ImageId) -> Option<&ImageReference> {
        self.images.iter().find(|r| r.id() == id)
    }

    /// Whether the id is cataloged.
    pub fn contains(&self, id: &ImageId) -> bool {
        self.get(id).is_some()
    }

    /// Display name for an id.
    pub fn display_name(&self, id: &ImageId) -> Option<&str> {
        self.get(id).map(ImageReference::name)
    }

    /// All ids in catalog order.
    pub fn ids(&self) -> Vec<ImageId> {
        self.images.iter().map(|r| r.id().clone()).collect()
    }

    /// Iterate over references in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageReference> {
        self.images.iter()
    }

    /// Number of cataloged images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
