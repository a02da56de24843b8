//! Asset-facing collaborators: source loading and scene description records

pub mod gltf;
mod source;

pub use gltf::{GltfDocument, GltfError};
pub use source::{FsLoader, MemoryLoader, SourceLoader};
