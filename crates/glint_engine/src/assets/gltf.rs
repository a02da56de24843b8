//! GLTF scene description records
//!
//! Typed, already-parsed views of a GLTF JSON document: scene graph nodes,
//! meshes with their primitives and attribute indices, accessors, buffer
//! views, buffers, and materials. The engine consumes these as structured
//! records; everything binary (buffer payloads, image data) stays with the
//! asset pipeline.

use serde::Deserialize;
use thiserror::Error;

/// Errors from loading a GLTF document.
#[derive(Debug, Error)]
pub enum GltfError {
    /// The document is not valid JSON or does not match the GLTF shape.
    #[error("failed to parse GLTF JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Generator/version metadata of a GLTF file.
#[derive(Debug, Clone, Deserialize)]
pub struct GltfAssetInfo {
    /// GLTF specification version the file targets
    pub version: String,
    /// Tool that produced the file
    #[serde(default)]
    pub generator: Option<String>,
}

/// One scene: the indices of its root nodes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfScene {
    /// Indices into [`GltfDocument::nodes`]
    #[serde(default)]
    pub nodes: Vec<usize>,
}

/// One scene-graph node.
#[derive(Debug, Clone, Deserialize)]
pub struct GltfNode {
    /// Optional node name
    #[serde(default)]
    pub name: Option<String>,
    /// Indices of child nodes
    #[serde(default)]
    pub children: Vec<usize>,
    /// Column-major local transform, when given as a matrix
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    /// Index of the mesh this node instances, if any
    #[serde(default)]
    pub mesh: Option<usize>,
}

/// Vertex attribute accessors of a primitive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfAttributes {
    /// Accessor index for positions
    #[serde(rename = "POSITION")]
    pub position: Option<usize>,
    /// Accessor index for normals
    #[serde(rename = "NORMAL")]
    pub normal: Option<usize>,
}

/// Render mode of a primitive (GL primitive topology numbering:
/// 0 points, 1 lines, 2 line loop, 3 line strip, 4 triangles,
/// 5 triangle strip, 6 triangle fan).
pub const DEFAULT_PRIMITIVE_MODE: u32 = 4;

fn default_mode() -> u32 {
    DEFAULT_PRIMITIVE_MODE
}

/// One drawable primitive of a mesh.
#[derive(Debug, Clone, Deserialize)]
pub struct GltfPrimitive {
    /// Vertex attribute accessors
    #[serde(default)]
    pub attributes: GltfAttributes,
    /// Accessor index for the index buffer, if indexed
    #[serde(default)]
    pub indices: Option<usize>,
    /// Index into [`GltfDocument::materials`]
    #[serde(default)]
    pub material: Option<usize>,
    /// Primitive topology; triangles when omitted
    #[serde(default = "default_mode")]
    pub mode: u32,
}

/// A named collection of primitives.
#[derive(Debug, Clone, Deserialize)]
pub struct GltfMesh {
    /// Optional mesh name
    #[serde(default)]
    pub name: Option<String>,
    /// Drawable primitives
    #[serde(default)]
    pub primitives: Vec<GltfPrimitive>,
}

/// Typed view into a buffer view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfAccessor {
    /// Index into [`GltfDocument::buffer_views`]
    #[serde(default)]
    pub buffer_view: Option<usize>,
    /// Byte offset into the buffer view
    #[serde(default)]
    pub byte_offset: u64,
    /// Component type (GL data type numbering)
    pub component_type: u32,
    /// Number of elements
    pub count: u64,
    /// Element type: "SCALAR", "VEC2", "VEC3", "VEC4", "MAT3", "MAT4"
    #[serde(rename = "type")]
    pub element_type: String,
    /// Per-component minima, when provided
    #[serde(default)]
    pub min: Vec<f32>,
    /// Per-component maxima, when provided
    #[serde(default)]
    pub max: Vec<f32>,
}

/// A material record. Only the name is consumed by the core; PBR
/// parameters belong to the render backend's material system.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GltfMaterial {
    /// Optional material name
    #[serde(default)]
    pub name: Option<String>,
}

/// A contiguous slice of a buffer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfBufferView {
    /// Index into [`GltfDocument::buffers`]
    pub buffer: usize,
    /// Byte offset into the buffer
    #[serde(default)]
    pub byte_offset: u64,
    /// Length of the view in bytes
    pub byte_length: u64,
    /// Intended GL binding target, if declared
    #[serde(default)]
    pub target: Option<u32>,
}

/// A binary payload reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfBuffer {
    /// Payload length in bytes
    pub byte_length: u64,
    /// URI of the payload (file path or data URI)
    #[serde(default)]
    pub uri: Option<String>,
}

/// A whole parsed GLTF document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfDocument {
    /// File metadata
    pub asset: GltfAssetInfo,
    /// Index of the default scene, if any
    #[serde(default)]
    pub scene: Option<usize>,
    /// All scenes
    #[serde(default)]
    pub scenes: Vec<GltfScene>,
    /// All scene-graph nodes
    #[serde(default)]
    pub nodes: Vec<GltfNode>,
    /// All meshes
    #[serde(default)]
    pub meshes: Vec<GltfMesh>,
    /// All accessors
    #[serde(default)]
    pub accessors: Vec<GltfAccessor>,
    /// All materials
    #[serde(default)]
    pub materials: Vec<GltfMaterial>,
    /// All buffer views
    #[serde(default)]
    pub buffer_views: Vec<GltfBufferView>,
    /// All buffers
    #[serde(default)]
    pub buffers: Vec<GltfBuffer>,
}

impl GltfDocument {
    /// Parse a GLTF document from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GltfError::Parse`] when the text is not a valid GLTF JSON
    /// document.
    pub fn from_json(text: &str) -> Result<Self, GltfError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The default scene record, when the document names one.
    #[must_use]
    pub fn default_scene(&self) -> Option<&GltfScene> {
        self.scenes.get(self.scene?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "asset": { "version": "2.0", "generator": "test" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "tri", "mesh": 0 }],
        "meshes": [{
            "name": "tri-mesh",
            "primitives": [{
                "attributes": { "POSITION": 0, "NORMAL": 1 },
                "indices": 2,
                "material": 0
            }]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [-1.0, -1.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "materials": [{ "name": "flat" }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 72, "byteLength": 6, "target": 34963 }
        ],
        "buffers": [{ "byteLength": 78, "uri": "tri.bin" }]
    }"#;

    #[test]
    fn test_parse_triangle_document() {
        let doc = GltfDocument::from_json(TRIANGLE).unwrap();
        assert_eq!(doc.asset.version, "2.0");
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].mesh, Some(0));

        let primitive = &doc.meshes[0].primitives[0];
        assert_eq!(primitive.attributes.position, Some(0));
        assert_eq!(primitive.mode, DEFAULT_PRIMITIVE_MODE);
        assert_eq!(primitive.indices, Some(2));

        assert_eq!(doc.buffer_views[2].byte_offset, 72);
        assert_eq!(doc.default_scene().unwrap().nodes, vec![0]);
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let doc = GltfDocument::from_json(r#"{ "asset": { "version": "2.0" } }"#).unwrap();
        assert!(doc.scenes.is_empty());
        assert!(doc.default_scene().is_none());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(GltfDocument::from_json("not json").is_err());
    }
}
