use crate::mesh::{Model, TriMesh};
use serde::Serialize;
use serde_json::Value;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const TRIANGLES: u32 = 4;

/// Serializes `model` into a single self-contained GLB 2.0 file.
pub fn write_glb(model: &Model) -> Vec<u8> {
    let mut writer = GltfWriter::new();
    let mut children = Vec::with_capacity(model.parts.len());
    for part in &model.parts {
        children.push(writer.push_part(part));
    }

    let root = writer.nodes.len();
    writer.nodes.push(Node {
        name: "model".to_string(),
        mesh: None,
        children,
        extras: Some(model.annotations.clone()),
    });

    writer.finish(root)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    asset: Asset,
    scene: usize,
    scenes: Vec<Scene>,
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    accessors: Vec<Accessor>,
    buffer_views: Vec<BufferView>,
    buffers: Vec<Buffer>,
}

#[derive(Serialize)]
struct Asset {
    version: &'static str,
    generator: &'static str,
}

#[derive(Serialize)]
struct Scene {
    nodes: Vec<usize>,
}

#[derive(Serialize)]
struct Node {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extras: Option<Value>,
}

#[derive(Serialize)]
struct Mesh {
    name: String,
    primitives: Vec<Primitive>,
}

#[derive(Serialize)]
struct Primitive {
    attributes: Attributes,
    indices: usize,
    mode: u32,
}

#[derive(Serialize)]
struct Attributes {
    #[serde(rename = "POSITION")]
    position: usize,
    #[serde(rename = "NORMAL")]
    normal: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<[f32; 3]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
    target: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: usize,
}

struct GltfWriter {
    bin: Vec<u8>,
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    accessors: Vec<Accessor>,
    buffer_views: Vec<BufferView>,
}

impl GltfWriter {
    fn new() -> Self {
        Self {
            bin: Vec::new(),
            nodes: Vec::new(),
            meshes: Vec::new(),
            accessors: Vec::new(),
            buffer_views: Vec::new(),
        }
    }

    /// Appends one part as its own mesh and node; returns the node index.
    fn push_part(&mut self, part: &TriMesh) -> usize {
        let (min, max) = vec3_bounds(&part.positions);

        let position = self.push_vec3(&part.positions, Some((min, max)));
        let normal = self.push_vec3(&part.normals, None);

        let view = self.push_view(
            part.indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
            ELEMENT_ARRAY_BUFFER,
        );
        let indices = self.push_accessor(Accessor {
            buffer_view: view,
            component_type: UNSIGNED_INT,
            count: part.indices.len(),
            kind: "SCALAR",
            min: None,
            max: None,
        });

        let mesh = self.meshes.len();
        self.meshes.push(Mesh {
            name: part.name.clone(),
            primitives: vec![Primitive {
                attributes: Attributes { position, normal },
                indices,
                mode: TRIANGLES,
            }],
        });

        let node = self.nodes.len();
        self.nodes.push(Node {
            name: part.name.clone(),
            mesh: Some(mesh),
            children: Vec::new(),
            extras: None,
        });
        node
    }

    fn push_vec3(&mut self, data: &[[f32; 3]], bounds: Option<([f32; 3], [f32; 3])>) -> usize {
        let bytes = data
            .iter()
            .flat_map(|v| v.iter().flat_map(|c| c.to_le_bytes()))
            .collect();
        let view = self.push_view(bytes, ARRAY_BUFFER);
        self.push_accessor(Accessor {
            buffer_view: view,
            component_type: FLOAT,
            count: data.len(),
            kind: "VEC3",
            min: bounds.map(|b| b.0),
            max: bounds.map(|b| b.1),
        })
    }

    fn push_view(&mut self, bytes: Vec<u8>, target: u32) -> usize {
        pad_to_4(&mut self.bin, 0);
        let id = self.buffer_views.len();
        self.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset: self.bin.len(),
            byte_length: bytes.len(),
            target,
        });
        self.bin.extend_from_slice(&bytes);
        id
    }

    fn push_accessor(&mut self, accessor: Accessor) -> usize {
        let id = self.accessors.len();
        self.accessors.push(accessor);
        id
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        pad_to_4(&mut self.bin, 0);
        let doc = Document {
            asset: Asset {
                version: "2.0",
                generator: "draw2glb",
            },
            scene: 0,
            scenes: vec![Scene { nodes: vec![root] }],
            nodes: self.nodes,
            meshes: self.meshes,
            accessors: self.accessors,
            buffer_views: self.buffer_views,
            buffers: vec![Buffer {
                byte_length: self.bin.len(),
            }],
        };

        // Plain structs and JSON values; serialization cannot fail.
        let mut json = serde_json::to_vec(&doc).unwrap_or_default();
        pad_to_4(&mut json, b' ');

        let total = 12 + 8 + json.len() + 8 + self.bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        out.extend_from_slice(&GLB_VERSION.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());

        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);

        out.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&self.bin);
        out
    }
}

fn pad_to_4(buf: &mut Vec<u8>, fill: u8) {
    while buf.len() % 4 != 0 {
        buf.push(fill);
    }
}

fn vec3_bounds(data: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    if data.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for v in data {
        for k in 0..3 {
            min[k] = min[k].min(v[k]);
            max[k] = max[k].max(v[k]);
        }
    }
    (min, max)
}
