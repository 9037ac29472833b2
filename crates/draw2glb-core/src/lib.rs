pub mod geom;
pub mod glb;
pub mod infer;
pub mod mesh;
pub mod model;
pub mod report;
pub mod spec;
pub mod tokens;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Spec(#[from] spec::SpecError),
    #[error(transparent)]
    Mesh(#[from] mesh::MeshError),
}

/// Reads a client build spec and returns the finished GLB bytes.
pub fn build_glb_from_spec(spec: &Value) -> Result<Vec<u8>, BuildError> {
    let spec = spec::BuildSpec::from_json(spec)?;
    build_glb(&spec)
}

pub fn build_glb(spec: &spec::BuildSpec) -> Result<Vec<u8>, BuildError> {
    let model = mesh::build_model(spec)?;
    Ok(glb::write_glb(&model))
}
