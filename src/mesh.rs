//! Wavefront OBJ loading.
//!
//! Loading happens in two stages: [`parse_obj`] reads the file (and its
//! companion `.mtl`) into an [`ObjSource`], then [`flatten`] unrolls every
//! triangle into its own vertex triple. Shared vertices are not deduplicated,
//! so the index buffer is always `0..N`.
//!
//! Input must be pre-triangulated; any other face arity is rejected.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::vertex::Vertex;

pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, #[source] source: tobj::LoadError },
    #[error("malformed geometry in {path}: {source}")]
    Geometry { path: PathBuf, #[source] source: GeometryError },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    #[error("shape `{shape}` has non-triangular faces")]
    NotTriangulated { shape: String },
    #[error("shape `{shape}` references position {index} but only {count} exist")]
    IndexOutOfRange { shape: String, index: u32, count: usize },
    #[error("shape `{shape}` references material {id} but only {count} exist")]
    MissingMaterial { shape: String, id: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: [f32; 3],
}

/// One group of faces from the source file.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub name: String,
    /// Position indices, three per triangle.
    pub corners: Vec<u32>,
    /// One entry per triangle; `None` when the face has no material.
    pub material_ids: Vec<Option<usize>>,
}

/// Parsed file contents before flattening.
#[derive(Debug, Clone, Default)]
pub struct ObjSource {
    pub positions: Vec<[f32; 3]>,
    pub shapes: Vec<Shape>,
    pub materials: Vec<Material>,
}

/// CPU-side triangle list. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub fn load_mesh(path: &Path) -> Result<Mesh, LoadError> {
    let parsed = parse_obj(path)?;
    let mesh = flatten(&parsed).map_err(|source| LoadError::Geometry { path: path.to_path_buf(), source })?;
    log::info!(
        "loaded {}: {} shapes, {} materials, {} triangles",
        path.display(),
        parsed.shapes.len(),
        parsed.materials.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

pub fn parse_obj(path: &Path) -> Result<ObjSource, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let mut reader = BufReader::new(file);
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let opts = tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj_buf(&mut reader, &opts, |mtl| tobj::load_mtl(base_dir.join(mtl)))
        .map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })?;

    let materials: Vec<Material> = match materials {
        Ok(mats) => mats
            .into_iter()
            .map(|m| Material { name: m.name, diffuse: m.diffuse.unwrap_or_default() })
            .collect(),
        Err(e) => {
            log::warn!("{}: material library unavailable ({e}), using default colors", path.display());
            Vec::new()
        }
    };

    if !materials.is_empty() {
        let names: Vec<&str> = materials.iter().map(|m: &Material| m.name.as_str()).collect();
        log::debug!("{}: materials {names:?}", path.display());
    }

    let mut source = ObjSource { materials, ..Default::default() };
    for model in models {
        let mesh = model.mesh;
        if mesh.face_arities.iter().any(|&n| n != 3) || mesh.indices.len() % 3 != 0 {
            return Err(LoadError::Geometry {
                path: path.to_path_buf(),
                source: GeometryError::NotTriangulated { shape: model.name },
            });
        }

        let base = source.positions.len() as u32;
        source.positions.extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
        source.shapes.push(Shape {
            material_ids: vec![mesh.material_id; mesh.indices.len() / 3],
            corners: mesh.indices.iter().map(|&i| base + i).collect(),
            name: model.name,
        });
    }
    Ok(source)
}

/// Unrolls every triangle into three fresh vertices.
///
/// Color is looked up once per triangle. Files without any material are
/// white; triangles without a material in a file that has some stay black.
pub fn flatten(source: &ObjSource) -> Result<Mesh, GeometryError> {
    let has_materials = !source.materials.is_empty();
    let corner_count: usize = source.shapes.iter().map(|s| s.corners.len()).sum();
    let mut vertices = Vec::with_capacity(corner_count);
    let mut indices = Vec::with_capacity(corner_count);

    for shape in &source.shapes {
        if shape.corners.len() % 3 != 0 {
            return Err(GeometryError::NotTriangulated { shape: shape.name.clone() });
        }

        for (tri, corners) in shape.corners.chunks_exact(3).enumerate() {
            let color = if has_materials {
                match shape.material_ids.get(tri).copied().flatten() {
                    Some(id) => {
                        source.materials.get(id)
                            .ok_or_else(|| GeometryError::MissingMaterial {
                                shape: shape.name.clone(), id, count: source.materials.len(),
                            })?
                            .diffuse
                    }
                    None => [0.0; 3],
                }
            } else {
                WHITE
            };

            for &index in corners {
                let position = *source.positions.get(index as usize).ok_or_else(|| GeometryError::IndexOutOfRange {
                    shape: shape.name.clone(), index, count: source.positions.len(),
                })?;
                vertices.push(Vertex { position, color });
                indices.push(indices.len() as u32);
            }
        }
    }

    Ok(Mesh { vertices, indices })
}
