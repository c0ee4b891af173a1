use std::f32::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra as na;
use na::{vector, Vector3};
use obj::raw::object::Polygon;
use obj::raw::parse_obj;

use crate::error::{Attribute, RenderError};
use crate::pipeline::vertex::MeshVertex;

/// Corner of a triangular face: index into each of the three attribute arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub position_indices: [usize; 3],
    pub normal_indices: [usize; 3],
    pub tex_indices: [usize; 3],
}

/// Indexed mesh as it comes from an asset.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub tex_coords: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
}

/// Flat buffer of (position, normal, texcoord) triples, one triple per face corner.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    entries: Vec<Vector3<f32>>,
}

impl VertexBuffer {
    /// Fails unless the entries pack into whole triples and the corners into whole triangles.
    pub fn new(entries: Vec<Vector3<f32>>) -> Result<Self, RenderError> {
        if entries.len() % 3 != 0 {
            return Err(RenderError::MalformedVertexBuffer { len: entries.len() });
        }
        if entries.len() % 9 != 0 {
            return Err(RenderError::PartialTriangle { corners: entries.len() / 3 });
        }
        return Ok(Self { entries });
    }

    /// Expands faces into per-corner triples, checking every index on the way.
    pub fn from_mesh(mesh: &MeshData) -> Result<Self, RenderError> {
        fn lookup(
            values: &[Vector3<f32>],
            face: usize,
            attribute: Attribute,
            index: usize,
        ) -> Result<Vector3<f32>, RenderError> {
            return values.get(index).copied().ok_or(RenderError::IndexOutOfRange {
                face,
                attribute,
                index,
                len: values.len(),
            });
        }

        let mut entries = Vec::with_capacity(mesh.faces.len() * 9);
        for (face_index, face) in mesh.faces.iter().enumerate() {
            for i in 0..3 {
                entries.push(lookup(&mesh.positions, face_index, Attribute::Position, face.position_indices[i])?);
                entries.push(lookup(&mesh.normals, face_index, Attribute::Normal, face.normal_indices[i])?);
                entries.push(lookup(&mesh.tex_coords, face_index, Attribute::TexCoord, face.tex_indices[i])?);
            }
        }
        return Ok(Self { entries });
    }

    /// Number of logical vertices (corners).
    pub fn len(&self) -> usize {
        return self.entries.len() / 3;
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    pub fn corners(&self) -> impl Iterator<Item = MeshVertex> + '_ {
        return self.entries.chunks_exact(3).map(|triple| MeshVertex {
            position: triple[0],
            normal: triple[1],
            tex_coord: triple[2],
        });
    }
}

/// Parses an obj file and flattens it into a vertex buffer.
pub fn load_obj(path: &Path) -> Result<VertexBuffer, RenderError> {
    let mesh = parse_mesh(BufReader::new(File::open(path)?))?;
    log::info!(
        "{}: {} positions, {} normals, {} texcoords, {} faces",
        path.display(),
        mesh.positions.len(),
        mesh.normals.len(),
        mesh.tex_coords.len(),
        mesh.faces.len()
    );
    return VertexBuffer::from_mesh(&mesh);
}

/// Reads obj text into an indexed triangle mesh.
/// Polygons are fanned into triangles, missing normals become face normals and missing
/// texture coordinates point at a shared zero entry.
pub fn parse_mesh<R: BufRead>(input: R) -> Result<MeshData, RenderError> {
    let raw = parse_obj(input)?;
    let mut mesh = MeshData {
        positions: raw.positions.iter().map(|p| vector![p.0, p.1, p.2]).collect(),
        normals: raw.normals.iter().map(|n| vector![n.0, n.1, n.2]).collect(),
        tex_coords: raw.tex_coords.iter().map(|t| vector![t.0, t.1, t.2]).collect(),
        faces: Vec::new(),
    };
    let mut zero_tex_index: Option<usize> = None;

    for polygon in &raw.polygons {
        // (position, texcoord, normal) per corner.
        let corners: Vec<(usize, Option<usize>, Option<usize>)> = match polygon {
            Polygon::P(indices) => indices.iter().map(|p| (*p, None, None)).collect(),
            Polygon::PT(indices) => indices.iter().map(|(p, t)| (*p, Some(*t), None)).collect(),
            Polygon::PN(indices) => indices.iter().map(|(p, n)| (*p, None, Some(*n))).collect(),
            Polygon::PTN(indices) => indices.iter().map(|(p, t, n)| (*p, Some(*t), Some(*n))).collect(),
        };

        for k in 1..corners.len().saturating_sub(1) {
            let fan = [corners[0], corners[k], corners[k + 1]];
            let position_indices = [fan[0].0, fan[1].0, fan[2].0];

            let normal_indices = match (fan[0].2, fan[1].2, fan[2].2) {
                (Some(a), Some(b), Some(c)) => [a, b, c],
                _ => {
                    let face = mesh.faces.len();
                    let corner = |i: usize| -> Result<Vector3<f32>, RenderError> {
                        return mesh.positions.get(position_indices[i]).copied().ok_or(
                            RenderError::IndexOutOfRange {
                                face,
                                attribute: Attribute::Position,
                                index: position_indices[i],
                                len: mesh.positions.len(),
                            },
                        );
                    };
                    let (a, b, c) = (corner(0)?, corner(1)?, corner(2)?);
                    let normal = (b - a).cross(&(c - a));
                    let normal = if normal.norm() > 0.0 { normal.normalize() } else { normal };
                    mesh.normals.push(normal);
                    let index = mesh.normals.len() - 1;
                    [index, index, index]
                }
            };

            let tex_indices = match (fan[0].1, fan[1].1, fan[2].1) {
                (Some(a), Some(b), Some(c)) => [a, b, c],
                _ => {
                    let index = *zero_tex_index.get_or_insert_with(|| {
                        mesh.tex_coords.push(Vector3::zeros());
                        return mesh.tex_coords.len() - 1;
                    });
                    [index, index, index]
                }
            };

            mesh.faces.push(Face { position_indices, normal_indices, tex_indices });
        }
    }

    return Ok(mesh);
}

/// Unit sphere with outward normals and counter-clockwise faces.
/// Longitude grows with atan2(x, z), colatitude from +y.
pub fn uv_sphere(stacks: usize, slices: usize) -> VertexBuffer {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let point = |i: usize, j: usize| -> Vector3<f32> {
        let theta = PI * i as f32 / stacks as f32;
        let phi = 2.0 * PI * j as f32 / slices as f32;
        return vector![theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos()];
    };
    let tex = |i: usize, j: usize| -> Vector3<f32> {
        return vector![j as f32 / slices as f32, i as f32 / stacks as f32, 0.0];
    };

    let mut entries = Vec::new();
    let mut push_triangle = |corners: [(usize, usize); 3]| {
        for (i, j) in corners {
            let p = point(i, j);
            entries.push(p);
            entries.push(p);
            entries.push(tex(i, j));
        }
    };
    for i in 0..stacks {
        for j in 0..slices {
            let (a, b, c, d) = ((i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1));
            // Pole rows collapse one triangle of the quad.
            if i != stacks - 1 {
                push_triangle([a, b, c]);
            }
            if i != 0 {
                push_triangle([a, c, d]);
            }
        }
    }
    return VertexBuffer { entries };
}

/// Small closed arrow-head pointing down -z, stand-in for a ship model.
pub fn dart() -> VertexBuffer {
    let nose = vector![0.0, 0.0, -2.0];
    let left = vector![-1.0, 0.0, 1.0];
    let right = vector![1.0, 0.0, 1.0];
    let top = vector![0.0, 0.5, 1.0];
    let bottom = vector![0.0, -0.3, 1.0];
    let center = (nose + left + right + top + bottom) / 5.0;
    let faces = [
        [nose, left, top],
        [nose, top, right],
        [nose, right, bottom],
        [nose, bottom, left],
        [left, bottom, right],
        [left, right, top],
    ];

    let mut entries = Vec::new();
    for [a, mut b, mut c] in faces {
        let mut normal = (b - a).cross(&(c - a));
        if normal.dot(&((a + b + c) / 3.0 - center)) < 0.0 {
            std::mem::swap(&mut b, &mut c);
            normal = -normal;
        }
        let normal = normal.normalize();
        for p in [a, b, c] {
            entries.push(p);
            entries.push(normal);
            entries.push(Vector3::zeros());
        }
    }
    return VertexBuffer { entries };
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn rejects_partial_triples() {
        let entries = vec![Vector3::zeros(); 7];
        assert!(matches!(VertexBuffer::new(entries), Err(RenderError::MalformedVertexBuffer { len: 7 })));
    }

    #[test]
    fn rejects_partial_triangles() {
        // Four whole corners: one triangle and a dangling corner.
        let entries = vec![Vector3::zeros(); 12];
        assert!(matches!(VertexBuffer::new(entries), Err(RenderError::PartialTriangle { corners: 4 })));
        assert_eq!(VertexBuffer::new(vec![Vector3::zeros(); 18]).unwrap().len(), 6);
    }

    #[test]
    fn quad_is_fanned_into_two_triangles() {
        let mesh = parse_mesh(QUAD_OBJ.as_bytes()).unwrap();
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.faces[1].position_indices, [0, 2, 3]);
        let buffer = VertexBuffer::from_mesh(&mesh).unwrap();
        assert_eq!(buffer.len(), 6);
        let corners: Vec<MeshVertex> = buffer.corners().collect();
        assert_eq!(corners[1].position, vector![1.0, 0.0, 0.0]);
        assert_eq!(corners[1].normal, vector![0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_normals_and_texcoords_are_filled_in() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse_mesh(text.as_bytes()).unwrap();
        let buffer = VertexBuffer::from_mesh(&mesh).unwrap();
        for corner in buffer.corners() {
            assert!((corner.normal - vector![0.0, 0.0, 1.0]).norm() < 1e-6);
            assert_eq!(corner.tex_coord, Vector3::zeros());
        }
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mesh = MeshData {
            positions: vec![Vector3::zeros(); 3],
            normals: vec![Vector3::zeros()],
            tex_coords: vec![Vector3::zeros()],
            faces: vec![Face {
                position_indices: [0, 1, 2],
                normal_indices: [0, 0, 4],
                tex_indices: [0, 0, 0],
            }],
        };
        match VertexBuffer::from_mesh(&mesh) {
            Err(RenderError::IndexOutOfRange { face, attribute, index, len }) => {
                assert_eq!((face, attribute, index, len), (0, Attribute::Normal, 4, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn sphere_is_closed_and_outward_facing() {
        let sphere = uv_sphere(8, 12);
        assert_eq!(sphere.len() % 3, 0);
        // Two triangles per quad, minus one per quad in each pole row.
        assert_eq!(sphere.len() / 3, 2 * 8 * 12 - 2 * 12);
        let corners: Vec<MeshVertex> = sphere.corners().collect();
        for triangle in corners.chunks_exact(3) {
            let face_normal = (triangle[1].position - triangle[0].position)
                .cross(&(triangle[2].position - triangle[0].position));
            assert!(face_normal.dot(&triangle[0].position) > 0.0);
            assert!((triangle[0].position.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn dart_faces_point_outward() {
        let ship = dart();
        let corners: Vec<MeshVertex> = ship.corners().collect();
        assert_eq!(corners.len(), 18);
        for triangle in corners.chunks_exact(3) {
            let face_normal = (triangle[1].position - triangle[0].position)
                .cross(&(triangle[2].position - triangle[0].position));
            assert!(face_normal.dot(&triangle[0].normal) > 0.0);
        }
    }
}
