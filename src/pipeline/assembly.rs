use super::vertex::Vertex;
use crate::error::RenderError;

/// Three transformed vertices in submission order.
pub type Triangle = [Vertex; 3];

/// Groups every 3 consecutive transformed vertices into one triangle.
/// No reordering, culling or clipping happens here. A trailing partial group is an error.
pub fn primitive_assembly(transformed_vertices: &[Vertex]) -> Result<Vec<Triangle>, RenderError> {
    if transformed_vertices.len() % 3 != 0 {
        return Err(RenderError::PartialPrimitive { len: transformed_vertices.len() });
    }
    let triangles = transformed_vertices
        .chunks_exact(3)
        .map(|group| [group[0], group[1], group[2]])
        .collect();
    return Ok(triangles);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{vector, Vector3};

    fn vertex_at(x: f32) -> Vertex {
        return Vertex {
            screen: vector![x, 0.0, 0.0],
            clip_w: 1.0,
            normal: Vector3::zeros(),
            tex_coord: Vector3::zeros(),
            world_position: Vector3::zeros(),
            original_position: Vector3::zeros(),
        };
    }

    #[test]
    fn groups_in_order() {
        let stream: Vec<Vertex> = (0..6).map(|i| vertex_at(i as f32)).collect();
        let triangles = primitive_assembly(&stream).unwrap();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0][2].screen.x, 2.0);
        assert_eq!(triangles[1][0].screen.x, 3.0);
    }

    #[test]
    fn partial_group_fails_loudly() {
        let stream: Vec<Vertex> = (0..7).map(|i| vertex_at(i as f32)).collect();
        match primitive_assembly(&stream) {
            Err(RenderError::PartialPrimitive { len }) => assert_eq!(len, 7),
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn empty_stream_is_fine() {
        assert!(primitive_assembly(&[]).unwrap().is_empty());
    }
}
