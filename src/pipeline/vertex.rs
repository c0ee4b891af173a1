use nalgebra as na;
use na::{vector, Matrix4, Vector3};

use crate::scene::Uniforms;
use crate::util::{from_hom_vector, normalize_or_zero, to_hom_point, to_hom_vector};

/// Clip-space w at or below this value means the vertex is at or behind the eye.
pub const W_EPSILON: f32 = 1e-6;

/// One logical corner of a mesh in model space, as packed in a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coord: Vector3<f32>,
}

/// Output of the transform stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub screen: Vector3<f32>,            // x, y in pixels, z is depth.
    pub clip_w: f32,                     // w before the perspective divide.
    pub normal: Vector3<f32>,            // World space, unit length or zero.
    pub tex_coord: Vector3<f32>,
    pub world_position: Vector3<f32>,
    pub original_position: Vector3<f32>, // Model space, untouched.
}

impl Vertex {
    /// False when the perspective divide was skipped for this vertex.
    pub fn is_in_front_of_eye(&self) -> bool {
        return self.clip_w > W_EPSILON;
    }

    /// 1 / w, used for perspective-correct interpolation.
    pub fn inv_w(&self) -> f32 {
        return 1.0 / self.clip_w;
    }
}

/// Matrices of one draw call, combined once instead of per vertex.
pub struct VertexTransform {
    clip_matrix: Matrix4<f32>, // projection * view * model
    model_matrix: Matrix4<f32>,
    viewport_matrix: Matrix4<f32>,
}

impl VertexTransform {
    pub fn new(uniforms: &Uniforms) -> Self {
        return Self {
            clip_matrix: uniforms.projection * uniforms.view * uniforms.model,
            model_matrix: uniforms.model,
            viewport_matrix: uniforms.viewport,
        };
    }

    /// Vertex shader.
    ///
    /// Normals go through the upper 3x3 of the model matrix rather than its inverse transpose,
    /// which is exact only for uniform scale. Non-uniformly scaled objects get skewed shading.
    pub fn apply(&self, vertex: &MeshVertex) -> Vertex {
        let clip = self.clip_matrix * to_hom_point(vertex.position);

        let screen = if clip.w > W_EPSILON {
            let ndc = vector![clip.x / clip.w, clip.y / clip.w, clip.z / clip.w];
            let screen = self.viewport_matrix * to_hom_point(ndc);
            from_hom_vector(screen)
        } else {
            // Behind the eye: no divide, the rasterizer drops every triangle touching this vertex.
            from_hom_vector(clip)
        };

        let normal = normalize_or_zero(from_hom_vector(self.model_matrix * to_hom_vector(vertex.normal)));
        let world_position = from_hom_vector(self.model_matrix * to_hom_point(vertex.position));

        return Vertex {
            screen,
            clip_w: clip.w,
            normal,
            tex_coord: vertex.tex_coord,
            world_position,
            original_position: vertex.position,
        };
    }
}

/// Transform stage for a single vertex.
pub fn vertex_shader(vertex: &MeshVertex, uniforms: &Uniforms) -> Vertex {
    return VertexTransform::new(uniforms).apply(vertex);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::camera::viewport_matrix;

    fn corner(x: f32, y: f32, z: f32) -> MeshVertex {
        return MeshVertex {
            position: vector![x, y, z],
            normal: vector![0.0, 0.0, 1.0],
            tex_coord: Vector3::zeros(),
        };
    }

    fn identity_uniforms(width: u32, height: u32) -> Uniforms {
        return Uniforms {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            viewport: viewport_matrix(width, height),
        };
    }

    #[test]
    fn ndc_maps_to_pixels_with_flipped_y() {
        let uniforms = identity_uniforms(200, 100);
        let v = vertex_shader(&corner(-1.0, 1.0, -1.0), &uniforms);
        assert!((v.screen.x - 0.0).abs() < 1e-5);
        assert!((v.screen.y - 0.0).abs() < 1e-5);
        assert!((v.screen.z - 0.0).abs() < 1e-5);

        let v = vertex_shader(&corner(0.0, 0.0, 1.0), &uniforms);
        assert!((v.screen.x - 100.0).abs() < 1e-5);
        assert!((v.screen.y - 50.0).abs() < 1e-5);
        assert!((v.screen.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn same_input_gives_identical_output() {
        let mut uniforms = identity_uniforms(640, 480);
        uniforms.projection = Matrix4::new_perspective(640.0 / 480.0, 0.8, 0.1, 100.0);
        uniforms.model = Matrix4::new_translation(&vector![0.3, -0.2, -5.0]);
        let input = corner(0.25, 0.5, 0.75);
        let first = vertex_shader(&input, &uniforms);
        let second = vertex_shader(&input, &uniforms);
        assert!(first.is_in_front_of_eye());
        assert_eq!(first.screen.x.to_bits(), second.screen.x.to_bits());
        assert_eq!(first.screen.y.to_bits(), second.screen.y.to_bits());
        assert_eq!(first.screen.z.to_bits(), second.screen.z.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn vertex_behind_the_eye_is_flagged() {
        let mut uniforms = identity_uniforms(640, 480);
        uniforms.projection = Matrix4::new_perspective(1.0, 0.8, 0.1, 100.0);
        // Camera looks down -z, so +z is behind it.
        let v = vertex_shader(&corner(0.0, 0.0, 3.0), &uniforms);
        assert!(!v.is_in_front_of_eye());
        assert!(v.screen.x.is_finite());
    }

    #[test]
    fn original_position_survives_model_transform() {
        let mut uniforms = identity_uniforms(64, 64);
        uniforms.model = Matrix4::new_translation(&vector![4.0, 5.0, 6.0]) * Matrix4::new_scaling(2.0);
        let v = vertex_shader(&corner(1.0, 0.0, 0.0), &uniforms);
        assert_eq!(v.original_position, vector![1.0, 0.0, 0.0]);
        assert!((v.world_position - vector![6.0, 5.0, 6.0]).norm() < 1e-5);
        assert!((v.normal.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_normal_stays_zero() {
        let uniforms = identity_uniforms(64, 64);
        let mut input = corner(0.0, 0.0, 0.0);
        input.normal = Vector3::zeros();
        let v = vertex_shader(&input, &uniforms);
        assert_eq!(v.normal, Vector3::zeros());
    }
}
