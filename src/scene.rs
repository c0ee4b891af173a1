pub mod camera;
pub mod mesh;
pub mod solar;

use std::sync::Arc;

use nalgebra as na;
use na::{Matrix4, Rotation3, Unit, Vector3};

use crate::pipeline::shader::ShaderKind;
use crate::util::{Color, WHITE};
use camera::{viewport_matrix, Camera};
use mesh::VertexBuffer;

/// Per draw call matrices, read-only while the object is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub viewport: Matrix4<f32>,
}

impl Uniforms {
    /// View and projection of the camera, identity model.
    pub fn for_camera(camera: &Camera, width: u32, height: u32) -> Self {
        return Self {
            model: Matrix4::identity(),
            view: camera.view_matrix(),
            projection: camera.projection_matrix(width, height),
            viewport: viewport_matrix(width, height),
        };
    }

    /// Identity everything except the viewport: positions are given in NDC.
    pub fn screen_space(width: u32, height: u32) -> Self {
        return Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            viewport: viewport_matrix(width, height),
        };
    }
}

/// One entry of the per-frame draw list.
#[derive(Debug, Clone)]
pub struct DrawObject {
    pub label: String,
    pub vertices: Arc<VertexBuffer>, // Shared between frames and objects.
    pub uniforms: Uniforms,
    pub transform: Matrix4<f32>,     // Replaces uniforms.model when drawn.
    pub shader: ShaderKind,
    pub base_color: Color,
}

impl DrawObject {
    pub fn new(
        label: &str,
        vertices: Arc<VertexBuffer>,
        uniforms: Uniforms,
        transform: Matrix4<f32>,
        shader: ShaderKind,
    ) -> Self {
        return Self {
            label: label.to_string(),
            vertices,
            uniforms,
            transform,
            shader,
            base_color: WHITE,
        };
    }
}

/// translate * rotate(axis, angle) * scale, angle in degrees.
/// A zero axis means no rotation.
pub fn model_matrix(
    translation: Vector3<f32>,
    scale: Vector3<f32>,
    rotation_axis: Vector3<f32>,
    rotation_angle_degrees: f32,
) -> Matrix4<f32> {
    let rotation = match Unit::try_new(rotation_axis, 1e-6) {
        Some(axis) => Rotation3::from_axis_angle(&axis, rotation_angle_degrees.to_radians()).to_homogeneous(),
        None => Matrix4::identity(),
    };
    return Matrix4::new_translation(&translation) * rotation * Matrix4::new_nonuniform_scaling(&scale);
}
