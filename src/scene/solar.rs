use std::sync::Arc;

use nalgebra as na;
use na::{vector, Vector3};

use super::camera::Camera;
use super::mesh::VertexBuffer;
use super::{model_matrix, DrawObject, Uniforms};
use crate::pipeline::shader::ShaderKind;

/// Speed change per key press.
const SPEED_STEP: f32 = 0.5;

/// A sphere orbiting the origin in the xz plane and spinning around its own axis.
/// Angles are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: &'static str,
    pub shader: ShaderKind,
    pub scale: f32,
    pub orbit_distance: f32,
    pub orbit_angle: f32,
    pub orbit_step: f32,
    pub y_offset: f32,
    pub rotation_axis: Vector3<f32>,
    pub rotation_angle: f32,
    pub rotation_step: f32,
}

impl Body {
    pub fn translation(&self) -> Vector3<f32> {
        let angle = self.orbit_angle.to_radians();
        return vector![
            self.orbit_distance * angle.cos(),
            self.y_offset,
            self.orbit_distance * angle.sin()
        ];
    }

    pub fn transform(&self) -> na::Matrix4<f32> {
        return model_matrix(
            self.translation(),
            vector![self.scale, self.scale, self.scale],
            self.rotation_axis,
            self.rotation_angle,
        );
    }
}

/// Ship hanging in front of the initial camera. It does not follow camera moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    pub translation: Vector3<f32>,
    pub scale: f32,
    pub moving: bool,
    view: Camera,
}

/// Animation state of the whole scene, advanced once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarSystem {
    pub bodies: Vec<Body>,
    pub ship: Ship,
    pub rotation_speed: f32,
    pub orbit_speed: f32,
    pub orbiting: bool,
}

fn body(
    name: &'static str,
    shader: ShaderKind,
    scale: f32,
    orbit_distance: f32,
    orbit_angle: f32,
    orbit_step: f32,
    y_offset: f32,
    rotation_angle: f32,
    rotation_step: f32,
) -> Body {
    return Body {
        name,
        shader,
        scale,
        orbit_distance,
        orbit_angle,
        orbit_step,
        y_offset,
        rotation_axis: vector![0.0, 1.0, 0.0],
        rotation_angle,
        rotation_step,
    };
}

impl Default for SolarSystem {
    fn default() -> Self {
        let mut neptune = body("neptune", ShaderKind::Neptune, 0.6, 9.5, 200.0, 0.3, -0.1, 0.0, 0.0);
        neptune.rotation_axis = vector![0.0, 2.0, 0.0];

        return Self {
            bodies: vec![
                body("sun", ShaderKind::Sun, 3.0, 0.0, 0.0, 0.0, 0.0, 0.2, 0.2),
                body("earth", ShaderKind::Earth, 0.3, -3.5, -90.0, 1.0, -0.2, 0.0, 0.8),
                body("mars", ShaderKind::Mars, 0.4, 5.0, -50.0, 0.8, 0.3, 0.0, 0.6),
                body("jupiter", ShaderKind::Jupiter, 0.7, -6.5, 175.0, 0.6, -0.2, 4.0, 0.4),
                body("uranus", ShaderKind::Uranus, 0.5, 8.0, 80.0, 0.4, -0.1, -3.0, 0.3),
                neptune,
            ],
            ship: Ship {
                translation: vector![0.0, 0.4, 13.5],
                scale: 0.03,
                moving: false,
                view: Camera::default(),
            },
            rotation_speed: 1.0,
            orbit_speed: 1.0,
            orbiting: true,
        };
    }
}

impl SolarSystem {
    /// Advances spins always and orbits only while orbiting is on.
    pub fn step(&mut self) {
        for body in &mut self.bodies {
            body.rotation_angle += self.rotation_speed * body.rotation_step;
            if self.orbiting {
                body.orbit_angle += body.orbit_step * self.orbit_speed;
            }
        }
    }

    pub fn speed_up(&mut self) {
        self.rotation_speed += SPEED_STEP;
        self.orbit_speed += SPEED_STEP;
    }

    pub fn slow_down(&mut self) {
        self.rotation_speed -= SPEED_STEP;
        self.orbit_speed -= SPEED_STEP;
    }

    pub fn toggle_orbiting(&mut self) {
        self.orbiting = !self.orbiting;
        log::debug!("orbiting: {}", self.orbiting);
    }

    pub fn set_ship_moving(&mut self, moving: bool) {
        self.ship.moving = moving;
    }

    /// Replaces the shader of every body, the ship keeps its own.
    pub fn set_body_shader(&mut self, shader: ShaderKind) {
        for body in &mut self.bodies {
            body.shader = shader;
        }
    }

    pub fn body(&self, name: &str) -> Option<&Body> {
        return self.bodies.iter().find(|body| body.name == name);
    }

    /// Draw list of the current state. Bodies are seen through `camera`, the ship through
    /// the camera it was placed with.
    pub fn snapshot(
        &self,
        camera: &Camera,
        width: u32,
        height: u32,
        planet_mesh: &Arc<VertexBuffer>,
        ship_mesh: &Arc<VertexBuffer>,
    ) -> Vec<DrawObject> {
        let uniforms = Uniforms::for_camera(camera, width, height);
        let mut objects: Vec<DrawObject> = self
            .bodies
            .iter()
            .map(|body| DrawObject::new(body.name, Arc::clone(planet_mesh), uniforms, body.transform(), body.shader))
            .collect();

        let ship_shader = if self.ship.moving { ShaderKind::ShipMoving } else { ShaderKind::Ship };
        let ship_transform = model_matrix(
            self.ship.translation,
            vector![self.ship.scale, self.ship.scale, self.ship.scale],
            Vector3::zeros(),
            0.0,
        );
        objects.push(DrawObject::new(
            "ship",
            Arc::clone(ship_mesh),
            Uniforms::for_camera(&self.ship.view, width, height),
            ship_transform,
            ship_shader,
        ));
        return objects;
    }
}
