use nalgebra as na;
use na::{vector, Vector3};

use super::assembly::Triangle;
use crate::util::{normalize_or_zero, Color, WHITE};

/// Edge function values (doubled areas, in square pixels) this far below zero still count
/// as inside, to close seams between triangles sharing an edge. Independent of triangle size.
const EDGE_EPSILON: f32 = 1e-6;
/// Triangles with smaller absolute (doubled) screen area are degenerate.
const AREA_EPSILON: f32 = 1e-6;

/// Candidate pixel write produced by rasterizing a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub x: i32,
    pub y: i32,
    pub depth: f32,
    pub color: Color,
    pub intensity: f32,                  // Lighting term in [0, 1].
    pub normal: Vector3<f32>,            // World space.
    pub world_position: Vector3<f32>,
    pub original_position: Vector3<f32>, // Model space, input for procedural shading.
}

impl Fragment {
    /// Fragment with neutral attributes, used for the starfield and in tests.
    pub fn point(x: i32, y: i32, depth: f32, color: Color) -> Self {
        return Self {
            x,
            y,
            depth,
            color,
            intensity: 1.0,
            normal: Vector3::zeros(),
            world_position: Vector3::zeros(),
            original_position: Vector3::zeros(),
        };
    }
}

/// Which faces get dropped before scan conversion.
/// Front faces are counter-clockwise in NDC, which is clockwise in y-down screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

/// Point light used for the per-fragment intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vector3<f32>,
    pub ambient: f32,
}

impl Default for Light {
    fn default() -> Self {
        // The sun sits at the world origin.
        return Self { position: Vector3::zeros(), ambient: 0.1 };
    }
}

impl Light {
    pub fn intensity(&self, normal: Vector3<f32>, world_position: Vector3<f32>) -> f32 {
        let normal = normalize_or_zero(normal);
        let to_light = normalize_or_zero(self.position - world_position);
        let diffuse = normal.dot(&to_light).max(0.0);
        return (self.ambient + (1.0 - self.ambient) * diffuse).clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub cull_mode: CullMode,
    pub perspective_correct: bool,
    pub light: Light,
    pub base_color: Color,
}

impl Default for RasterOptions {
    fn default() -> Self {
        return Self {
            cull_mode: CullMode::None,
            perspective_correct: false,
            light: Light::default(),
            base_color: WHITE,
        };
    }
}

/// What happened to a triangle handed to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Drawn(usize), // Number of emitted fragments, may be zero when off-screen.
    Degenerate,
    BehindEye,
    Culled,
}

/// Doubled signed area of (a, b, p), positive when p is to the left of a -> b in y-up terms.
fn edge_function(a: Vector3<f32>, b: Vector3<f32>, p_x: f32, p_y: f32) -> f32 {
    return (b.x - a.x) * (p_y - a.y) - (b.y - a.y) * (p_x - a.x);
}

/// Scan-converts one triangle, calling `emit` for every covered pixel of the
/// [0, width) x [0, height) frame. Pixel (x, y) is sampled at its integer coordinate.
pub fn rasterize_triangle<F>(
    triangle: &Triangle,
    width: u32,
    height: u32,
    options: &RasterOptions,
    mut emit: F,
) -> Coverage
where
    F: FnMut(Fragment),
{
    let [a, b, c] = triangle;
    if !(a.is_in_front_of_eye() && b.is_in_front_of_eye() && c.is_in_front_of_eye()) {
        return Coverage::BehindEye;
    }
    let (p_a, p_b, p_c) = (a.screen, b.screen, c.screen);
    if !(p_a.iter().chain(p_b.iter()).chain(p_c.iter()).all(|v| v.is_finite())) {
        return Coverage::Degenerate;
    }

    let area = edge_function(p_a, p_b, p_c.x, p_c.y);
    if area.abs() < AREA_EPSILON {
        return Coverage::Degenerate;
    }
    let is_front_facing = area < 0.0;
    match options.cull_mode {
        CullMode::Back if !is_front_facing => return Coverage::Culled,
        CullMode::Front if is_front_facing => return Coverage::Culled,
        _ => (),
    }

    if width == 0 || height == 0 {
        return Coverage::Drawn(0);
    }
    // Bounding box, clipped to the frame.
    let min_x = p_a.x.min(p_b.x).min(p_c.x).floor().max(0.0);
    let min_y = p_a.y.min(p_b.y).min(p_c.y).floor().max(0.0);
    let max_x = p_a.x.max(p_b.x).max(p_c.x).ceil().min((width - 1) as f32);
    let max_y = p_a.y.max(p_b.y).max(p_c.y).ceil().min((height - 1) as f32);
    if min_x > max_x || min_y > max_y {
        return Coverage::Drawn(0);
    }

    let inv_w = vector![a.inv_w(), b.inv_w(), c.inv_w()];
    let mut emitted = 0;
    for j in (min_y as i32)..=(max_y as i32) {
        for i in (min_x as i32)..=(max_x as i32) {
            let (p_x, p_y) = (i as f32, j as f32);
            let edges = vector![
                edge_function(p_b, p_c, p_x, p_y),
                edge_function(p_c, p_a, p_x, p_y),
                edge_function(p_a, p_b, p_x, p_y)
            ];
            // Inside test on the raw edge values, oriented so both windings are positive.
            if edges.iter().any(|e| e * area.signum() < -EDGE_EPSILON) {
                continue;
            }
            let bar_coord = edges / area;

            // Depth is affine in screen space after the divide, so it is always interpolated linearly.
            let depth = bar_coord.dot(&vector![p_a.z, p_b.z, p_c.z]);

            let attr_coord = if options.perspective_correct {
                let weighted = bar_coord.component_mul(&inv_w);
                let sum = weighted.sum();
                if sum.abs() < f32::EPSILON {
                    bar_coord
                } else {
                    weighted / sum
                }
            } else {
                bar_coord
            };
            let interpolate = |v_a: Vector3<f32>, v_b: Vector3<f32>, v_c: Vector3<f32>| -> Vector3<f32> {
                return v_a * attr_coord.x + v_b * attr_coord.y + v_c * attr_coord.z;
            };
            let normal = normalize_or_zero(interpolate(a.normal, b.normal, c.normal));
            let world_position = interpolate(a.world_position, b.world_position, c.world_position);
            let original_position =
                interpolate(a.original_position, b.original_position, c.original_position);

            emit(Fragment {
                x: i,
                y: j,
                depth,
                color: options.base_color,
                intensity: options.light.intensity(normal, world_position),
                normal,
                world_position,
                original_position,
            });
            emitted += 1;
        }
    }

    return Coverage::Drawn(emitted);
}

/// Collecting version of `rasterize_triangle`.
pub fn triangle(triangle: &Triangle, width: u32, height: u32, options: &RasterOptions) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    rasterize_triangle(triangle, width, height, options, |fragment| fragments.push(fragment));
    return fragments;
}
