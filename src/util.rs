use std::ops;

use nalgebra as na;
use na::{vector, Vector3, Vector4};

/// Linear rgb color with float channels.
/// Channels are unrestricted while shading and get clamped to [0, 1] only when written to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };
pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Color {
        return Color { r, g, b };
    }

    /// Color from 0..=255 channel values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Color {
        return Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        };
    }

    /// Same gray value in every channel.
    pub fn gray(value: f32) -> Color {
        return Color { r: value, g: value, b: value };
    }

    /// Get linear interpolation of two colors: (1 - t) * c_1 + t * c_2.
    /// t is unrestricted.
    pub fn mix(color_1: Color, color_2: Color, t: f32) -> Color {
        return Color {
            r: mix(color_1.r, color_2.r, t),
            g: mix(color_1.g, color_2.g, t),
            b: mix(color_1.b, color_2.b, t),
        };
    }

    /// Quantized rgb8 value, clamping every channel to [0, 1] first.
    pub fn to_rgb8(&self) -> [u8; 3] {
        fn quantize(channel: f32) -> u8 {
            // NaN clamps to NaN and casts to 0.
            return (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        return [quantize(self.r), quantize(self.g), quantize(self.b)];
    }

    pub fn is_finite(&self) -> bool {
        return self.r.is_finite() && self.g.is_finite() && self.b.is_finite();
    }
}

impl ops::Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Color {
        return Color {
            r: self.r * rhs,
            g: self.g * rhs,
            b: self.b * rhs,
        };
    }
}

/// Scalar linear interpolation: (1 - t) * a + t * b.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    return a * (1.0 - t) + b * t;
}

/// Hermite interpolation between edge_0 and edge_1, clamped to [0, 1].
/// Equal edges act as a step function instead of dividing by zero.
pub fn smoothstep(edge_0: f32, edge_1: f32, x: f32) -> f32 {
    if edge_1 == edge_0 {
        return if x < edge_0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge_0) / (edge_1 - edge_0)).clamp(0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Transformation of a vector to homogenous coordinates.
pub fn to_hom_vector(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 0.0];
}

/// Dropping the w component without dividing by it.
pub fn from_hom_vector(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x, v.y, v.z];
}

/// Normalization, that returns zero vector instead of NaNs for (almost) zero-length input.
pub fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let norm = v.norm();
    if norm < 1e-12 || !norm.is_finite() {
        return Vector3::zeros();
    }
    return v / norm;
}
