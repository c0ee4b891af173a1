use std::f32::consts::PI;

use nalgebra as na;
use na::{vector, Vector2, Vector3};

use super::rasterizer::Fragment;
use crate::noise::{NoiseFamily, NoiseSource};
use crate::util::{smoothstep, Color};

/// Closed set of fragment shaders, selected per draw object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderKind {
    /// Color scaled by lighting intensity.
    #[default]
    Flat,
    Sun,
    Earth,
    Mars,
    Jupiter,
    Uranus,
    Neptune,
    /// Raw noise as grayscale, for debugging.
    Noise,
    Ship,
    ShipMoving,
}

impl ShaderKind {
    /// Looks up a shader by name. Unknown names fall back to the flat shader.
    pub fn from_name(name: &str) -> ShaderKind {
        return match name.to_ascii_lowercase().as_str() {
            "flat" | "default" => ShaderKind::Flat,
            "sun" | "star" => ShaderKind::Sun,
            "earth" => ShaderKind::Earth,
            "mars" => ShaderKind::Mars,
            "jupiter" => ShaderKind::Jupiter,
            "uranus" => ShaderKind::Uranus,
            "neptune" => ShaderKind::Neptune,
            "noise" => ShaderKind::Noise,
            "ship" => ShaderKind::Ship,
            "ship_moving" => ShaderKind::ShipMoving,
            unknown => {
                log::warn!("unknown shader '{}', using the flat shader", unknown);
                ShaderKind::Flat
            }
        };
    }

    /// Runs the fragment shader. Pure apart from reading the noise source.
    pub fn shade(self, fragment: Fragment, noise: &NoiseSource) -> Fragment {
        return match self {
            ShaderKind::Flat => flat_shader(fragment),
            ShaderKind::Sun => sun_shader(fragment, noise),
            ShaderKind::Earth => earth_shader(fragment, noise),
            ShaderKind::Mars => mars_shader(fragment, noise),
            ShaderKind::Jupiter => jupiter_shader(fragment),
            ShaderKind::Uranus => uranus_shader(fragment, noise),
            ShaderKind::Neptune => neptune_shader(fragment, noise),
            ShaderKind::Noise => noise_shader(fragment, noise),
            ShaderKind::Ship => ship_shader(fragment),
            ShaderKind::ShipMoving => ship_moving_shader(fragment),
        };
    }
}

/// Longitude, colatitude and radius of a model space position.
/// The origin maps to all zeros, poles get longitude 0.
fn spherical_coord(p: Vector3<f32>) -> Vector3<f32> {
    let radius = p.norm();
    if radius < 1e-12 || !radius.is_finite() {
        return Vector3::zeros();
    }
    let longitude = p.x.atan2(p.z);
    let colatitude = (p.y / radius).clamp(-1.0, 1.0).acos();
    return vector![longitude, colatitude, radius];
}

/// Spherical coordinates, normalized: longitude in [-0.5, 0.5], colatitude in [0, 1].
fn normalized_uv(p: Vector3<f32>) -> Vector2<f32> {
    let spherical = spherical_coord(p);
    return vector![spherical.x / (2.0 * PI), spherical.y / PI];
}

fn flat_shader(mut fragment: Fragment) -> Fragment {
    fragment.color = fragment.color * fragment.intensity;
    return fragment;
}

/// Self-luminous, no lighting applied.
fn sun_shader(mut fragment: Fragment, noise: &NoiseSource) -> Fragment {
    let color_1 = Color::from_rgb8(252, 211, 0);
    let color_2 = Color::from_rgb8(252, 163, 0);

    let uv = spherical_coord(fragment.original_position);
    // Large offsets with a coarse scale give few big blotches.
    let scale = 3000.0;
    let offset = 10000.0;
    let value = noise.sample2(NoiseFamily::Perlin, (uv.x + offset) * scale, (uv.y + offset) * scale);

    let t = smoothstep(-1.0, 1.0, value);
    fragment.color = Color::mix(color_1, color_2, t);
    return fragment;
}

fn earth_shader(mut fragment: Fragment, noise: &NoiseSource) -> Fragment {
    let ground_color = Color::new(0.13, 0.55, 0.13);
    let ocean_color = Color::new(0.12, 0.38, 0.57);
    let cloud_color = Color::new(1.0, 1.0, 1.0);
    let ice_color = Color::new(0.85, 0.85, 0.85);

    let land_threshold = 0.0;
    let ice_threshold = 0.8;
    let cloud_threshold = 0.4;
    let dimming = 0.8;

    let p = fragment.original_position;
    let uv = spherical_coord(p);
    let zoom = 80.0;
    let value = noise.sample3(NoiseFamily::OpenSimplex2, uv.x * zoom, uv.y * zoom, uv.z * zoom);

    let mut color = if value < land_threshold { ocean_color } else { ground_color };
    // Absolute normalized latitude, 1 at the poles.
    let polar = if uv.z > 0.0 { (p.y / uv.z).abs() } else { 0.0 };
    color = Color::mix(color, ice_color, smoothstep(ice_threshold, 1.0, polar));

    let cloud_zoom = zoom * 5.0;
    let cloud = 1.5 * noise.sample3(
        NoiseFamily::OpenSimplex2,
        uv.x * cloud_zoom,
        uv.y * cloud_zoom,
        uv.z * cloud_zoom,
    );
    if cloud > cloud_threshold {
        color = Color::mix(color, cloud_color, smoothstep(cloud_threshold, 0.6, cloud));
    }

    fragment.color = color * dimming * fragment.intensity;
    return fragment;
}

fn mars_shader(mut fragment: Fragment, noise: &NoiseSource) -> Fragment {
    let ground_color = Color::new(0.35, 0.15, 0.05);
    let lowland_color = Color::new(0.45, 0.25, 0.15);

    let uv = spherical_coord(fragment.original_position);
    let base_zoom = 150.0;
    let base = noise.sample3(NoiseFamily::OpenSimplex2, uv.x * base_zoom, uv.y * base_zoom, uv.z * base_zoom);
    let terrain_zoom = 300.0;
    let terrain = noise.sample3(
        NoiseFamily::OpenSimplex2,
        uv.x * terrain_zoom + 1000.0,
        uv.y * terrain_zoom,
        uv.z * terrain_zoom,
    );

    let color = if base < 0.0 { lowland_color } else { ground_color };
    let color = Color::mix(color, ground_color, terrain.clamp(0.0, 1.0));
    fragment.color = color * fragment.intensity;
    return fragment;
}

const JUPITER_STRIPES: [Color; 7] = [
    Color::new(0.7, 0.5, 0.4),
    Color::new(0.9, 0.7, 0.6),
    Color::new(0.6, 0.4, 0.3),
    Color::new(0.8, 0.6, 0.5),
    Color::new(0.5, 0.3, 0.2),
    Color::new(0.7, 0.5, 0.4),
    Color::new(0.6, 0.4, 0.3),
];

fn jupiter_shader(mut fragment: Fragment) -> Fragment {
    let uv = normalized_uv(fragment.original_position);

    // Stripes along the colatitude, blended near the middle of each one.
    let border = 0.08;
    let stripe_count = JUPITER_STRIPES.len();
    let stripe_width = 1.0 / stripe_count as f32;
    let stripe_index = ((uv.y / stripe_width) as usize).min(stripe_count - 1);
    let stripe_position = (uv.y - stripe_width * stripe_index as f32) / stripe_width;
    let below = JUPITER_STRIPES[stripe_index % stripe_count];
    let above = JUPITER_STRIPES[(stripe_index + 1) % stripe_count];
    let mut color = Color::mix(below, above, smoothstep(0.5 - border, 0.5 + border, stripe_position));

    // Storm marking.
    let storm_center = vector![0.4, 0.5];
    let storm_radius = 0.1;
    let storm_color = Color::new(0.3, 0.1, 0.1);
    let storm = 1.0 - smoothstep(0.0, storm_radius, (uv - storm_center).norm());
    color = Color::mix(color, storm_color, storm);

    fragment.color = color * fragment.intensity;
    return fragment;
}

fn uranus_shader(mut fragment: Fragment, noise: &NoiseSource) -> Fragment {
    let base_color = Color::new(0.21, 0.69, 0.87);
    let cloud_color = Color::new(0.85, 0.85, 0.92);

    let uv = normalized_uv(fragment.original_position);
    let scale = 0.6;
    let cloud = noise.sample2(NoiseFamily::OpenSimplex2, uv.x * scale, uv.y * scale);
    let cloud = (cloud + 1.0) / 2.0;

    let color = Color::mix(base_color, cloud_color, smoothstep(0.3, 0.7, cloud));
    fragment.color = color * fragment.intensity;
    return fragment;
}

fn neptune_shader(mut fragment: Fragment, noise: &NoiseSource) -> Fragment {
    let base_color = Color::new(0.05, 0.2, 0.5);
    let cloud_color = Color::new(0.7, 0.7, 0.9);

    let uv = spherical_coord(fragment.original_position);
    let scale = 0.3;
    let cloud = noise.sample2(NoiseFamily::OpenSimplex2, uv.x * scale + 1000.0, uv.y * scale);
    let cloud = (cloud + 1.0) / 2.0;

    // Band mask around the equator.
    let band_center = 0.5;
    let band_width = 0.1;
    let band = smoothstep(band_center - band_width, band_center + band_width, uv.y / PI);

    let color = Color::mix(base_color, cloud_color, band * cloud);
    fragment.color = color * fragment.intensity;
    return fragment;
}

/// Ignores lighting on purpose.
fn noise_shader(mut fragment: Fragment, noise: &NoiseSource) -> Fragment {
    let p = fragment.original_position;
    let (offset_x, offset_y, zoom) = (5500.0, 6900.0, 150.0);
    let value = noise.sample2(NoiseFamily::OpenSimplex2, (p.x + offset_x) * zoom, (p.y + offset_y) * zoom);
    fragment.color = Color::gray(value);
    return fragment;
}

fn ship_shader(mut fragment: Fragment) -> Fragment {
    fragment.color = Color::gray(0.5) * fragment.intensity;
    return fragment;
}

/// Highlighted, so no lighting. The red channel saturates on write.
fn ship_moving_shader(mut fragment: Fragment) -> Fragment {
    fragment.color = Color::new(2.0, 0.5, 0.5);
    return fragment;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::WHITE;

    const ALL: [ShaderKind; 10] = [
        ShaderKind::Flat,
        ShaderKind::Sun,
        ShaderKind::Earth,
        ShaderKind::Mars,
        ShaderKind::Jupiter,
        ShaderKind::Uranus,
        ShaderKind::Neptune,
        ShaderKind::Noise,
        ShaderKind::Ship,
        ShaderKind::ShipMoving,
    ];

    fn fragment_at(original_position: Vector3<f32>, intensity: f32) -> Fragment {
        let mut fragment = Fragment::point(0, 0, 0.5, WHITE);
        fragment.original_position = original_position;
        fragment.intensity = intensity;
        return fragment;
    }

    fn between(value: f32, a: f32, b: f32) -> bool {
        return value >= a.min(b) - 1e-6 && value <= a.max(b) + 1e-6;
    }

    #[test]
    fn sun_at_north_pole_is_between_base_colors() {
        let noise = NoiseSource::default();
        let shaded = ShaderKind::Sun.shade(fragment_at(vector![0.0, 1.0, 0.0], 0.0), &noise);
        let (a, b) = (Color::from_rgb8(252, 211, 0), Color::from_rgb8(252, 163, 0));
        assert!(shaded.color.is_finite());
        assert!(between(shaded.color.r, a.r, b.r));
        assert!(between(shaded.color.g, a.g, b.g));
        assert!(between(shaded.color.b, a.b, b.b));
    }

    #[test]
    fn shaders_survive_the_origin() {
        let noise = NoiseSource::default();
        for kind in ALL {
            let shaded = kind.shade(fragment_at(Vector3::zeros(), 1.0), &noise);
            assert!(shaded.color.is_finite(), "{:?} produced {:?}", kind, shaded.color);
        }
    }

    #[test]
    fn shading_is_deterministic_and_ignores_world_placement() {
        let noise = NoiseSource::default();
        let p = vector![0.3, -0.4, 0.866];
        for kind in ALL {
            let mut moved = fragment_at(p, 0.7);
            moved.world_position = vector![100.0, -3.0, 42.0];
            moved.x = 17;
            let first = kind.shade(fragment_at(p, 0.7), &noise);
            let second = kind.shade(moved, &noise);
            assert_eq!(first.color, second.color, "{:?}", kind);
        }
    }

    #[test]
    fn flat_and_lit_shaders_scale_with_intensity() {
        let noise = NoiseSource::default();
        let p = vector![0.0, 0.0, 1.0];
        for kind in [ShaderKind::Flat, ShaderKind::Jupiter, ShaderKind::Ship, ShaderKind::Uranus] {
            let dark = kind.shade(fragment_at(p, 0.0), &noise);
            assert_eq!(dark.color.to_rgb8(), [0, 0, 0], "{:?}", kind);
        }
    }

    #[test]
    fn unlit_shaders_ignore_intensity() {
        let noise = NoiseSource::default();
        let p = vector![0.6, 0.0, 0.8];
        for kind in [ShaderKind::Sun, ShaderKind::Noise, ShaderKind::ShipMoving] {
            let dark = kind.shade(fragment_at(p, 0.0), &noise);
            let lit = kind.shade(fragment_at(p, 1.0), &noise);
            assert_eq!(dark.color, lit.color, "{:?}", kind);
        }
        let moving = ShaderKind::ShipMoving.shade(fragment_at(p, 0.0), &noise);
        assert_eq!(moving.color.to_rgb8(), [255, 128, 128]);
    }

    #[test]
    fn earth_poles_turn_to_ice() {
        let noise = NoiseSource::default();
        let pole = ShaderKind::Earth.shade(fragment_at(vector![0.0, 1.0, 0.0], 1.0), &noise);
        // Ice (0.85) or cloud (1.0), dimmed by 0.8, always gray.
        assert!((pole.color.r - pole.color.g).abs() < 1e-5);
        assert!(pole.color.r >= 0.85 * 0.8 - 1e-5);
    }

    #[test]
    fn jupiter_storm_center_is_dark() {
        let noise = NoiseSource::default();
        // u = 0.4 and v = 0.5 on the unit sphere.
        let longitude = 0.4 * 2.0 * PI;
        let p = vector![longitude.sin(), 0.0, longitude.cos()];
        let shaded = ShaderKind::Jupiter.shade(fragment_at(p, 1.0), &noise);
        assert!((shaded.color.r - 0.3).abs() < 1e-3);
        assert!((shaded.color.g - 0.1).abs() < 1e-3);
    }

    #[test]
    fn unknown_shader_name_falls_back_to_flat() {
        assert_eq!(ShaderKind::from_name("pluto"), ShaderKind::Flat);
        assert_eq!(ShaderKind::from_name("Neptune"), ShaderKind::Neptune);
    }
}
