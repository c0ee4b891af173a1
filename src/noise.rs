use fastnoise_lite::{FastNoiseLite, NoiseType};

/// Seed used by every generator unless a scene asks for another one.
pub const DEFAULT_SEED: i32 = 1337;

/// Family of the noise, used to pick one of the precomputed generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseFamily {
    Perlin,
    OpenSimplex2,
}

impl NoiseFamily {
    const ALL: [NoiseFamily; 2] = [NoiseFamily::Perlin, NoiseFamily::OpenSimplex2];

    fn index(self) -> usize {
        return match self {
            NoiseFamily::Perlin => 0,
            NoiseFamily::OpenSimplex2 => 1,
        };
    }

    fn noise_type(self) -> NoiseType {
        return match self {
            NoiseFamily::Perlin => NoiseType::Perlin,
            NoiseFamily::OpenSimplex2 => NoiseType::OpenSimplex2,
        };
    }
}

/// Deterministic scalar field generator.
///
/// All generators are configured once in `new` and only read afterwards, so a single
/// instance can be shared between shaders, frames and worker threads.
pub struct NoiseSource {
    generators: [FastNoiseLite; 2],
}

impl NoiseSource {
    pub fn new(seed: i32) -> Self {
        let generators = NoiseFamily::ALL.map(|family| {
            let mut generator = FastNoiseLite::with_seed(seed);
            generator.set_noise_type(Some(family.noise_type()));
            return generator;
        });
        return Self { generators };
    }

    /// 2D sample in [-1, 1].
    pub fn sample2(&self, family: NoiseFamily, x: f32, y: f32) -> f32 {
        if !(x.is_finite() && y.is_finite()) {
            return 0.0;
        }
        let value = self.generators[family.index()].get_noise_2d(x, y);
        return sanitize(value);
    }

    /// 3D sample in [-1, 1].
    pub fn sample3(&self, family: NoiseFamily, x: f32, y: f32, z: f32) -> f32 {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return 0.0;
        }
        let value = self.generators[family.index()].get_noise_3d(x, y, z);
        return sanitize(value);
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        return Self::new(DEFAULT_SEED);
    }
}

/// Generators may slightly overshoot the unit range.
fn sanitize(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    return value.clamp(-1.0, 1.0);
}
