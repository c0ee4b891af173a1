use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use threadpool::ThreadPool;

use super::buffer::Framebuffer;
use super::rasterizer::{Fragment, RasterOptions};
use super::{draw_object, DrawStats, FragmentSink};
use crate::error::RenderError;
use crate::noise::NoiseSource;
use crate::scene::DrawObject;

/// Most objects one parallel render can order. Tag 0 belongs to what the surface was seeded with.
pub const MAX_OBJECTS: usize = u8::MAX as usize;

/// Depth bits in the high half, then the submission tag in bits 24..31, rgb8 in the low
/// 24 bits, so depth, tag and color change together.
fn pack(depth: f32, tag: u8, rgb: [u8; 3]) -> u64 {
    let color = ((rgb[0] as u64) << 16) | ((rgb[1] as u64) << 8) | rgb[2] as u64;
    return ((depth.to_bits() as u64) << 32) | ((tag as u64) << 24) | color;
}

fn unpack_depth(packed: u64) -> f32 {
    return f32::from_bits((packed >> 32) as u32);
}

fn unpack_tag(packed: u64) -> u8 {
    return (packed >> 24) as u8;
}

fn unpack_color(packed: u64) -> [u8; 3] {
    return [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8];
}

/// Framebuffer replica with one atomic word per pixel, shared between workers.
pub struct AtomicSurface {
    width: u32,
    height: u32,
    pixels: Vec<AtomicU64>,
}

impl AtomicSurface {
    /// Seeds every pixel from the current framebuffer state.
    pub fn from_framebuffer(framebuffer: &Framebuffer) -> Self {
        let depth = framebuffer.depth.values();
        let color = framebuffer.color.as_render_data();
        let pixels = depth
            .iter()
            .zip(color.chunks_exact(3))
            .map(|(z, rgb)| AtomicU64::new(pack(*z, 0, [rgb[0], rgb[1], rgb[2]])))
            .collect();
        return Self {
            width: framebuffer.width(),
            height: framebuffer.height(),
            pixels,
        };
    }

    /// Compare-and-swap version of the depth test: retries until it either loses or installs
    /// its own value. On equal depth the lower tag wins, which is the object submitted first,
    /// so the outcome matches drawing the objects one after another.
    pub fn test_and_commit(&self, x: i32, y: i32, z: f32, tag: u8, rgb: [u8; 3]) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 || !z.is_finite() {
            return false;
        }
        let pixel = &self.pixels[x as usize + y as usize * self.width as usize];
        let new = pack(z, tag, rgb);
        let mut current = pixel.load(Ordering::Acquire);
        loop {
            let stored = unpack_depth(current);
            if z > stored || (z == stored && tag >= unpack_tag(current)) {
                return false;
            }
            match pixel.compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Copies the result back into the framebuffer.
    pub fn resolve_into(&self, framebuffer: &mut Framebuffer) {
        for (i, pixel) in self.pixels.iter().enumerate() {
            let packed = pixel.load(Ordering::Acquire);
            framebuffer.depth.values_mut()[i] = unpack_depth(packed);
            framebuffer.color.render_data_mut()[3 * i..3 * i + 3].copy_from_slice(&unpack_color(packed));
        }
    }
}

/// Sink handle of a single worker, tagged with the submission order of its object.
struct SharedSink {
    surface: Arc<AtomicSurface>,
    tag: u8,
}

impl FragmentSink for SharedSink {
    fn point(&mut self, fragment: &Fragment) -> bool {
        return self.surface.test_and_commit(
            fragment.x,
            fragment.y,
            fragment.depth,
            self.tag,
            fragment.color.to_rgb8(),
        );
    }
}

/// Renders every object as a separate job on the pool. The result is bit-identical to the
/// serial path. Callers keep `objects` at most `MAX_OBJECTS` long.
pub fn render_objects(
    pool: &ThreadPool,
    framebuffer: &mut Framebuffer,
    objects: &[DrawObject],
    options: &RasterOptions,
    noise: &Arc<NoiseSource>,
) -> Result<DrawStats, RenderError> {
    let surface = Arc::new(AtomicSurface::from_framebuffer(framebuffer));
    let (width, height) = (framebuffer.width(), framebuffer.height());
    let (sender, receiver) = mpsc::channel();

    for (index, object) in objects.iter().take(MAX_OBJECTS).enumerate() {
        let object = object.clone();
        let options = *options;
        let noise = Arc::clone(noise);
        let mut sink = SharedSink { surface: Arc::clone(&surface), tag: (index + 1) as u8 };
        let sender = sender.clone();
        pool.execute(move || {
            let result = draw_object(&object, &mut sink, width, height, &options, &noise);
            // The receiver outlives the pool join below.
            let _ = sender.send(result);
        });
    }
    drop(sender);
    pool.join();

    let mut stats = DrawStats::default();
    let mut first_error = None;
    let mut finished = 0;
    for result in receiver.iter() {
        finished += 1;
        match result {
            Ok(object_stats) => stats.merge(object_stats),
            Err(error) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }
    let submitted = objects.len().min(MAX_OBJECTS);
    if finished < submitted {
        log::warn!("{} of {} draw jobs did not finish", submitted - finished, submitted);
    }

    // Whatever got drawn before a failure stays visible, like in the serial path.
    surface.resolve_into(framebuffer);
    return match first_error {
        Some(error) => Err(error),
        None => Ok(stats),
    };
}
