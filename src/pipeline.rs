pub mod assembly;
pub mod buffer;
pub mod parallel;
pub mod rasterizer;
pub mod shader;
pub mod vertex;

use std::sync::Arc;
use std::time;

use nalgebra as na;
use na::{vector, Vector2};
use threadpool::ThreadPool;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::noise::{NoiseFamily, NoiseSource};
use crate::present::Present;
use crate::scene::DrawObject;
use crate::util::WHITE;

use assembly::primitive_assembly;
use buffer::Framebuffer;
use rasterizer::{rasterize_triangle, Coverage, Fragment, RasterOptions};
use vertex::{Vertex, VertexTransform};

/// Initial starfield scroll.
const STAR_SCROLL_ORIGIN: (f32, f32) = (1200.0, 3000.0);
/// Scroll added on every clear.
const STAR_SCROLL_STEP: f32 = 0.001;
/// Stars are placed at depth 1 + |noise| * range, behind everything inside the far plane.
const STAR_DEPTH_RANGE: f32 = 100.0;

/// Anything, that can take shaded fragments and resolve their visibility.
pub trait FragmentSink {
    /// Writes the fragment iff it is strictly nearer than what the pixel holds.
    fn point(&mut self, fragment: &Fragment) -> bool;
}

impl FragmentSink for Framebuffer {
    fn point(&mut self, fragment: &Fragment) -> bool {
        return Framebuffer::point(self, fragment);
    }
}

/// Counters for one draw call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles: usize,
    pub degenerate: usize,
    pub behind_eye: usize,
    pub culled: usize,
    pub fragments: usize,
    pub written: usize,
}

impl DrawStats {
    pub fn merge(&mut self, other: DrawStats) {
        self.triangles += other.triangles;
        self.degenerate += other.degenerate;
        self.behind_eye += other.behind_eye;
        self.culled += other.culled;
        self.fragments += other.fragments;
        self.written += other.written;
    }
}

/// Runs one draw object through transform, assembly, rasterization, shading and the sink.
pub fn draw_object<S: FragmentSink>(
    object: &DrawObject,
    sink: &mut S,
    width: u32,
    height: u32,
    options: &RasterOptions,
    noise: &NoiseSource,
) -> Result<DrawStats, RenderError> {
    let mut uniforms = object.uniforms;
    uniforms.model = object.transform;
    let options = RasterOptions { base_color: object.base_color, ..*options };

    // 1. Vertex shader.
    let transform = VertexTransform::new(&uniforms);
    let transformed_vertices: Vec<Vertex> = object
        .vertices
        .corners()
        .map(|corner| transform.apply(&corner))
        .collect();

    // 2. Primitive assembly.
    let triangles = primitive_assembly(&transformed_vertices)?;

    // 3. Rasterization, 4. fragment shader and depth resolve, fused per fragment.
    let mut stats = DrawStats { triangles: triangles.len(), ..Default::default() };
    for triangle in &triangles {
        let coverage = rasterize_triangle(triangle, width, height, &options, |fragment| {
            let shaded = object.shader.shade(fragment, noise);
            if sink.point(&shaded) {
                stats.written += 1;
            }
        });
        match coverage {
            Coverage::Drawn(count) => stats.fragments += count,
            Coverage::Degenerate => stats.degenerate += 1,
            Coverage::BehindEye => stats.behind_eye += 1,
            Coverage::Culled => stats.culled += 1,
        }
    }

    log::trace!("{}: {:?}", object.label, stats);
    return Ok(stats);
}

/// Everything a session of rendering owns: surfaces, noise, starfield scroll and workers.
pub struct RenderContext {
    config: RenderConfig,
    framebuffer: Framebuffer,
    noise: Arc<NoiseSource>,
    star_scroll: Vector2<f32>,
    frame_index: u64,
    pool: Option<ThreadPool>,
}

impl RenderContext {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        let noise = Arc::new(NoiseSource::new(config.noise_seed));
        return Self::with_noise(config, noise);
    }

    /// Context sharing an existing noise source.
    pub fn with_noise(config: RenderConfig, noise: Arc<NoiseSource>) -> Result<Self, RenderError> {
        if config.width == 0 || config.height == 0 {
            return Err(RenderError::EmptyFramebuffer { width: config.width, height: config.height });
        }
        let framebuffer = Framebuffer::new(config.width, config.height, config.background);
        let pool = if config.workers > 1 {
            log::debug!("rasterizing with {} worker threads", config.workers);
            Some(ThreadPool::new(config.workers))
        } else {
            None
        };
        return Ok(Self {
            config,
            framebuffer,
            noise,
            star_scroll: vector![STAR_SCROLL_ORIGIN.0, STAR_SCROLL_ORIGIN.1],
            frame_index: 0,
            pool,
        });
    }

    pub fn config(&self) -> &RenderConfig {
        return &self.config;
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        return &self.framebuffer;
    }

    pub fn frame_index(&self) -> u64 {
        return self.frame_index;
    }

    fn raster_options(&self) -> RasterOptions {
        return RasterOptions {
            cull_mode: self.config.cull_mode,
            perspective_correct: self.config.perspective_correct,
            light: self.config.light,
            base_color: WHITE,
        };
    }

    /// Starts a new frame: depth back to the sentinel, color to the background, then the starfield.
    pub fn clear(&mut self) {
        self.framebuffer.clear();
        self.star_scroll += vector![STAR_SCROLL_STEP, STAR_SCROLL_STEP];
        self.frame_index += 1;
        self.draw_starfield();
    }

    /// Stars go through the depth test but don't commit, so the depth buffer leaves `clear`
    /// untouched and any geometry covers them.
    fn draw_starfield(&mut self) {
        let (width, height) = (self.framebuffer.width() as f32, self.framebuffer.height() as f32);
        let (o_x, o_y) = (self.star_scroll.x, self.star_scroll.y);
        let stride = self.config.star_stride.max(1);
        for i in (0..self.config.star_count).step_by(stride) {
            let i = i as f32;
            let sample_x = self.noise.sample2(NoiseFamily::OpenSimplex2, i + o_x, o_y);
            let sample_y = self.noise.sample2(NoiseFamily::OpenSimplex2, i + o_y, o_x);
            let x = (sample_x * width).abs();
            let y = (sample_y * height).abs();
            let depth = 1.0 + (sample_x * STAR_DEPTH_RANGE).abs();
            let size = (sample_y.abs() * self.config.max_star_size).ceil().max(1.0) as i32;

            for d_y in 0..size {
                for d_x in 0..size {
                    let star = Fragment::point(x as i32 + d_x, y as i32 + d_y, depth, WHITE);
                    self.framebuffer.backdrop(&star);
                }
            }
        }
    }

    /// Draws the frame's scene snapshot. Visibility depends only on depth, never on order.
    /// An error aborts the rest of this frame, the context stays usable.
    pub fn render(&mut self, objects: &[DrawObject]) -> Result<DrawStats, RenderError> {
        let time_begin = time::Instant::now();
        let options = self.raster_options();
        let (width, height) = (self.framebuffer.width(), self.framebuffer.height());

        let stats = match &self.pool {
            Some(pool) if objects.len() > 1 && objects.len() <= parallel::MAX_OBJECTS => {
                parallel::render_objects(pool, &mut self.framebuffer, objects, &options, &self.noise)?
            }
            _ => {
                let mut stats = DrawStats::default();
                for object in objects {
                    stats.merge(draw_object(object, &mut self.framebuffer, width, height, &options, &self.noise)?);
                }
                stats
            }
        };

        log::debug!(
            "frame {}: {} objects, {} triangles ({} degenerate, {} behind eye, {} culled), {} of {} fragments written in {:.2?}",
            self.frame_index,
            objects.len(),
            stats.triangles,
            stats.degenerate,
            stats.behind_eye,
            stats.culled,
            stats.written,
            stats.fragments,
            time_begin.elapsed()
        );
        return Ok(stats);
    }

    /// Hands the finished color surface to the presentation side.
    pub fn present<P: Present>(&self, presenter: &mut P) -> Result<(), P::Error> {
        return presenter.present(&self.framebuffer.color);
    }
}
