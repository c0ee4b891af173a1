use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::noise::DEFAULT_SEED;
use crate::pipeline::rasterizer::{CullMode, Light};
use crate::util::{Color, BLACK};

/// Everything the rendering core needs to know about a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    /// Index range the starfield samples from.
    pub star_count: usize,
    /// Every `star_stride`-th index of the range becomes a star.
    pub star_stride: usize,
    pub max_star_size: f32,
    pub cull_mode: CullMode,
    pub perspective_correct: bool,
    pub light: Light,
    /// 0 and 1 both mean drawing on the calling thread.
    pub workers: usize,
    pub noise_seed: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        return Self {
            width: 1280,
            height: 720,
            background: BLACK,
            star_count: 2500,
            star_stride: 5,
            max_star_size: 2.0,
            cull_mode: CullMode::None,
            perspective_correct: false,
            light: Light::default(),
            workers: 0,
            noise_seed: DEFAULT_SEED,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CullArg {
    None,
    Back,
    Front,
}

impl From<CullArg> for CullMode {
    fn from(value: CullArg) -> Self {
        return match value {
            CullArg::None => CullMode::None,
            CullArg::Back => CullMode::Back,
            CullArg::Front => CullMode::Front,
        };
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "planet_renderer", about = "Software rasterized solar system")]
pub struct Args {
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Obj model used for every planet, a generated sphere when omitted.
    #[arg(long)]
    pub planet_mesh: Option<PathBuf>,

    /// Obj model of the ship, a generated dart when omitted.
    #[arg(long)]
    pub ship_mesh: Option<PathBuf>,

    /// Rasterizer threads. 0 or 1 draws on the main thread.
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    #[arg(long, value_enum, default_value_t = CullArg::None)]
    pub cull: CullArg,

    /// Interpolate attributes with 1/w weights.
    #[arg(long)]
    pub perspective_correct: bool,

    #[arg(long, default_value_t = 2500)]
    pub stars: usize,

    #[arg(long, default_value_t = 0.1)]
    pub ambient: f32,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: i32,

    /// Shader used for every body instead of its own, e.g. "noise" or "flat".
    #[arg(long)]
    pub shader: Option<String>,

    /// Frames to render without a window. Needs --output.
    #[arg(long, requires = "output")]
    pub frames: Option<u32>,

    /// Png file, the last headless frame is written to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Png file for the depth buffer of the last headless frame.
    #[arg(long)]
    pub depth_output: Option<PathBuf>,

    #[arg(long)]
    pub print_fps: bool,

    /// Log filter, e.g. "debug" or "planet_renderer=trace". Overrides RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    pub fn render_config(&self) -> RenderConfig {
        return RenderConfig {
            width: self.width,
            height: self.height,
            star_count: self.stars,
            cull_mode: self.cull.into(),
            perspective_correct: self.perspective_correct,
            light: Light { ambient: self.ambient.clamp(0.0, 1.0), ..Light::default() },
            workers: self.workers,
            noise_seed: self.seed,
            ..RenderConfig::default()
        };
    }

    /// Headless when a frame count is given.
    pub fn headless_frames(&self) -> Option<u32> {
        return self.frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_render_config() {
        let args = Args::parse_from(["planet_renderer"]);
        assert_eq!(args.render_config(), RenderConfig::default());
        assert_eq!(args.headless_frames(), None);
    }

    #[test]
    fn options_flow_into_render_config() {
        let args = Args::parse_from([
            "planet_renderer",
            "--width", "320",
            "--height", "200",
            "--cull", "back",
            "--workers", "4",
            "--ambient", "0.3",
            "--perspective-correct",
            "--shader", "noise",
            "--frames", "3",
            "--output", "out.png",
        ]);
        let config = args.render_config();
        assert_eq!((config.width, config.height), (320, 200));
        assert_eq!(config.cull_mode, CullMode::Back);
        assert_eq!(config.workers, 4);
        assert!(config.perspective_correct);
        assert_eq!(config.light.ambient, 0.3);
        assert_eq!(args.headless_frames(), Some(3));
        assert_eq!(args.shader.as_deref(), Some("noise"));
    }

    #[test]
    fn frames_need_an_output() {
        assert!(Args::try_parse_from(["planet_renderer", "--frames", "2"]).is_err());
    }
}
