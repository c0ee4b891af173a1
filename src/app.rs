use std::sync::Arc;
use std::thread;
use std::time;

use anyhow::Context as _;
use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions, WindowProxy};

use crate::config::Args;
use crate::pipeline::buffer::ColorSurface;
use crate::pipeline::shader::ShaderKind;
use crate::pipeline::RenderContext;
use crate::present::{save_depth, PngWriter, Present};
use crate::scene::camera::Camera;
use crate::scene::mesh::{dart, load_obj, uv_sphere, VertexBuffer};
use crate::scene::solar::SolarSystem;

/// Frame pacing of the window loop.
const FRAME_TIME: time::Duration = time::Duration::from_millis(1000 / 60);
const SPHERE_STACKS: usize = 24;
const SPHERE_SLICES: usize = 32;

/// What a key press asks the driver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ZoomIn,
    ZoomOut,
    MoveLeft,
    MoveRight,
    SlowDown,
    SpeedUp,
    ToggleOrbiting,
    Quit,
}

impl Command {
    pub fn from_key(key: event::VirtualKeyCode) -> Option<Command> {
        return match key {
            event::VirtualKeyCode::W => Some(Command::ZoomIn),
            event::VirtualKeyCode::S => Some(Command::ZoomOut),
            event::VirtualKeyCode::A => Some(Command::MoveLeft),
            event::VirtualKeyCode::D => Some(Command::MoveRight),
            event::VirtualKeyCode::Left => Some(Command::SlowDown),
            event::VirtualKeyCode::Right => Some(Command::SpeedUp),
            event::VirtualKeyCode::P => Some(Command::ToggleOrbiting),
            event::VirtualKeyCode::Escape => Some(Command::Quit),
            _ => None,
        };
    }

    /// The ship shows its engines while the camera backs off or strafes right.
    fn moves_ship(self) -> bool {
        return matches!(self, Command::ZoomOut | Command::MoveRight);
    }
}

/// Interactive state, that outlives a single frame.
pub struct Controls {
    pub camera: Camera,
    pub system: SolarSystem,
    pub running: bool,
}

impl Default for Controls {
    fn default() -> Self {
        return Self::new(SolarSystem::default());
    }
}

impl Controls {
    pub fn new(system: SolarSystem) -> Self {
        return Self {
            camera: Camera::default(),
            system,
            running: true,
        };
    }


    /// Applies a key transition. Actions happen on press, the ship flag follows press and release.
    pub fn apply(&mut self, command: Command, pressed: bool) {
        if command.moves_ship() {
            self.system.set_ship_moving(pressed);
        }
        if !pressed {
            return;
        }
        match command {
            Command::ZoomIn => self.camera.zoom_in(),
            Command::ZoomOut => self.camera.zoom_out(),
            Command::MoveLeft => self.camera.move_left(),
            Command::MoveRight => self.camera.move_right(),
            Command::SlowDown => self.system.slow_down(),
            Command::SpeedUp => self.system.speed_up(),
            Command::ToggleOrbiting => self.system.toggle_orbiting(),
            Command::Quit => self.running = false,
        }
    }
}

/// Presents frames into a show-image window.
struct WindowPresenter {
    window: WindowProxy,
}

impl Present for WindowPresenter {
    type Error = show_image::error::SetImageError;

    fn present(&mut self, surface: &ColorSurface) -> Result<(), Self::Error> {
        let image = ImageView::new(ImageInfo::rgb8(surface.width, surface.height), surface.as_render_data());
        return self.window.set_image("frame", image);
    }
}

fn load_mesh(path: Option<&std::path::Path>, fallback: fn() -> VertexBuffer) -> anyhow::Result<Arc<VertexBuffer>> {
    let mesh = match path {
        Some(path) => load_obj(path).with_context(|| format!("loading mesh {}", path.display()))?,
        None => fallback(),
    };
    return Ok(Arc::new(mesh));
}

/// Launches either the window loop or, when a frame count is given, headless rendering.
pub fn run(args: Args) -> anyhow::Result<()> {
    let config = args.render_config();
    log::info!(
        "{}x{}, workers: {}, cull: {:?}, perspective correct: {}",
        config.width,
        config.height,
        config.workers,
        config.cull_mode,
        config.perspective_correct
    );
    let mut context = RenderContext::new(config)?;
    let planet_mesh = load_mesh(args.planet_mesh.as_deref(), || uv_sphere(SPHERE_STACKS, SPHERE_SLICES))?;
    let ship_mesh = load_mesh(args.ship_mesh.as_deref(), dart)?;
    log::info!("planet mesh: {} vertices, ship mesh: {} vertices", planet_mesh.len(), ship_mesh.len());

    let mut system = SolarSystem::default();
    if let Some(name) = &args.shader {
        system.set_body_shader(ShaderKind::from_name(name));
    }

    if let Some(frames) = args.headless_frames() {
        return run_headless(&args, &mut context, system, frames, &planet_mesh, &ship_mesh);
    }
    return run_window(&args, &mut context, system, &planet_mesh, &ship_mesh);
}

fn run_headless(
    args: &Args,
    context: &mut RenderContext,
    mut system: SolarSystem,
    frames: u32,
    planet_mesh: &Arc<VertexBuffer>,
    ship_mesh: &Arc<VertexBuffer>,
) -> anyhow::Result<()> {
    let Some(output) = &args.output else {
        anyhow::bail!("headless rendering needs --output");
    };
    let camera = Camera::default();
    let (width, height) = (context.config().width, context.config().height);

    let time_begin = time::Instant::now();
    for _ in 0..frames.max(1) {
        system.step();
        context.clear();
        context.render(&system.snapshot(&camera, width, height, planet_mesh, ship_mesh))?;
    }
    log::info!("rendered {} frames in {:.2?}", frames.max(1), time_begin.elapsed());

    let mut writer = PngWriter::new(output);
    context
        .present(&mut writer)
        .with_context(|| format!("writing {}", output.display()))?;
    log::info!("frame written to {}", output.display());

    if let Some(depth_output) = &args.depth_output {
        save_depth(depth_output, &context.framebuffer().depth)
            .with_context(|| format!("writing {}", depth_output.display()))?;
        log::info!("depth written to {}", depth_output.display());
    }
    return Ok(());
}

fn run_window(
    args: &Args,
    context: &mut RenderContext,
    system: SolarSystem,
    planet_mesh: &Arc<VertexBuffer>,
    ship_mesh: &Arc<VertexBuffer>,
) -> anyhow::Result<()> {
    let (width, height) = (context.config().width, context.config().height);
    let window_options = WindowOptions {
        size: Some([width, height]),
        ..Default::default()
    };
    let window = create_window("planet_renderer", window_options)?;
    let event_channel = window.event_channel()?;
    let mut presenter = WindowPresenter { window };
    let mut controls = Controls::new(system);

    let mut frame_counter_time_begin = time::Instant::now();
    let mut frame_counter: u32 = 0;
    while controls.running {
        let frame_begin = time::Instant::now();
        controls.system.step();
        context.clear();
        let objects = controls.system.snapshot(&controls.camera, width, height, planet_mesh, ship_mesh);
        // A broken frame is dropped, the next one starts from a clean clear.
        if let Err(error) = context.render(&objects) {
            log::warn!("frame {} aborted: {}", context.frame_index(), error);
        }
        context.present(&mut presenter)?;

        // Unloading everything, that has piled up in the event channel since the last frame.
        for window_event in event_channel.try_iter() {
            match window_event {
                event::WindowEvent::KeyboardInput(event) => {
                    let Some(command) = event.input.key_code.and_then(Command::from_key) else {
                        continue;
                    };
                    controls.apply(command, event.input.state.is_pressed());
                }
                event::WindowEvent::CloseRequested(_) => {
                    controls.running = false;
                }
                _ => (),
            }
        }

        if args.print_fps {
            // Counting frames to print out stats every second.
            frame_counter += 1;
            if frame_counter_time_begin.elapsed().as_secs_f32() > 1.0 {
                log::info!("FPS --- {}", frame_counter);
                frame_counter_time_begin = time::Instant::now();
                frame_counter = 0;
            }
        }

        if let Some(remaining) = FRAME_TIME.checked_sub(frame_begin.elapsed()) {
            thread::sleep(remaining);
        }
    }

    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key(event::VirtualKeyCode::W), Some(Command::ZoomIn));
        assert_eq!(Command::from_key(event::VirtualKeyCode::P), Some(Command::ToggleOrbiting));
        assert_eq!(Command::from_key(event::VirtualKeyCode::Q), None);
    }

    #[test]
    fn ship_moves_while_key_is_held() {
        let mut controls = Controls::default();
        controls.apply(Command::MoveRight, true);
        assert!(controls.system.ship.moving);
        assert_ne!(controls.camera, Camera::default());
        controls.apply(Command::MoveRight, false);
        assert!(!controls.system.ship.moving);

        controls.apply(Command::ZoomIn, true);
        assert!(!controls.system.ship.moving);
    }

    #[test]
    fn speed_orbit_and_quit() {
        let mut controls = Controls::default();
        controls.apply(Command::SpeedUp, true);
        assert_eq!(controls.system.rotation_speed, 1.5);
        controls.apply(Command::ToggleOrbiting, true);
        controls.apply(Command::ToggleOrbiting, false);
        assert!(!controls.system.orbiting);
        controls.apply(Command::Quit, true);
        assert!(!controls.running);
    }
}
