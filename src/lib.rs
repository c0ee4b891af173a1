//! Software rasterizer of an animated solar system.
//!
//! `pipeline` holds the rendering core (transform, assembly, rasterization, shading and
//! depth resolve), `scene` the per-frame draw list, `app` the window and headless drivers.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod noise;
pub mod pipeline;
pub mod present;
pub mod scene;
pub mod util;
