use clap::Parser;

use planet_renderer::app;
use planet_renderer::config::Args;
use planet_renderer::logging::{init_logging, LoggingConfig};

#[show_image::main]
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig { filter: args.log.clone() });

    app::run(args)?;

    return Ok(());
}
