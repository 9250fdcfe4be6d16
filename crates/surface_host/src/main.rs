//! Surface host demo binary: one window running the demo engine.

use anyhow::{Context as _, Result};
use winit::event_loop::EventLoop;

use surface_host::args::parse_args;
use surface_host::demo::DemoEngine;
use surface_host::logging;
use surface_host::settings::HostSettings;
use surface_host::window::HostApp;
use surface_host::HostContext;

pub const HOST_NAME: &str = env!("CARGO_PKG_NAME");
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let args = parse_args();

    let settings_path = args.config.clone().or_else(HostSettings::default_path);
    let settings = match &settings_path {
        Some(path) => HostSettings::load(path),
        None => HostSettings::default(),
    };

    let verbose = args.verbose || settings.logging.verbose;
    let _log_guard = logging::init(verbose, &settings.logging.filter)
        .context("Failed to initialize logging")?;

    tracing::info!("{} {}", HOST_NAME, HOST_VERSION);
    match &settings_path {
        Some(path) => tracing::info!("Settings: {}", path.display()),
        None => tracing::warn!("No config directory available, using default settings"),
    }

    let context = HostContext::new();
    context.clone().set_global();

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = HostApp::new(settings, context, Box::new(|| Box::new(DemoEngine::new())));
    event_loop.run_app(&mut app).context("Event loop terminated with an error")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}
