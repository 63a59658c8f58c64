//! Environment-map viewer
//!
//! Usage: `envmap_viewer [ldr | hdr | <config.ron | config.toml>]`
//!
//! Without an argument `config/ldr.ron` is used when present, otherwise the
//! built-in LDR profile.

use std::path::Path;

use envmap_engine::foundation::logging;
use envmap_engine::prelude::*;

const DEFAULT_CONFIG: &str = "config/ldr.ron";

fn load_config(arg: Option<&str>) -> Result<ViewerConfig, ConfigError> {
    match arg {
        None => ViewerConfig::load_or_default(Path::new(DEFAULT_CONFIG)),
        Some(name) => {
            if let Some(config) = ViewerConfig::profile(name) {
                return Ok(config);
            }
            let config = ViewerConfig::load_from_file(name)?;
            config.validate()?;
            Ok(config)
        }
    }
}

fn run(config: ViewerConfig) -> Result<u64, ViewerError> {
    let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
    let target_fps = config.target_fps;

    let mut viewer = SceneViewer::new(config, Box::new(HeadlessBackend::default()))?;
    let (width, height) = window.size();
    viewer.resize(width, height, window.content_scale());

    let mut frame_loop = FrameLoop::with_token(target_fps, viewer.cancellation_token());
    let mut title = String::new();

    frame_loop.run(|context| {
        for event in window.poll_events() {
            if viewer.handle_event(&event) == FrameControl::Stop {
                window.set_should_close(true);
            }
        }
        if window.should_close() {
            return Ok(FrameControl::Stop);
        }

        let control = viewer.tick(context)?;

        let next_title = viewer.title();
        if next_title != title {
            window.set_title(&next_title);
            title = next_title;
        }
        Ok(control)
    })
}

fn main() -> Result<(), ViewerError> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC occurred: {panic_info}");
    }));

    let arg = std::env::args().nth(1);
    let config = load_config(arg.as_deref())?;
    logging::init(&config.log_level);
    log::info!("Starting environment-map viewer");

    match run(config) {
        Ok(frames) => {
            log::info!("Viewer closed after {} frames", frames);
            Ok(())
        }
        Err(e) => {
            log::error!("Viewer error: {}", e);
            Err(e)
        }
    }
}
