//! Teapot demo application
//!
//! Loads the teapot scene, then drives the engine headlessly: a short script
//! of key presses orbits and zooms the camera while frames are rendered into
//! the recording backend. Frame statistics are logged at the end.

use std::path::{Path, PathBuf};

use lumen_engine::foundation::logging;
use lumen_engine::prelude::*;
use thiserror::Error;

/// Frames rendered when the configuration sets no limit
const DEFAULT_FRAMES: u64 = 120;

/// Scripted input: on frame `n`, press and release `key` `repeat` times
const SCRIPT: &[(u64, KeyCode, u32)] = &[
    (10, KeyCode::A, 16),
    (40, KeyCode::W, 8),
    (70, KeyCode::D, 32),
    (100, KeyCode::S, 20),
];

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] lumen_engine::config::ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

struct TeapotApp {
    backend: HeadlessBackend,
    engine: Engine,
    frames: u64,
}

impl TeapotApp {
    fn new(config: &ApplicationConfig) -> Result<Self, DemoError> {
        log::info!("Creating teapot demo application...");
        let mut backend = HeadlessBackend::new();
        let engine = Engine::load(&mut backend, config)?;

        Ok(Self {
            backend,
            engine,
            frames: config.engine.max_frames.unwrap_or(DEFAULT_FRAMES),
        })
    }

    fn run(&mut self) -> Result<(), DemoError> {
        for frame in 0..self.frames {
            for &(_, key, repeat) in SCRIPT.iter().filter(|(at, ..)| *at == frame) {
                for _ in 0..repeat {
                    self.engine.handle_key_input(key, true);
                }
                self.engine.handle_key_input(key, false);
            }

            if !self.engine.is_running() {
                break;
            }
            self.engine.frame(&mut self.backend)?;

            if frame % 30 == 0 {
                let camera = self.engine.input().camera();
                log::debug!(
                    "Frame {frame}: rotation {:.3} rad, zoom {:.2}",
                    camera.rotation(),
                    camera.zoom()
                );
            }
        }

        let timer = self.engine.timer();
        log::info!(
            "Rendered {} frames, {} draw calls recorded, average frame time {:?} ({:.0} fps)",
            timer.frame_count(),
            self.backend.draw_calls().count(),
            timer.average_frame_time(),
            timer.average_fps()
        );
        Ok(())
    }
}

/// Make relative asset paths relative to the crate directory, so the demo
/// runs from any working directory
fn resolve_assets(config: &mut ApplicationConfig, root: &Path) {
    if config.assets.assets_dir.is_relative() {
        config.assets.assets_dir = root.join(&config.assets.assets_dir);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut config = ApplicationConfig::load_or_default(root.join("config.toml"))?;
    resolve_assets(&mut config, &root);

    logging::init(&config.engine.log_level);
    log::info!("Starting teapot demo");

    let mut app = TeapotApp::new(&config)?;
    log::info!("Running application...");
    app.run()?;

    log::info!("Teapot demo finished successfully");
    Ok(())
}
