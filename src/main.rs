use std::path::Path;

use anyhow::{Context, Result};

mod assets;
mod camera;
mod debounce;
mod environment;
mod light;
mod material;
mod math;
mod model;
mod primitives;
mod rendering;
mod scene_graph;
mod viewer;
mod window;

const ASSET_DIR: &str = "assets";

fn main() -> Result<()> {
    pretty_env_logger::init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;
    let assets = runtime.block_on(assets::load_all(Path::new(ASSET_DIR)))?;

    pollster::block_on(window::run(assets))?;

    Ok(())
}
