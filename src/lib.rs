//! Tiled light culling for wgpu renderers.
//!
//! Each frame, lights are synced from a hecs scene into a [`light::LightModule`], frustum culled
//! per view, Z sorted and binned in batches of [`culling::CULLING_ITEM_BATCH`], and finally binned
//! per screen tile on the GPU.

pub mod culling;
pub mod light;
pub mod renderer;
pub mod sampling;
pub mod scene;
pub mod settings;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
