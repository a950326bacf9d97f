mod context;
mod culling_pass;

pub use context::{GpuContext, GpuContextError};
pub use culling_pass::{BatchResources, TileBinningPass, TILE_FORMAT};
