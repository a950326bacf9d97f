//! Tiled light culling with Z binning.
//!
//! Items are Z sorted per batch of [`CULLING_ITEM_BATCH`] entries. Each batch produces a 1D Z-bin
//! index (min/max sorted item per depth slice) and a 2D tile texture written by a
//! [`CullingRenderPass`]. Shading queries the bin for the pixel depth, then masks the result with
//! the tile bits.

mod batch;
mod structure;
mod view;

pub use batch::{BatchBinding, CullingBatch, ItemHandle};
pub use structure::CullingStructure;
pub use view::{BoundSphere, CullingView};

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec3};

/// Maximum number of items in one batch. Matches the 128 bits of an `Rgba32Uint` tile texel.
pub const CULLING_ITEM_BATCH: usize = 128;
/// Number of depth slices between the near and far planes.
pub const CULLING_ZBIN_COUNT: usize = 4096;
/// Edge length of a screen tile in pixels.
pub const CULLING_TILE_SIZE: u32 = 8;

/// Something that can be inserted in a culling batch.
pub trait Cullable {
    type Data: Pod;

    /// Payload copied into the batch data buffer, in Z sorted order.
    fn gpu_data(&self) -> Self::Data;
    fn position(&self) -> Vec3;
    fn bounding_radius(&self) -> f32;
}

/// 2D culling stage run once per finalized batch.
///
/// `Resources` is whatever per-batch storage the pass needs (GPU buffers, tile texture). The batch
/// owns it and reuses it across frames.
pub trait CullingRenderPass {
    type Resources;

    /// Called once per view before any batch of that view is finalized.
    fn set_view(&mut self, _view: &CullingView) {}

    /// Creates the batch resources on first use, or resizes them when the tile grid changed.
    fn ensure_resources(&mut self, slot: &mut Option<Self::Resources>, tiles: UVec2);

    fn upload(
        &mut self,
        resources: &mut Self::Resources,
        item_data: &[u8],
        culling_data: &CullingData,
    );

    /// Bins the uploaded items into the tile texture.
    fn render(&mut self, resources: &Self::Resources);
}

/// Culling metadata shared with the shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CullingData {
    pub zbin_scale: f32,
    pub zbin_bias: f32,
    pub tile_size: u32,
    pub items_count: u32,
    /// Converts tile coordinates into screen UVs.
    pub tile_to_uv_fac: [f32; 2],
    pub _padding: [f32; 2],
    /// Low 16 bits: first sorted item of the bin. High 16 bits: last sorted item.
    pub zbins: [u32; CULLING_ZBIN_COUNT],
}

impl Default for CullingData {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl CullingData {
    /// Maps a signed view-space Z to a bin index. Not clamped.
    pub fn z_to_zbin(&self, z: f32) -> i32 {
        (z * self.zbin_scale + self.zbin_bias) as i32
    }

    pub fn zbin_range(&self, bin: usize) -> (u16, u16) {
        let packed = self.zbins[bin];
        ((packed & 0xFFFF) as u16, (packed >> 16) as u16)
    }

    pub fn set_zbin_range(&mut self, bin: usize, min: u16, max: u16) {
        self.zbins[bin] = u32::from(min) | (u32::from(max) << 16);
    }

    /// True when no item overlaps the bin.
    pub fn zbin_is_empty(&self, bin: usize) -> bool {
        let (min, max) = self.zbin_range(bin);
        min > max
    }
}
