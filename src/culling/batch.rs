use glam::UVec2;

use super::{
    Cullable, CullingData, CullingRenderPass, CULLING_ITEM_BATCH, CULLING_TILE_SIZE,
    CULLING_ZBIN_COUNT,
};

/// Compact handle sorted in place of the source item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemHandle {
    /// Index inside the item source.
    pub source_index: u32,
    /// Signed Z distance along the camera Z axis.
    pub z_dist: f32,
    pub radius: f32,
}

/// Up to [`CULLING_ITEM_BATCH`] items, their Z bins and tile texture.
///
/// Use through [`super::CullingStructure`].
pub struct CullingBatch<T: Cullable, P: CullingRenderPass> {
    item_handles: Vec<ItemHandle>,
    /// Z ordered payloads.
    item_data: Vec<T::Data>,
    culling_data: Box<CullingData>,
    extent: UVec2,
    tile_res: UVec2,
    resources: Option<P::Resources>,
}

impl<T: Cullable, P: CullingRenderPass> Default for CullingBatch<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Cullable, P: CullingRenderPass> CullingBatch<T, P> {
    pub fn new() -> Self {
        Self {
            item_handles: Vec::with_capacity(CULLING_ITEM_BATCH),
            item_data: Vec::with_capacity(CULLING_ITEM_BATCH),
            culling_data: Box::default(),
            extent: UVec2::ONE,
            tile_res: UVec2::ONE,
            resources: None,
        }
    }

    /// Clears the batch for a new view of `extent` pixels.
    ///
    /// The tile texture follows the new grid at the next [`Self::finalize`].
    pub fn init(&mut self, extent: UVec2) {
        self.item_handles.clear();

        let extent = extent.max(UVec2::ONE);
        self.extent = extent;
        self.tile_res = UVec2::new(
            extent.x.div_ceil(CULLING_TILE_SIZE),
            extent.y.div_ceil(CULLING_TILE_SIZE),
        );

        self.culling_data.tile_size = CULLING_TILE_SIZE;
        self.culling_data.tile_to_uv_fac = [
            CULLING_TILE_SIZE as f32 / extent.x as f32,
            CULLING_TILE_SIZE as f32 / extent.y as f32,
        ];
    }

    pub fn insert(&mut self, index: u32, z_dist: f32, radius: f32) {
        debug_assert!(!self.is_full(), "culling batch overflow");
        self.item_handles.push(ItemHandle {
            source_index: index,
            z_dist,
            radius,
        });
    }

    pub fn is_full(&self) -> bool {
        self.item_handles.len() == CULLING_ITEM_BATCH
    }

    pub fn len(&self) -> usize {
        self.item_handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_handles.is_empty()
    }

    /// Sorts the items, builds the Z bins, uploads and runs the 2D culling pass.
    ///
    /// `near_z` and `far_z` are signed view-space depths.
    pub fn finalize(&mut self, culling_pass: &mut P, item_source: &[T], near_z: f32, far_z: f32) {
        let data = &mut *self.culling_data;
        data.zbin_scale = -(CULLING_ZBIN_COUNT as f32) / (far_z - near_z).abs();
        data.zbin_bias = -near_z * data.zbin_scale;

        // Farthest along the camera Z axis first.
        self.item_handles
            .sort_unstable_by(|a, b| b.z_dist.total_cmp(&a.z_dist));

        for bin in 0..CULLING_ZBIN_COUNT {
            data.set_zbin_range(bin, (CULLING_ITEM_BATCH - 1) as u16, 0);
        }

        self.item_data.clear();
        for (item_idx, handle) in self.item_handles.iter().enumerate() {
            self.item_data
                .push(item_source[handle.source_index as usize].gpu_data());

            let z_min = data.z_to_zbin(handle.z_dist + handle.radius).max(0);
            let z_max = data
                .z_to_zbin(handle.z_dist - handle.radius)
                .min(CULLING_ZBIN_COUNT as i32 - 1);

            let item_idx = item_idx as u16;
            for bin in z_min..=z_max {
                let bin = bin as usize;
                let (min, max) = data.zbin_range(bin);
                data.set_zbin_range(bin, min.min(item_idx), max.max(item_idx));
            }
        }
        data.items_count = self.item_handles.len() as u32;

        culling_pass.ensure_resources(&mut self.resources, self.tile_res);
        if let Some(resources) = self.resources.as_mut() {
            culling_pass.upload(
                resources,
                bytemuck::cast_slice(&self.item_data),
                &self.culling_data,
            );
            culling_pass.render(resources);
        } else {
            log::warn!("Culling pass provided no resources; skipping 2D culling");
        }
    }

    /// Handles in their current order. Z sorted after [`Self::finalize`].
    pub fn item_handles(&self) -> &[ItemHandle] {
        &self.item_handles
    }

    pub fn item_data(&self) -> &[T::Data] {
        &self.item_data
    }

    pub fn culling_data(&self) -> &CullingData {
        &self.culling_data
    }

    pub fn extent(&self) -> UVec2 {
        self.extent
    }

    pub fn tile_resolution(&self) -> UVec2 {
        self.tile_res
    }

    pub fn resources(&self) -> Option<&P::Resources> {
        self.resources.as_ref()
    }

    pub fn binding(&self) -> BatchBinding<'_, T::Data, P::Resources> {
        BatchBinding {
            item_data: &self.item_data,
            culling_data: &self.culling_data,
            resources: self.resources.as_ref(),
        }
    }
}

/// Everything the shading stage binds for one batch.
pub struct BatchBinding<'a, D, R> {
    pub item_data: &'a [D],
    pub culling_data: &'a CullingData,
    /// `None` until the batch was finalized once.
    pub resources: Option<&'a R>,
}
