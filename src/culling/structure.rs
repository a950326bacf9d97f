use std::ops::Range;

use glam::UVec2;

use super::{BoundSphere, Cullable, CullingBatch, CullingRenderPass, CullingView};

/// Frustum culling and Z sorting of items over one or more [`CullingBatch`].
///
/// Batches are kept across frames and reinitialized by [`Self::set_view`], never freed until the
/// structure is dropped.
pub struct CullingStructure<T: Cullable, P: CullingRenderPass> {
    batches: Vec<CullingBatch<T, P>>,
    /// Number of batches holding items for the current view. Allocated count may be higher.
    used_batch_count: usize,
    /// Whether items can overflow into more than one batch.
    extendable: bool,
    view: Option<CullingView>,
    extent: UVec2,
}

impl<T: Cullable, P: CullingRenderPass> CullingStructure<T, P> {
    /// A structure limited to a single batch.
    pub fn new() -> Self {
        Self::with_extendable(false)
    }

    /// A structure that opens a new batch each time the active one is full.
    pub fn extendable() -> Self {
        Self::with_extendable(true)
    }

    pub fn with_extendable(extendable: bool) -> Self {
        Self {
            batches: Vec::new(),
            used_batch_count: 0,
            extendable,
            view: None,
            extent: UVec2::ONE,
        }
    }

    pub fn set_view(&mut self, view: &CullingView, extent: UVec2) {
        self.view = Some(*view);
        self.extent = extent;

        if self.batches.is_empty() {
            self.batches.push(CullingBatch::new());
        }

        self.used_batch_count = 1;
        self.batches[0].init(extent);
    }

    /// Returns `false` if the sphere is outside the view frustum and was not inserted.
    /// Otherwise returns whether the active batch became full.
    ///
    /// # Panics
    ///
    /// Panics when called before [`Self::set_view`], or when a non extendable structure
    /// overflows its batch.
    pub fn insert(&mut self, index: u32, bsphere: &BoundSphere) -> bool {
        let view = self
            .view
            .as_ref()
            .expect("CullingStructure::insert called before set_view");

        if !view.sphere_test(bsphere) {
            return false;
        }

        let z_dist = view.z_distance(bsphere.center);

        if self.batches[self.used_batch_count - 1].is_full() {
            assert!(
                self.extendable,
                "culling batch overflow in a non extendable structure"
            );
            if self.batches.len() < self.used_batch_count + 1 {
                self.batches.push(CullingBatch::new());
                log::debug!("Culling batch pool grown to {}", self.batches.len());
            }
            self.batches[self.used_batch_count].init(self.extent);
            self.used_batch_count += 1;
        }

        let active = &mut self.batches[self.used_batch_count - 1];
        active.insert(index, z_dist, bsphere.radius);
        active.is_full()
    }

    /// Finalizes every used batch against the view depth range.
    pub fn finalize(&mut self, culling_pass: &mut P, item_source: &[T]) {
        let Some(view) = self.view else {
            return;
        };

        culling_pass.set_view(&view);

        let near_z = view.near_z();
        let far_z = view.far_z();
        for batch in &mut self.batches[..self.used_batch_count] {
            batch.finalize(culling_pass, item_source, near_z, far_z);
        }
    }

    /// Ids of the batches in use for the current view.
    pub fn index_range(&self) -> Range<usize> {
        0..self.used_batch_count
    }

    pub fn batch(&self, index: usize) -> &CullingBatch<T, P> {
        &self.batches[index]
    }

    /// Allocated batches, including the ones unused by the current view.
    pub fn allocated_batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Items inserted for the current view, over all batches.
    pub fn item_count(&self) -> usize {
        self.batches[..self.used_batch_count]
            .iter()
            .map(CullingBatch::len)
            .sum()
    }
}

impl<T: Cullable, P: CullingRenderPass> Default for CullingStructure<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::{CullingData, CULLING_ITEM_BATCH};
    use glam::{Mat4, Vec3};

    struct Dot(Vec3);

    impl Cullable for Dot {
        type Data = [f32; 4];

        fn gpu_data(&self) -> [f32; 4] {
            self.0.extend(1.0).to_array()
        }

        fn position(&self) -> Vec3 {
            self.0
        }

        fn bounding_radius(&self) -> f32 {
            0.5
        }
    }

    #[derive(Default)]
    struct NullPass {
        views: usize,
        renders: usize,
    }

    impl CullingRenderPass for NullPass {
        type Resources = ();

        fn set_view(&mut self, _: &CullingView) {
            self.views += 1;
        }

        fn ensure_resources(&mut self, slot: &mut Option<()>, _: UVec2) {
            *slot = Some(());
        }

        fn upload(&mut self, _: &mut (), _: &[u8], _: &CullingData) {}

        fn render(&mut self, _: &()) {
            self.renders += 1;
        }
    }

    fn view() -> CullingView {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        CullingView::new(view, projection, 0.1, 100.0)
    }

    fn fill(structure: &mut CullingStructure<Dot, NullPass>, items: &[Dot]) {
        for (index, item) in items.iter().enumerate() {
            let sphere = BoundSphere::new(item.position(), item.bounding_radius());
            structure.insert(index as u32, &sphere);
        }
    }

    fn row_of_dots(count: usize) -> Vec<Dot> {
        (0..count)
            .map(|i| Dot(Vec3::new(0.0, 0.0, -(i as f32) * 0.3)))
            .collect()
    }

    #[test]
    fn set_view_resets_to_one_batch() {
        let items = row_of_dots(CULLING_ITEM_BATCH + 1);
        let mut structure = CullingStructure::<Dot, NullPass>::extendable();
        structure.set_view(&view(), UVec2::new(640, 480));
        fill(&mut structure, &items);
        assert_eq!(structure.index_range(), 0..2);

        structure.set_view(&view(), UVec2::new(640, 480));
        assert_eq!(structure.index_range(), 0..1);
        assert_eq!(structure.item_count(), 0);
        assert_eq!(structure.allocated_batch_count(), 2);
    }

    #[test]
    fn culled_sphere_is_not_inserted() {
        let mut structure = CullingStructure::<Dot, NullPass>::new();
        structure.set_view(&view(), UVec2::new(640, 480));
        let behind = BoundSphere::new(Vec3::new(0.0, 0.0, 30.0), 1.0);
        assert!(!structure.insert(0, &behind));
        assert_eq!(structure.item_count(), 0);
    }

    #[test]
    fn insert_reports_full_batch() {
        let items = row_of_dots(CULLING_ITEM_BATCH);
        let mut structure = CullingStructure::<Dot, NullPass>::new();
        structure.set_view(&view(), UVec2::new(640, 480));

        let mut last = false;
        for (index, item) in items.iter().enumerate() {
            last = structure.insert(index as u32, &BoundSphere::new(item.0, 0.5));
        }
        assert!(last);
        assert_eq!(structure.item_count(), CULLING_ITEM_BATCH);
    }

    #[test]
    #[should_panic(expected = "non extendable")]
    fn overflow_panics_when_not_extendable() {
        let items = row_of_dots(CULLING_ITEM_BATCH + 1);
        let mut structure = CullingStructure::<Dot, NullPass>::new();
        structure.set_view(&view(), UVec2::new(640, 480));
        fill(&mut structure, &items);
    }

    #[test]
    fn finalize_runs_every_used_batch() {
        let items = row_of_dots(CULLING_ITEM_BATCH * 2 + 3);
        let mut pass = NullPass::default();
        let mut structure = CullingStructure::<Dot, NullPass>::extendable();
        structure.set_view(&view(), UVec2::new(640, 480));
        fill(&mut structure, &items);
        structure.finalize(&mut pass, &items);

        assert_eq!(structure.index_range(), 0..3);
        assert_eq!(pass.views, 1);
        assert_eq!(pass.renders, 3);
        assert_eq!(structure.batch(2).len(), 3);
        assert_eq!(structure.batch(2).item_data().len(), 3);
    }
}
