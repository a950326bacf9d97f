use std::collections::HashSet;

use glam::{Mat4, UVec2, Vec3};
use light_culling::culling::{
    BoundSphere, Cullable, CullingData, CullingRenderPass, CullingStructure, CullingView,
    CULLING_ITEM_BATCH, CULLING_ZBIN_COUNT,
};
use light_culling::light::{
    attenuation_radius, Attenuation, Light, LightModule, LightSource, NoShadows, ObjectKey,
};
use light_culling::sampling::Sampling;
use light_culling::settings::LightSettings;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const THRESHOLD: f32 = 0.01;

struct NullPass;

impl CullingRenderPass for NullPass {
    type Resources = ();

    fn ensure_resources(&mut self, slot: &mut Option<()>, _: UVec2) {
        *slot = Some(());
    }

    fn upload(&mut self, _: &mut (), _: &[u8], _: &CullingData) {}

    fn render(&mut self, _: &()) {}
}

fn camera_view() -> CullingView {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
    CullingView::new(view, projection, 0.1, 100.0)
}

fn bin_span(data: &CullingData, z: f32, radius: f32) -> (usize, usize) {
    let first = data.z_to_zbin(z + radius).max(0);
    let last = data.z_to_zbin(z - radius).min(CULLING_ZBIN_COUNT as i32 - 1);
    (first as usize, last as usize)
}

fn random_module(rng: &mut SmallRng, count: usize) -> LightModule<NullPass> {
    let settings = LightSettings::default();
    let mut module = LightModule::new(NullPass, &settings);
    module.begin_sync(&settings);
    for key in 0..count {
        let source = LightSource::point(Vec3::ONE, rng.gen_range(0.1..50.0), 0.1);
        let position = Vec3::new(
            rng.gen_range(-8.0..8.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-80.0..5.0),
        );
        module.sync_light(
            ObjectKey(key as u64),
            &source,
            Mat4::from_translation(position),
            &mut NoShadows,
        );
    }
    module.end_sync(&mut Sampling::new());
    module.set_view(&camera_view(), UVec2::new(1280, 720));
    module
}

fn assert_batches_sorted_and_binned(module: &LightModule<NullPass>) {
    for id in module.batch_range() {
        let batch = module.culling().batch(id);
        let data = batch.culling_data();
        let handles = batch.item_handles();
        assert_eq!(data.items_count as usize, handles.len());

        for pair in handles.windows(2) {
            assert!(pair[0].z_dist >= pair[1].z_dist, "batch {id} not Z sorted");
        }

        let mut touched = HashSet::new();
        for (index, handle) in handles.iter().enumerate() {
            let (first, last) = bin_span(data, handle.z_dist, handle.radius);
            for bin in first..=last {
                let (min, max) = data.zbin_range(bin);
                assert!(
                    min as usize <= index && index <= max as usize,
                    "item {index} outside bin {bin} range {min}..={max}"
                );
                touched.insert(bin);
            }
        }
        for bin in 0..CULLING_ZBIN_COUNT {
            if !touched.contains(&bin) {
                assert!(data.zbin_is_empty(bin), "untouched bin {bin} is not empty");
            }
        }
    }
}

#[test]
fn attenuation_radius_is_monotonic_in_power() {
    let mut rng = SmallRng::seed_from_u64(0x5EED_CAFE);
    let source = LightSource::default();
    for _ in 0..1000 {
        let low = rng.gen_range(0.0..1000.0f32);
        let high = low + rng.gen_range(0.0..1000.0f32);
        assert!(
            attenuation_radius(&source, THRESHOLD, low)
                <= attenuation_radius(&source, THRESHOLD, high)
        );
    }
}

#[test]
fn doubling_energy_never_shrinks_influence() {
    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..200 {
        let energy = rng.gen_range(0.0..5000.0f32);
        let single = LightSource::point(Vec3::ONE, energy, 0.1);
        let double = LightSource::point(Vec3::ONE, energy * 2.0, 0.1);
        let single = Light::new(&single, Mat4::IDENTITY, ObjectKey(0), THRESHOLD, &mut NoShadows);
        let double = Light::new(&double, Mat4::IDENTITY, ObjectKey(0), THRESHOLD, &mut NoShadows);
        assert!(single.influence_radius_max <= double.influence_radius_max);
    }
}

#[test]
fn sun_radius_is_infinite_or_zero() {
    let lit = LightSource::sun(Vec3::ONE, 1.0, 0.01);
    let lit = Light::new(&lit, Mat4::IDENTITY, ObjectKey(0), THRESHOLD, &mut NoShadows);
    assert!(lit.influence_radius_max >= 1e15);

    let dark = LightSource::sun(Vec3::ONE, 0.0, 0.01);
    let dark = Light::new(&dark, Mat4::IDENTITY, ObjectKey(0), THRESHOLD, &mut NoShadows);
    assert_eq!(dark.influence_radius_max, 0.0);
}

#[test]
fn random_scenes_are_sorted_and_binned() {
    let mut rng = SmallRng::seed_from_u64(42);
    for count in [1, 17, CULLING_ITEM_BATCH, 300] {
        let module = random_module(&mut rng, count);
        assert!(module.culling().item_count() > 0);
        assert_batches_sorted_and_binned(&module);
    }
}

struct Marker(Vec3);

impl Cullable for Marker {
    type Data = [f32; 4];

    fn gpu_data(&self) -> [f32; 4] {
        self.0.extend(0.0).to_array()
    }

    fn position(&self) -> Vec3 {
        self.0
    }

    fn bounding_radius(&self) -> f32 {
        0.25
    }
}

#[test]
fn spheres_outside_frustum_are_rejected() {
    let mut structure = CullingStructure::<Marker, NullPass>::new();
    structure.set_view(&camera_view(), UVec2::new(1280, 720));

    let outside = [
        BoundSphere::new(Vec3::new(0.0, 0.0, 12.0), 1.0),
        BoundSphere::new(Vec3::new(0.0, 0.0, -200.0), 5.0),
        BoundSphere::new(Vec3::new(500.0, 0.0, 0.0), 10.0),
        BoundSphere::new(Vec3::new(0.0, -300.0, -20.0), 1.0),
    ];
    for (index, sphere) in outside.iter().enumerate() {
        assert!(!structure.insert(index as u32, sphere));
    }
    assert_eq!(structure.item_count(), 0);

    // Center outside, radius reaching in.
    structure.insert(9, &BoundSphere::new(Vec3::new(0.0, 0.0, 12.0), 3.0));
    assert_eq!(structure.item_count(), 1);
}

fn markers(count: usize) -> Vec<Marker> {
    (0..count)
        .map(|i| Marker(Vec3::new(0.0, 0.0, -(i as f32) * 0.5)))
        .collect()
}

fn insert_all(structure: &mut CullingStructure<Marker, NullPass>, items: &[Marker]) {
    for (index, item) in items.iter().enumerate() {
        let sphere = BoundSphere::new(item.position(), item.bounding_radius());
        structure.insert(index as u32, &sphere);
    }
}

#[test]
fn overflow_extends_into_second_batch() {
    let items = markers(CULLING_ITEM_BATCH + 1);
    let mut structure = CullingStructure::<Marker, NullPass>::extendable();
    structure.set_view(&camera_view(), UVec2::new(1280, 720));
    insert_all(&mut structure, &items);
    structure.finalize(&mut NullPass, &items);

    assert_eq!(structure.index_range(), 0..2);
    assert_eq!(structure.batch(0).len(), CULLING_ITEM_BATCH);
    assert_eq!(structure.batch(1).len(), 1);

    for id in structure.index_range() {
        let batch = structure.batch(id);
        let data = batch.culling_data();
        for pair in batch.item_handles().windows(2) {
            assert!(pair[0].z_dist >= pair[1].z_dist);
        }
        for (index, handle) in batch.item_handles().iter().enumerate() {
            let (first, last) = bin_span(data, handle.z_dist, handle.radius);
            for bin in first..=last {
                let (min, max) = data.zbin_range(bin);
                assert!(min as usize <= index && index <= max as usize);
            }
        }
    }
}

#[test]
#[should_panic(expected = "non extendable")]
fn overflow_asserts_when_not_extendable() {
    let items = markers(CULLING_ITEM_BATCH + 1);
    let mut structure = CullingStructure::<Marker, NullPass>::new();
    structure.set_view(&camera_view(), UVec2::new(1280, 720));
    insert_all(&mut structure, &items);
}

#[test]
fn single_point_light_scenario() {
    let settings = LightSettings::default();
    let mut module = LightModule::new(NullPass, &settings);
    module.begin_sync(&settings);
    module.sync_light(
        ObjectKey(1),
        &LightSource::point(Vec3::ONE, 1000.0, 0.1),
        Mat4::IDENTITY,
        &mut NoShadows,
    );
    module.end_sync(&mut Sampling::new());
    module.set_view(&camera_view(), UVec2::new(1280, 720));

    let light = &module.lights()[0];
    assert!(light.influence_radius_max > 0.0);
    assert_eq!(module.batch_range(), 0..1);

    let batch = module.culling().batch(0);
    assert_eq!(batch.len(), 1);
    let handle = batch.item_handles()[0];
    assert!((handle.z_dist + 10.0).abs() < 1e-4);

    let data = batch.culling_data();
    assert_eq!(data.items_count, 1);
    let (first, last) = bin_span(data, handle.z_dist, handle.radius);
    assert_eq!(first, 0);
    assert!(last > first);
    for bin in 0..CULLING_ZBIN_COUNT {
        if (first..=last).contains(&bin) {
            assert_eq!(data.zbin_range(bin), (0, 0), "bin {bin}");
        } else {
            assert!(data.zbin_is_empty(bin), "bin {bin}");
        }
    }
}

#[test]
fn negative_custom_distance_still_reaches_a_bin() {
    let settings = LightSettings::default();
    let mut module = LightModule::new(NullPass, &settings);
    module.begin_sync(&settings);
    let source = LightSource::point(Vec3::ONE, 1000.0, 0.1)
        .with_attenuation(Attenuation::Custom(-3.0));
    module.sync_light(ObjectKey(1), &source, Mat4::IDENTITY, &mut NoShadows);
    module.end_sync(&mut Sampling::new());
    module.set_view(&camera_view(), UVec2::new(1280, 720));

    assert_eq!(module.lights()[0].influence_radius_max, 0.0);
    let data = module.culling().batch(0).culling_data();
    assert_eq!(data.items_count, 1);
    let filled = (0..CULLING_ZBIN_COUNT)
        .filter(|&bin| !data.zbin_is_empty(bin))
        .count();
    assert_eq!(filled, 1);
}
