use glam::{Quat, Vec3};
use hecs::World;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use light_culling::light::{AreaShape, LightKind, LightModule, LightSource, ShadowSlots};
use light_culling::renderer::{GpuContext, TileBinningPass};
use light_culling::sampling::Sampling;
use light_culling::scene::{
    sync_world_lights, Camera, LightComponent, Transform, TransformComponent,
};
use light_culling::settings::LightSettings;

const LIGHT_COUNT: usize = 400;
const FRAME_COUNT: u32 = 6;
const DESPAWN_FRAME: u32 = 2;

fn random_light(rng: &mut SmallRng) -> (LightComponent, TransformComponent) {
    let color = Vec3::new(rng.gen(), rng.gen(), rng.gen());
    let energy = rng.gen_range(10.0..500.0);
    let source = match rng.gen_range(0..6) {
        0 => LightSource::spot(color, energy, rng.gen_range(0.2..2.5), rng.gen()),
        1 => LightSource::area(AreaShape::Rectangle, color, energy, 1.0, 0.5),
        2 => LightSource::area(AreaShape::Disk, color, energy, 0.8, 0.8),
        3 if rng.gen_bool(0.05) => LightSource::sun(color, 2.0, 0.01),
        _ => LightSource::point(color, energy, rng.gen_range(0.05..0.5)),
    };
    let source = if rng.gen_bool(0.1) {
        source.with_shadow(1.0)
    } else {
        source
    };

    let position = Vec3::new(
        rng.gen_range(-40.0..40.0),
        rng.gen_range(0.0..10.0),
        rng.gen_range(-60.0..20.0),
    );
    let transform = if matches!(source.kind, LightKind::Spot | LightKind::Sun) {
        let target = Vec3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-40.0..0.0));
        Transform::from_translation(position).looking_at(target, Vec3::Y)
    } else {
        Transform::from_trs(
            position,
            Quat::from_rotation_x(rng.gen_range(-1.5..0.0)),
            Vec3::ONE,
        )
    };
    (LightComponent(source), TransformComponent(transform))
}

fn main() {
    light_culling::init_logging();

    let settings = LightSettings::load_from_path("light_settings.json");
    let context = match pollster::block_on(GpuContext::headless()) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("Application error: {err}");
            return;
        }
    };

    let mut rng = SmallRng::seed_from_u64(7);
    let mut world = World::new();
    let entities: Vec<_> = (0..LIGHT_COUNT)
        .map(|_| world.spawn(random_light(&mut rng)))
        .collect();

    let pass = TileBinningPass::new(&context.device, &context.queue);
    let mut module = LightModule::new(pass, &settings);
    let mut shadows = ShadowSlots::new(settings.shadow_slot_count);
    let mut sampling = Sampling::new();

    let camera = Camera {
        eye: Vec3::new(0.0, 5.0, 15.0),
        target: Vec3::new(0.0, 2.0, 0.0),
        ..Camera::default()
    };
    let resolution = settings.resolution;

    for frame in 0..FRAME_COUNT {
        if frame == DESPAWN_FRAME {
            for &entity in entities.iter().step_by(3) {
                if let Err(err) = world.despawn(entity) {
                    log::warn!("Failed to despawn light {:?}: {}", entity, err);
                }
            }
            log::info!("Frame {frame}: despawned a third of the lights");
        }

        let purged = sync_world_lights(&world, &mut module, &settings, &mut shadows, &mut sampling);
        if frame > 0 && sampling.is_reset() {
            log::info!("Frame {frame}: light set changed, accumulation restarted");
        }

        let view = camera.culling_view(resolution.aspect());
        module.set_view(&view, resolution.extent());

        let mut visible = 0;
        for batch in module.batch_range() {
            let binding = module.bind_batch(batch);
            visible += binding.culling_data.items_count;
        }
        sampling.step();

        log::info!(
            "Frame {frame}: {} lights, {visible} visible in {} batches, {purged} purged, \
             {} shadows, sample {}",
            module.lights().len(),
            module.batch_range().len(),
            shadows.used_count(),
            sampling.sample_index()
        );
    }

    log::info!(
        "Done: {} tile pass allocations, {} sampling resets",
        module.culling_pass().allocation_count(),
        sampling.reset_count()
    );
}
