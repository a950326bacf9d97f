use hecs::World;

use crate::culling::CullingRenderPass;
use crate::light::{LightModule, ObjectKey, ShadowSlots};
use crate::sampling::TemporalAccumulation;
use crate::scene::components::{LightComponent, TransformComponent, Visible, WorldTransform};
use crate::scene::transform::Transform;
use crate::settings::LightSettings;

/// Runs one light sync of `world` into `module`. Returns the number of purged lights.
pub fn sync_world_lights<P, A>(
    world: &World,
    module: &mut LightModule<P>,
    settings: &LightSettings,
    shadows: &mut ShadowSlots,
    sampling: &mut A,
) -> usize
where
    P: CullingRenderPass,
    A: TemporalAccumulation + ?Sized,
{
    shadows.begin_sync();
    module.begin_sync(settings);

    for (entity, (light, world_transform, local_transform, visible)) in world
        .query::<(
            &LightComponent,
            Option<&WorldTransform>,
            Option<&TransformComponent>,
            Option<&Visible>,
        )>()
        .iter()
    {
        if !visible.map(|v| v.0).unwrap_or(true) {
            continue;
        }
        let transform = resolve_light_transform(world_transform, local_transform);
        module.sync_light(ObjectKey::from(entity), &light.0, transform.matrix(), shadows);
    }

    let purged = module.end_sync(sampling);
    let released = shadows.end_sync();
    if released > 0 {
        log::debug!("Released {} shadow slots", released);
    }
    purged
}

pub(crate) fn resolve_light_transform(
    world_transform: Option<&WorldTransform>,
    local_transform: Option<&TransformComponent>,
) -> Transform {
    world_transform
        .map(|t| t.0)
        .or_else(|| local_transform.map(|t| t.0))
        .unwrap_or(Transform::IDENTITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::{CullingData, CullingView};
    use crate::light::LightSource;
    use crate::sampling::Sampling;
    use glam::{UVec2, Vec3};

    struct NullPass;

    impl CullingRenderPass for NullPass {
        type Resources = ();

        fn ensure_resources(&mut self, slot: &mut Option<()>, _: UVec2) {
            *slot = Some(());
        }

        fn upload(&mut self, _: &mut (), _: &[u8], _: &CullingData) {}

        fn render(&mut self, _: &()) {}
    }

    struct Fixture {
        world: World,
        module: LightModule<NullPass>,
        settings: LightSettings,
        shadows: ShadowSlots,
        sampling: Sampling,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = LightSettings::default();
            Self {
                world: World::new(),
                module: LightModule::new(NullPass, &settings),
                shadows: ShadowSlots::new(settings.shadow_slot_count),
                settings,
                sampling: Sampling::new(),
            }
        }

        fn sync(&mut self) -> usize {
            sync_world_lights(
                &self.world,
                &mut self.module,
                &self.settings,
                &mut self.shadows,
                &mut self.sampling,
            )
        }
    }

    #[test]
    fn world_transform_wins_over_local() {
        let world = WorldTransform(Transform::from_translation(Vec3::X));
        let local = TransformComponent(Transform::from_translation(Vec3::Y));
        let resolved = resolve_light_transform(Some(&world), Some(&local));
        assert_eq!(resolved.translation, Vec3::X);
        assert_eq!(
            resolve_light_transform(None, Some(&local)).translation,
            Vec3::Y
        );
        assert_eq!(resolve_light_transform(None, None), Transform::IDENTITY);
    }

    #[test]
    fn syncs_entities_with_light_components() {
        let mut fixture = Fixture::new();
        fixture.world.spawn((
            LightComponent(LightSource::default()),
            TransformComponent(Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))),
        ));
        fixture.world.spawn((TransformComponent(Transform::IDENTITY),));
        fixture.world.spawn((LightComponent(LightSource::default()), Visible(false)));

        assert_eq!(fixture.sync(), 0);
        assert_eq!(fixture.module.lights().len(), 1);
        assert!(fixture.module.lights()[0]
            .position()
            .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn despawned_entity_is_purged_with_its_shadow() {
        let mut fixture = Fixture::new();
        let entity = fixture.world.spawn((
            LightComponent(LightSource::default().with_shadow(1.0)),
            TransformComponent(Transform::IDENTITY),
        ));
        fixture.sync();
        assert_eq!(fixture.module.lights()[0].shadow_id, Some(0));
        assert_eq!(fixture.shadows.used_count(), 1);

        fixture
            .world
            .despawn(entity)
            .expect("entity exists");
        assert_eq!(fixture.sync(), 0);
        assert_eq!(fixture.shadows.used_count(), 0);
        assert!(fixture.module.is_registered(ObjectKey::from(entity)));
        assert_eq!(fixture.sync(), 1);
        assert_eq!(fixture.sampling.reset_count(), 1);
    }

    #[test]
    fn synced_lights_can_be_culled() {
        let mut fixture = Fixture::new();
        fixture.world.spawn((
            LightComponent(LightSource::point(Vec3::ONE, 1000.0, 0.1)),
            TransformComponent(Transform::IDENTITY),
        ));
        fixture.sync();

        let camera = crate::scene::Camera {
            eye: Vec3::new(0.0, 0.0, 10.0),
            ..Default::default()
        };
        let view: CullingView = camera.culling_view(1.0);
        fixture.module.set_view(&view, UVec2::new(256, 256));
        assert_eq!(fixture.module.bind_batch(0).culling_data.items_count, 1);
    }
}
