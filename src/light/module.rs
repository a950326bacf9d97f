use std::collections::HashMap;
use std::ops::Range;

use glam::{Mat4, UVec2};

use super::shadow::ShadowRegistry;
use super::source::{LightSource, ObjectKey};
use super::{Light, LightData};
use crate::culling::{BatchBinding, BoundSphere, CullingRenderPass, CullingStructure, CullingView};
use crate::sampling::TemporalAccumulation;
use crate::settings::LightSettings;

/// Thresholds below this are clamped to keep the inverse square solve finite.
pub const MIN_LIGHT_THRESHOLD: f32 = 1e-16;

/// Frame stage of a [`LightModule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Empty,
    Syncing,
    Synced,
    Culled,
}

/// How long ago a registered object last synced a light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Liveness {
    /// Synced since the last `end_sync`.
    Alive,
    /// Synced before the last `end_sync`, not since.
    Unconfirmed,
    /// Missed a whole frame. Purged at the next `end_sync` unless synced again.
    Silent,
}

/// Owns the per-frame lights, their liveness across frames, and their culling.
pub struct LightModule<P: CullingRenderPass> {
    lights: Vec<Light>,
    registry: HashMap<ObjectKey, Liveness>,
    light_threshold: f32,
    culling: CullingStructure<Light, P>,
    culling_pass: P,
    state: SyncState,
}

impl<P: CullingRenderPass> LightModule<P> {
    pub fn new(culling_pass: P, settings: &LightSettings) -> Self {
        Self {
            lights: Vec::new(),
            registry: HashMap::new(),
            light_threshold: settings.light_threshold.max(MIN_LIGHT_THRESHOLD),
            culling: CullingStructure::with_extendable(settings.extendable_culling),
            culling_pass,
            state: SyncState::Empty,
        }
    }

    pub fn begin_sync(&mut self, settings: &LightSettings) {
        self.light_threshold = settings.light_threshold.max(MIN_LIGHT_THRESHOLD);
        self.lights.clear();
        self.state = SyncState::Syncing;
    }

    pub fn sync_light<S: ShadowRegistry + ?Sized>(
        &mut self,
        key: ObjectKey,
        source: &LightSource,
        world: Mat4,
        shadows: &mut S,
    ) {
        debug_assert_eq!(self.state, SyncState::Syncing, "sync_light outside of sync");
        let light = Light::new(source, world, key, self.light_threshold, shadows);
        self.lights.push(light);
        self.registry.insert(key, Liveness::Alive);
    }

    /// Ages every registered key and purges the ones silent for a whole frame.
    ///
    /// Resets `sampling` when anything was purged. Returns the purged count.
    pub fn end_sync<A: TemporalAccumulation + ?Sized>(&mut self, sampling: &mut A) -> usize {
        let before = self.registry.len();
        self.registry.retain(|key, liveness| match *liveness {
            Liveness::Alive => {
                *liveness = Liveness::Unconfirmed;
                true
            }
            Liveness::Unconfirmed => {
                *liveness = Liveness::Silent;
                true
            }
            Liveness::Silent => {
                log::debug!("Purging light of deleted object {:?}", key);
                false
            }
        });

        let purged = before - self.registry.len();
        if purged > 0 {
            sampling.reset();
        }
        self.state = SyncState::Synced;
        purged
    }

    /// Culls and bins the synced lights for one view. Call again for each view of the frame.
    pub fn set_view(&mut self, view: &CullingView, extent: UVec2) {
        debug_assert!(
            matches!(self.state, SyncState::Synced | SyncState::Culled),
            "set_view before end_sync"
        );

        self.culling.set_view(view, extent);
        for (index, light) in self.lights.iter().enumerate() {
            let bsphere = if light.is_sun() {
                // Never culled.
                BoundSphere::new(view.camera_position(), view.far_distance())
            } else {
                BoundSphere::new(light.position(), light.influence_radius_max)
            };
            self.culling.insert(index as u32, &bsphere);
        }
        self.culling.finalize(&mut self.culling_pass, &self.lights);

        log::debug!(
            "Culled {} of {} lights into {} batches",
            self.culling.item_count(),
            self.lights.len(),
            self.culling.index_range().len()
        );
        self.state = SyncState::Culled;
    }

    /// Valid ids for [`Self::bind_batch`] in the current view.
    pub fn batch_range(&self) -> Range<usize> {
        self.culling.index_range()
    }

    pub fn bind_batch(&self, range_id: usize) -> BatchBinding<'_, LightData, P::Resources> {
        self.culling.batch(range_id).binding()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light_threshold(&self) -> f32 {
        self.light_threshold
    }

    pub fn is_registered(&self, key: ObjectKey) -> bool {
        self.registry.contains_key(&key)
    }

    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn culling(&self) -> &CullingStructure<Light, P> {
        &self.culling
    }

    pub fn culling_pass(&self) -> &P {
        &self.culling_pass
    }

    pub fn culling_pass_mut(&mut self) -> &mut P {
        &mut self.culling_pass
    }
}
