use std::collections::HashMap;

use glam::Mat4;

use super::source::ObjectKey;

/// Receives shadow casting lights during sync and hands out shadow ids.
pub trait ShadowRegistry {
    /// Point, spot and area lights. `cone_aperture` is the full cone angle in radians.
    fn sync_punctual_shadow(
        &mut self,
        key: ObjectKey,
        object_mat: &Mat4,
        radius: f32,
        cone_aperture: f32,
        near_clip: f32,
    ) -> Option<u32>;

    fn sync_directional_shadow(&mut self, _key: ObjectKey, _object_mat: &Mat4) -> Option<u32> {
        None
    }
}

/// Registry for renderers without shadow maps.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoShadows;

impl ShadowRegistry for NoShadows {
    fn sync_punctual_shadow(
        &mut self,
        _: ObjectKey,
        _: &Mat4,
        _: f32,
        _: f32,
        _: f32,
    ) -> Option<u32> {
        None
    }
}

/// Parameters of a punctual shadow as last synced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PunctualShadow {
    pub object_mat: Mat4,
    pub radius: f32,
    pub cone_aperture: f32,
    pub near_clip: f32,
}

#[derive(Debug)]
struct SlotEntry {
    slot: u32,
    shadow: PunctualShadow,
    used: bool,
}

/// Fixed pool of shadow slots keyed by scene object.
///
/// A light keeps its slot for as long as it is synced every frame. Slots of lights
/// missing from a sync are released by [`Self::end_sync`].
#[derive(Debug)]
pub struct ShadowSlots {
    capacity: u32,
    entries: HashMap<ObjectKey, SlotEntry>,
    free: Vec<u32>,
}

impl ShadowSlots {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            // Reversed so the lowest slot is handed out first.
            free: (0..capacity).rev().collect(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn begin_sync(&mut self) {
        for entry in self.entries.values_mut() {
            entry.used = false;
        }
    }

    /// Releases slots not synced since [`Self::begin_sync`]. Returns the released count.
    pub fn end_sync(&mut self) -> usize {
        let free = &mut self.free;
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            if !entry.used {
                free.push(entry.slot);
            }
            entry.used
        });
        before - self.entries.len()
    }

    pub fn slot(&self, key: ObjectKey) -> Option<u32> {
        self.entries.get(&key).map(|entry| entry.slot)
    }

    pub fn shadow(&self, key: ObjectKey) -> Option<&PunctualShadow> {
        self.entries.get(&key).map(|entry| &entry.shadow)
    }

    pub fn used_count(&self) -> usize {
        self.entries.len()
    }
}

impl ShadowRegistry for ShadowSlots {
    fn sync_punctual_shadow(
        &mut self,
        key: ObjectKey,
        object_mat: &Mat4,
        radius: f32,
        cone_aperture: f32,
        near_clip: f32,
    ) -> Option<u32> {
        let shadow = PunctualShadow {
            object_mat: *object_mat,
            radius,
            cone_aperture,
            near_clip,
        };

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.shadow = shadow;
            entry.used = true;
            return Some(entry.slot);
        }

        let Some(slot) = self.free.pop() else {
            log::warn!(
                "No shadow slot left for light {:?} ({} in use)",
                key,
                self.capacity
            );
            return None;
        };

        self.entries.insert(
            key,
            SlotEntry {
                slot,
                shadow,
                used: true,
            },
        );
        Some(slot)
    }
}
