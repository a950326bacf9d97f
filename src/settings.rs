use glam::UVec2;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Upper bound on `shadow_slot_count`.
pub const MAX_SHADOW_SLOTS: u32 = 4096;

/// Light culling configuration, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSettings {
    /// Power below which a light is considered negligible. Drives influence radii.
    #[serde(default = "LightSettings::default_light_threshold")]
    pub light_threshold: f32,
    #[serde(default = "LightSettings::default_shadow_slot_count")]
    pub shadow_slot_count: u32,
    #[serde(default)]
    pub resolution: Resolution,
    /// Allow more than [`crate::culling::CULLING_ITEM_BATCH`] visible lights per view.
    #[serde(default = "LightSettings::default_extendable_culling")]
    pub extendable_culling: bool,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            light_threshold: Self::default_light_threshold(),
            shadow_slot_count: Self::default_shadow_slot_count(),
            resolution: Resolution::default(),
            extendable_culling: Self::default_extendable_culling(),
        }
    }
}

impl LightSettings {
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default light settings.",
                    path, err
                );
                LightSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Light settings file {:?} not found. Using default settings.",
                    path
                );
                LightSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default light settings.",
                    path, err
                );
                LightSettings::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let settings = serde_json::from_str::<LightSettings>(contents)?;
        info!("Loaded light settings");
        Ok(settings.validate())
    }

    fn validate(mut self) -> Self {
        if !self.light_threshold.is_finite() || self.light_threshold < 0.0 {
            warn!(
                "Light threshold {} is invalid. Using default value.",
                self.light_threshold
            );
            self.light_threshold = Self::default_light_threshold();
        }

        if self.shadow_slot_count > MAX_SHADOW_SLOTS {
            warn!(
                "Shadow slot count {} exceeds {}. Clamping.",
                self.shadow_slot_count, MAX_SHADOW_SLOTS
            );
            self.shadow_slot_count = MAX_SHADOW_SLOTS;
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        self
    }

    const fn default_light_threshold() -> f32 {
        0.01
    }

    const fn default_shadow_slot_count() -> u32 {
        16
    }

    const fn default_extendable_culling() -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn extent(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
