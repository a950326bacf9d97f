//! Lights as synced from the scene each frame, and their culling.

mod data;
mod module;
mod record;
mod shadow;
mod source;

pub use data::{LightData, LIGHT_NO_SHADOW};
pub use module::{LightModule, SyncState, MIN_LIGHT_THRESHOLD};
pub use record::{attenuation_radius, Light, LightType, SUN_INFLUENCE_RADIUS};
pub use shadow::{NoShadows, PunctualShadow, ShadowRegistry, ShadowSlots};
pub use source::{AreaShape, Attenuation, LightKind, LightSource, ObjectKey};
