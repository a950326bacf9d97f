use crate::light::LightSource;
use crate::scene::Transform;

/// Local transform
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// World-space transform, preferred over [`TransformComponent`] when present.
#[derive(Debug, Clone, Copy)]
pub struct WorldTransform(pub Transform);

#[derive(Debug, Clone, Copy)]
pub struct LightComponent(pub LightSource);

/// Hidden lights are not synced and end up purged.
#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}
