pub mod camera;
pub mod components;
pub mod lights;
pub mod transform;

pub use camera::Camera;
pub use components::{LightComponent, TransformComponent, Visible, WorldTransform};
pub use lights::sync_world_lights;
pub use transform::Transform;
