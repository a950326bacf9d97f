use std::f32::consts::{FRAC_1_PI, FRAC_PI_2, PI};

use glam::{Mat4, Vec2, Vec3};

use super::shadow::ShadowRegistry;
use super::source::{Attenuation, LightKind, LightSource, ObjectKey};
use super::LightData;
use crate::culling::Cullable;

/// Influence radius of a sun with non negligible power.
pub const SUN_INFLUENCE_RADIUS: f32 = 1e16;
/// Radii at or below this are degenerate and get a zero inverse square.
pub const RADIUS_EPSILON: f32 = 1e-4;
/// Smallest area light half size.
pub const MIN_AREA_SIZE: f32 = 0.003;

const MIN_PUNCTUAL_SIZE: f32 = 0.001;
const MAX_CONE_ANGLE: f32 = 179.9 * PI / 180.0;

/// Shading model of a light, as read by the shaders.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightType {
    Point = 0,
    Sun = 1,
    Spot = 2,
    Rect = 3,
    Ellipse = 4,
}

impl From<LightKind> for LightType {
    fn from(kind: LightKind) -> Self {
        match kind {
            LightKind::Point => LightType::Point,
            LightKind::Sun => LightType::Sun,
            LightKind::Spot => LightType::Spot,
            LightKind::Area(shape) if shape.is_elliptic() => LightType::Ellipse,
            LightKind::Area(_) => LightType::Rect,
        }
    }
}

/// Derived per-frame parameters of one light.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub key: ObjectKey,
    pub light_type: LightType,
    /// Orthonormal right-handed basis (right, up, back) and position.
    pub object_mat: Mat4,
    /// Per axis scale removed from `object_mat`.
    pub scale: Vec3,
    pub color: Vec3,
    pub influence_radius_max: f32,
    pub influence_radius_invsqr_surface: f32,
    pub influence_radius_invsqr_volume: f32,
    pub area_size_x: f32,
    pub area_size_y: f32,
    pub radius_squared: f32,
    pub spot_size_inv: Vec2,
    pub spot_mul: f32,
    pub spot_bias: f32,
    pub diffuse_power: f32,
    pub specular_power: f32,
    pub volume_power: f32,
    pub shadow_id: Option<u32>,
    pub shadow_bias: f32,
}

impl Light {
    pub fn new<S: ShadowRegistry + ?Sized>(
        source: &LightSource,
        world: Mat4,
        key: ObjectKey,
        threshold: f32,
        shadows: &mut S,
    ) -> Self {
        let influence_radius_surface =
            attenuation_radius(source, threshold, source.surface_max_power());
        let influence_radius_volume =
            attenuation_radius(source, threshold, source.volume_max_power());

        let (object_mat, scale) = normalize_transform(world);

        let mut light = Self {
            key,
            light_type: source.kind.into(),
            object_mat,
            scale,
            color: source.color * source.energy,
            influence_radius_max: influence_radius_surface.max(influence_radius_volume),
            influence_radius_invsqr_surface: inverse_square(influence_radius_surface),
            influence_radius_invsqr_volume: inverse_square(influence_radius_volume),
            area_size_x: 0.0,
            area_size_y: 0.0,
            radius_squared: 0.0,
            spot_size_inv: Vec2::ZERO,
            spot_mul: 0.0,
            spot_bias: 0.0,
            diffuse_power: 0.0,
            specular_power: 0.0,
            volume_power: 0.0,
            shadow_id: None,
            shadow_bias: source.shadow_bias * 0.05,
        };

        light.set_shape_parameters(source);

        let shape_power = light.shape_power(source);
        light.diffuse_power = source.diffuse_factor * shape_power;
        light.specular_power = source.specular_factor * shape_power;
        light.volume_power = source.volume_factor * light.shape_power_volume(source);

        if source.cast_shadow {
            light.shadow_id = match source.kind {
                LightKind::Sun => shadows.sync_directional_shadow(key, &light.object_mat),
                LightKind::Point => shadows.sync_punctual_shadow(
                    key,
                    &light.object_mat,
                    light.influence_radius_max,
                    2.0 * PI,
                    source.clip_start,
                ),
                LightKind::Spot => shadows.sync_punctual_shadow(
                    key,
                    &light.object_mat,
                    light.influence_radius_max,
                    source.spot_angle.min(MAX_CONE_ANGLE),
                    source.clip_start,
                ),
                LightKind::Area(_) => shadows.sync_punctual_shadow(
                    key,
                    &light.object_mat,
                    light.influence_radius_max,
                    MAX_CONE_ANGLE,
                    source.clip_start,
                ),
            };
        }

        light
    }

    pub fn position(&self) -> Vec3 {
        self.object_mat.w_axis.truncate()
    }

    pub fn right(&self) -> Vec3 {
        self.object_mat.x_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        self.object_mat.y_axis.truncate()
    }

    pub fn back(&self) -> Vec3 {
        self.object_mat.z_axis.truncate()
    }

    pub fn is_sun(&self) -> bool {
        self.light_type == LightType::Sun
    }

    fn set_shape_parameters(&mut self, source: &LightSource) {
        let scale = self.scale;
        match source.kind {
            LightKind::Area(shape) => {
                let size_y = if shape.has_size_y() {
                    source.size_y
                } else {
                    source.size
                };
                self.area_size_x = (source.size * scale.x * 0.5).max(MIN_AREA_SIZE);
                self.area_size_y = (size_y * scale.y * 0.5).max(MIN_AREA_SIZE);
                // Volume lighting treats area lights as spheres.
                let radius = (self.area_size_x.hypot(self.area_size_y) * 0.5).max(0.001);
                self.radius_squared = radius * radius;
            }
            LightKind::Sun => {
                let half_angle = source.sun_angle.min(MAX_CONE_ANGLE) / 2.0;
                self.area_size_x = half_angle.tan().max(MIN_PUNCTUAL_SIZE);
                self.area_size_y = self.area_size_x;
                self.radius_squared = self.area_size_x * self.area_size_x;
            }
            LightKind::Point | LightKind::Spot => {
                if source.kind == LightKind::Spot {
                    self.spot_size_inv = Vec2::new(
                        scale.z / scale.x.max(f32::EPSILON),
                        scale.z / scale.y.max(f32::EPSILON),
                    );
                    let spot_size = (source.spot_angle * 0.5).cos();
                    let spot_blend = (1.0 - spot_size) * source.spot_blend;
                    self.spot_mul = 1.0 / spot_blend.max(1e-8);
                    self.spot_bias = -spot_size * self.spot_mul;
                }
                self.area_size_x = source.size.max(MIN_PUNCTUAL_SIZE);
                self.area_size_y = self.area_size_x;
                self.radius_squared = self.area_size_x * self.area_size_x;
            }
        }
    }

    /// Power normalization keeping the emitted power constant when the shape changes.
    fn shape_power(&self, source: &LightSource) -> f32 {
        match source.kind {
            LightKind::Area(shape) => {
                let area = self.area_size_x * self.area_size_y;
                // Empirical fit against the offline renderer.
                let mut power = 0.8 / (area * 4.0 * PI);
                if shape.is_elliptic() {
                    power *= 4.0 / PI;
                }
                power
            }
            LightKind::Point | LightKind::Spot => {
                1.0 / (4.0 * self.area_size_x * self.area_size_x * PI * PI)
            }
            LightKind::Sun => {
                // Second term compensates the energy lost by wide suns.
                1.0 / (self.area_size_x * self.area_size_x * PI) + 1.0 / (2.0 * PI)
            }
        }
    }

    /// Volume lights are evaluated as points, so the shape power is removed.
    fn shape_power_volume(&self, source: &LightSource) -> f32 {
        match source.kind {
            LightKind::Area(_) => {
                let area = self.area_size_x * self.area_size_y;
                let blend = FRAC_PI_2 / (FRAC_PI_2 + area.sqrt());
                // Lerp between 1 and the 1/pi limit of large areas.
                0.0792 * PI * (blend + (1.0 - blend) * FRAC_1_PI)
            }
            LightKind::Point | LightKind::Spot => 0.0792,
            LightKind::Sun => 1.0,
        }
    }
}

impl Cullable for Light {
    type Data = LightData;

    fn gpu_data(&self) -> LightData {
        LightData::from_light(self)
    }

    fn position(&self) -> Vec3 {
        Light::position(self)
    }

    fn bounding_radius(&self) -> f32 {
        self.influence_radius_max
    }
}

/// Distance at which the light power decays to `threshold`.
pub fn attenuation_radius(source: &LightSource, threshold: f32, power: f32) -> f32 {
    if source.kind == LightKind::Sun {
        return if power > 1e-5 {
            SUN_INFLUENCE_RADIUS
        } else {
            0.0
        };
    }

    match source.attenuation {
        Attenuation::Custom(distance) => distance.max(0.0),
        // TODO: account for the area light scale.
        Attenuation::InverseSquare => (power / threshold).sqrt(),
    }
}

fn inverse_square(radius: f32) -> f32 {
    if radius > RADIUS_EPSILON {
        1.0 / (radius * radius)
    } else {
        0.0
    }
}

/// Splits `world` into an orthonormal right-handed frame and per axis scale.
///
/// An odd number of negative scale axes flips the up axis back.
pub(crate) fn normalize_transform(world: Mat4) -> (Mat4, Vec3) {
    let x = world.x_axis.truncate();
    let y = world.y_axis.truncate();
    let z = world.z_axis.truncate();
    let scale = Vec3::new(x.length(), y.length(), z.length());

    let right = safe_normalize(x, Vec3::X);
    let mut up = safe_normalize(y, Vec3::Y);
    let back = safe_normalize(z, Vec3::Z);
    if back.cross(right).dot(up) < 0.0 {
        up = -up;
    }

    let object_mat = Mat4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        back.extend(0.0),
        world.w_axis.truncate().extend(1.0),
    );
    (object_mat, scale)
}

pub(crate) fn safe_normalize(vec: Vec3, fallback: Vec3) -> Vec3 {
    if vec.length_squared() > 1e-12 {
        vec.normalize()
    } else {
        fallback
    }
}
