use bytemuck::{Pod, Zeroable};

use super::Light;

/// Shadow id of lights without a shadow map.
pub const LIGHT_NO_SHADOW: u32 = u32::MAX;

/// Per-light shading parameters as laid out in the light storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightData {
    /// xyz = position, w = influence radius
    pub position_radius: [f32; 4],
    /// xyz = right axis, w = area half size X
    pub right_size_x: [f32; 4],
    /// xyz = up axis, w = area half size Y
    pub up_size_y: [f32; 4],
    /// xyz = back axis, w = squared volume radius
    pub back_radius_sq: [f32; 4],
    /// rgb = color * energy, w = shadow bias
    pub color_bias: [f32; 4],
    /// xy = spot size inverse, z = spot mul, w = spot bias
    pub spot: [f32; 4],
    /// x = diffuse, y = specular, z = volume power, w = unused
    pub power: [f32; 4],
    /// x = inverse squared surface radius, y = inverse squared volume radius
    pub influence: [f32; 4],
    /// x = light type, y = shadow id, zw = unused
    pub type_shadow: [u32; 4],
}

impl LightData {
    pub fn from_light(light: &Light) -> Self {
        let position = light.position();
        let right = light.right();
        let up = light.up();
        let back = light.back();
        Self {
            position_radius: [
                position.x,
                position.y,
                position.z,
                light.influence_radius_max,
            ],
            right_size_x: [right.x, right.y, right.z, light.area_size_x],
            up_size_y: [up.x, up.y, up.z, light.area_size_y],
            back_radius_sq: [back.x, back.y, back.z, light.radius_squared],
            color_bias: [
                light.color.x,
                light.color.y,
                light.color.z,
                light.shadow_bias,
            ],
            spot: [
                light.spot_size_inv.x,
                light.spot_size_inv.y,
                light.spot_mul,
                light.spot_bias,
            ],
            power: [
                light.diffuse_power,
                light.specular_power,
                light.volume_power,
                0.0,
            ],
            influence: [
                light.influence_radius_invsqr_surface,
                light.influence_radius_invsqr_volume,
                0.0,
                0.0,
            ],
            type_shadow: [
                light.light_type as u32,
                light.shadow_id.unwrap_or(LIGHT_NO_SHADOW),
                0,
                0,
            ],
        }
    }
}
