use glam::{Mat4, Vec3, Vec4};

/// Conservative sphere around an item's volume of effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Camera data the culling needs for one view.
///
/// Right-handed view space (camera looks down -Z) and wgpu clip depth in [0, 1].
#[derive(Clone, Copy, Debug)]
pub struct CullingView {
    view: Mat4,
    projection: Mat4,
    view_inv: Mat4,
    near: f32,
    far: f32,
    /// Left, right, bottom, top, near, far. `xyz` points inside, `w` is the offset.
    planes: [Vec4; 6],
    camera_z_axis: Vec3,
    camera_z_offset: f32,
}

impl CullingView {
    /// `near` and `far` are positive distances matching `projection`.
    pub fn new(view: Mat4, projection: Mat4, near: f32, far: f32) -> Self {
        let view_inv = view.inverse();
        let camera_z_axis = view_inv.z_axis.truncate();
        let camera_z_offset = -camera_z_axis.dot(view_inv.w_axis.truncate());

        Self {
            view,
            projection,
            view_inv,
            near,
            far,
            planes: extract_frustum_planes(&(projection * view)),
            camera_z_axis,
            camera_z_offset,
        }
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_inverse(&self) -> Mat4 {
        self.view_inv
    }

    pub fn camera_position(&self) -> Vec3 {
        self.view_inv.w_axis.truncate()
    }

    pub fn near_distance(&self) -> f32 {
        self.near
    }

    pub fn far_distance(&self) -> f32 {
        self.far
    }

    /// Signed view-space Z of the near plane.
    pub fn near_z(&self) -> f32 {
        -self.near
    }

    /// Signed view-space Z of the far plane.
    pub fn far_z(&self) -> f32 {
        -self.far
    }

    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Signed distance along the camera Z axis. Negative in front of the camera.
    pub fn z_distance(&self, point: Vec3) -> f32 {
        point.dot(self.camera_z_axis) + self.camera_z_offset
    }

    pub fn sphere_test(&self, sphere: &BoundSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(sphere.center) + plane.w >= -sphere.radius)
    }
}

fn extract_frustum_planes(view_proj: &Mat4) -> [Vec4; 6] {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    // Clip depth is [0, 1], so the near plane is row 2 alone.
    [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(normalize_plane)
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > 1e-6 {
        plane / len
    } else {
        plane
    }
}
