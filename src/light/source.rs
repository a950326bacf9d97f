use glam::Vec3;

/// Stable identity of the scene object owning a light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(pub u64);

impl From<hecs::Entity> for ObjectKey {
    fn from(entity: hecs::Entity) -> Self {
        Self(entity.to_bits().get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaShape {
    Square,
    Rectangle,
    Disk,
    Ellipse,
}

impl AreaShape {
    /// Disk and ellipse shapes cover less than their bounding rectangle.
    pub fn is_elliptic(self) -> bool {
        matches!(self, AreaShape::Disk | AreaShape::Ellipse)
    }

    /// Shapes with an independent Y size.
    pub fn has_size_y(self) -> bool {
        matches!(self, AreaShape::Rectangle | AreaShape::Ellipse)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area(AreaShape),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attenuation {
    /// Radius solved from the inverse square law and the light threshold.
    InverseSquare,
    /// Fixed influence distance.
    Custom(f32),
}

/// Raw light properties as authored on a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub kind: LightKind,
    pub color: Vec3,
    /// Watts. Negative energy emits negative light; its magnitude sets the radius.
    pub energy: f32,
    pub diffuse_factor: f32,
    pub specular_factor: f32,
    pub volume_factor: f32,
    /// Point and spot radius, or area X size.
    pub size: f32,
    /// Area Y size for rectangle and ellipse shapes.
    pub size_y: f32,
    /// Sun angular diameter in radians.
    pub sun_angle: f32,
    /// Full spot cone angle in radians.
    pub spot_angle: f32,
    /// Spot edge smoothness in [0, 1].
    pub spot_blend: f32,
    pub attenuation: Attenuation,
    pub cast_shadow: bool,
    pub shadow_bias: f32,
    /// Shadow near clip distance.
    pub clip_start: f32,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::ONE,
            energy: 10.0,
            diffuse_factor: 1.0,
            specular_factor: 1.0,
            volume_factor: 1.0,
            size: 0.25,
            size_y: 0.25,
            sun_angle: 0.526f32.to_radians(),
            spot_angle: 45f32.to_radians(),
            spot_blend: 0.15,
            attenuation: Attenuation::InverseSquare,
            cast_shadow: false,
            shadow_bias: 1.0,
            clip_start: 0.05,
        }
    }
}

impl LightSource {
    pub fn point(color: Vec3, energy: f32, radius: f32) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            energy,
            size: radius,
            ..Self::default()
        }
    }

    pub fn sun(color: Vec3, strength: f32, angle: f32) -> Self {
        Self {
            kind: LightKind::Sun,
            color,
            energy: strength,
            sun_angle: angle,
            ..Self::default()
        }
    }

    pub fn spot(color: Vec3, energy: f32, spot_angle: f32, spot_blend: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            color,
            energy,
            spot_angle,
            spot_blend,
            ..Self::default()
        }
    }

    pub fn area(shape: AreaShape, color: Vec3, energy: f32, size_x: f32, size_y: f32) -> Self {
        Self {
            kind: LightKind::Area(shape),
            color,
            energy,
            size: size_x,
            size_y,
            ..Self::default()
        }
    }

    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_shadow(mut self, bias: f32) -> Self {
        self.cast_shadow = true;
        self.shadow_bias = bias;
        self
    }

    /// Brightest channel times energy, scaled to the renderer's power unit.
    pub fn max_power(&self) -> f32 {
        self.color.max_element() * (self.energy / 100.0).abs()
    }

    pub fn surface_max_power(&self) -> f32 {
        self.diffuse_factor.max(self.specular_factor) * self.max_power()
    }

    pub fn volume_max_power(&self) -> f32 {
        self.volume_factor * self.max_power()
    }
}
