//! Light component

use crate::foundation::math::Vec4;
use crate::io::{FileStream, StreamError, StreamResult};

use super::{Component, ComponentKind, ComponentType};

/// Light emission model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Parallel rays along the owner's forward axis
    Directional,
    /// Omnidirectional with limited range
    Point,
    /// Cone along the owner's forward axis; lit like a point light
    Spot,
}

impl LightType {
    fn tag(self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
            Self::Spot => 2,
        }
    }

    fn from_tag(tag: u32) -> StreamResult<Self> {
        match tag {
            0 => Ok(Self::Directional),
            1 => Ok(Self::Point),
            2 => Ok(Self::Spot),
            other => Err(StreamError::InvalidValue(format!("light type tag {other}"))),
        }
    }
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    light_type: LightType,
    color: Vec4,
    intensity: f32,
    range: f32,
    cast_shadows: bool,
    bias: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Vec4::new(1.0, 0.76, 0.57, 1.0),
            intensity: 2.0,
            range: 10.0,
            cast_shadows: true,
            bias: 0.001,
        }
    }
}

impl Light {
    /// Emission model
    pub fn light_type(&self) -> LightType {
        self.light_type
    }

    /// Change the emission model; the scene must be resolved afterwards for
    /// its light buckets to follow
    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
    }

    /// RGBA colour
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Set the colour
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Brightness multiplier
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Set the brightness, clamped at zero
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    /// Reach of point and spot lights
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Set the reach, clamped at zero
    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
    }

    /// Whether the light casts shadows
    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    /// Enable or disable shadows
    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.cast_shadows = cast_shadows;
    }

    /// Shadow depth bias
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Set the shadow depth bias
    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }
}

impl Component for Light {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Light
    }

    fn serialize(&self, stream: &mut FileStream) {
        stream.write_u32(self.light_type.tag());
        stream.write_vec4(&self.color);
        stream.write_f32(self.intensity);
        stream.write_f32(self.range);
        stream.write_bool(self.cast_shadows);
        stream.write_f32(self.bias);
    }

    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()> {
        self.light_type = LightType::from_tag(stream.read_u32()?)?;
        self.color = stream.read_vec4()?;
        self.intensity = stream.read_f32()?;
        self.range = stream.read_f32()?;
        self.cast_shadows = stream.read_bool()?;
        self.bias = stream.read_f32()?;
        Ok(())
    }

    component_any!();
}

impl ComponentType for Light {
    const KIND: ComponentKind = ComponentKind::Light;
}
