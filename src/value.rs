use glam::Vec2;
use kurbo::BezPath;

/// An RGBA color with normalized (0.0 - 1.0) channels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Linear interpolation per channel. `t` outside [0, 1] extrapolates.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// A single color stop of a gradient, positioned at `offset` in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

/// A paint gradient. Gradients are applied as-is: the animation pipeline
/// never interpolates between gradient values (any change touching a
/// gradient snaps).
#[derive(Clone, Debug, PartialEq)]
pub enum Gradient {
    Linear {
        start: Vec2,
        end: Vec2,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: Vec2,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

/// The typed raw value of a sprite attribute.
///
/// The pipeline stores and transports attribute values as this enum; the
/// per-attribute parsers decide how (and whether) each variant blends.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    List(Vec<f64>),
    Color(Color),
    Path(BezPath),
    Gradient(Gradient),
    Text(String),
    Bool(bool),
}

impl AttributeValue {
    /// Gradient endpoints disable interpolation for the attribute.
    pub fn is_gradient(&self) -> bool {
        matches!(self, AttributeValue::Gradient(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&Color> {
        match self {
            AttributeValue::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            AttributeValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&BezPath> {
        match self {
            AttributeValue::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<f32> for AttributeValue {
    fn from(n: f32) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<Color> for AttributeValue {
    fn from(c: Color) -> Self {
        AttributeValue::Color(c)
    }
}

impl From<Gradient> for AttributeValue {
    fn from(g: Gradient) -> Self {
        AttributeValue::Gradient(g)
    }
}

impl From<BezPath> for AttributeValue {
    fn from(p: BezPath) -> Self {
        AttributeValue::Path(p)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(v: Vec<f64>) -> Self {
        AttributeValue::List(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_owned())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}
