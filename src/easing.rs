use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use keyframe::EasingFunction;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::Error;

/// A timing function mapping linear progress in [0, 1] to eased progress.
///
/// The standard curves delegate to `keyframe::functions`; the back, elastic
/// and bounce families are implemented directly since `keyframe` does not
/// ship them. `Custom` wraps a user-supplied closure.
#[derive(Clone, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    BackIn,
    BackOut,
    ElasticIn,
    ElasticOut,
    BounceIn,
    BounceOut,
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Easing {
    /// Evaluates the curve at progress `t`. Input is clamped to [0, 1];
    /// the output of the elastic and back families may leave that range.
    /// Progress stays in f64 so linear interpolation of f64 attributes
    /// is exact.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => keyframe::functions::Linear.y(t),
            Easing::EaseIn => keyframe::functions::EaseIn.y(t),
            Easing::EaseOut => keyframe::functions::EaseOut.y(t),
            Easing::EaseInOut => keyframe::functions::EaseInOut.y(t),
            Easing::EaseInQuad => keyframe::functions::EaseInQuad.y(t),
            Easing::EaseOutQuad => keyframe::functions::EaseOutQuad.y(t),
            Easing::EaseInOutQuad => keyframe::functions::EaseInOutQuad.y(t),
            Easing::EaseInCubic => keyframe::functions::EaseInCubic.y(t),
            Easing::EaseOutCubic => keyframe::functions::EaseOutCubic.y(t),
            Easing::EaseInOutCubic => keyframe::functions::EaseInOutCubic.y(t),
            Easing::BackIn => back_in(t),
            Easing::BackOut => back_out(t),
            Easing::ElasticIn => elastic_in(t),
            Easing::ElasticOut => elastic_out(t),
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
            Easing::Custom(f) => f(t),
        }
    }

    /// Wraps a closure as a custom timing function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Easing::Custom(Arc::new(f))
    }

    /// Looks up a curve by its snake_case name, e.g. `"ease_in_out"`.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        let easing = match name {
            "linear" => Easing::Linear,
            "ease_in" => Easing::EaseIn,
            "ease_out" => Easing::EaseOut,
            "ease_in_out" => Easing::EaseInOut,
            "ease_in_quad" => Easing::EaseInQuad,
            "ease_out_quad" => Easing::EaseOutQuad,
            "ease_in_out_quad" => Easing::EaseInOutQuad,
            "ease_in_cubic" => Easing::EaseInCubic,
            "ease_out_cubic" => Easing::EaseOutCubic,
            "ease_in_out_cubic" => Easing::EaseInOutCubic,
            "back_in" => Easing::BackIn,
            "back_out" => Easing::BackOut,
            "elastic_in" => Easing::ElasticIn,
            "elastic_out" => Easing::ElasticOut,
            "bounce_in" => Easing::BounceIn,
            "bounce_out" => Easing::BounceOut,
            other => return Err(Error::UnknownEasing(other.to_owned())),
        };
        Ok(easing)
    }

    fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease_in",
            Easing::EaseOut => "ease_out",
            Easing::EaseInOut => "ease_in_out",
            Easing::EaseInQuad => "ease_in_quad",
            Easing::EaseOutQuad => "ease_out_quad",
            Easing::EaseInOutQuad => "ease_in_out_quad",
            Easing::EaseInCubic => "ease_in_cubic",
            Easing::EaseOutCubic => "ease_out_cubic",
            Easing::EaseInOutCubic => "ease_in_out_cubic",
            Easing::BackIn => "back_in",
            Easing::BackOut => "back_out",
            Easing::ElasticIn => "elastic_in",
            Easing::ElasticOut => "elastic_out",
            Easing::BounceIn => "bounce_in",
            Easing::BounceOut => "bounce_out",
            Easing::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Easing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if matches!(self, Easing::Custom(_)) {
            return Err(serde::ser::Error::custom(
                "custom easing functions cannot be serialized",
            ));
        }
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Easing::from_name(&name).map_err(D::Error::custom)
    }
}

fn back_in(t: f64) -> f64 {
    const C1: f64 = 1.70158;
    t * t * ((C1 + 1.0) * t - C1)
}

fn back_out(t: f64) -> f64 {
    const C1: f64 = 1.70158;
    let t = t - 1.0;
    t * t * ((C1 + 1.0) * t + C1) + 1.0
}

fn elastic_in(t: f64) -> f64 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        -(2.0_f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
    }
}

fn elastic_out(t: f64) -> f64 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

fn bounce_out(t: f64) -> f64 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        assert_eq!(Easing::Linear.apply(0.0), 0.0);
        assert_eq!(Easing::Linear.apply(0.5), 0.5);
        assert_eq!(Easing::Linear.apply(1.0), 1.0);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
        assert_eq!(Easing::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn curves_hit_both_endpoints() {
        let curves = [
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::EaseInOutCubic,
            Easing::BackIn,
            Easing::BackOut,
            Easing::ElasticIn,
            Easing::ElasticOut,
            Easing::BounceIn,
            Easing::BounceOut,
        ];
        for easing in curves {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} at 1");
        }
    }

    #[test]
    fn custom_closure_is_used() {
        let square = Easing::custom(|t| t * t);
        assert_eq!(square.apply(0.5), 0.25);
    }

    #[test]
    fn name_lookup_round_trips() {
        let easing = Easing::from_name("bounce_out").unwrap();
        assert!(matches!(easing, Easing::BounceOut));
        assert!(Easing::from_name("wobble").is_err());
    }

    #[test]
    fn deserializes_from_name() {
        let easing: Easing = serde_json::from_str("\"ease_in_out\"").unwrap();
        assert!(matches!(easing, Easing::EaseInOut));
        assert!(serde_json::from_str::<Easing>("\"nope\"").is_err());
    }
}
