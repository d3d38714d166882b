use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{BezPath, PathEl};

use crate::value::AttributeValue;

/// Per-attribute conversion and blending functions.
///
/// A parser turns raw attribute values into an interpolation-friendly
/// intermediate representation (`parse` / `parse_initial`), blends two
/// endpoints at an eased progress (`compute`), and converts the blended
/// value back to the stored representation (`serve`).
///
/// Attributes without a registered parser are never animated, only snapped.
pub trait AttributeParser: Send + Sync {
    /// Converts a raw value into the intermediate representation.
    fn parse(&self, raw: &AttributeValue) -> AttributeValue {
        raw.clone()
    }

    /// Parses both endpoints together, allowing cross-endpoint
    /// normalization (e.g. matching list lengths). Returning `None` falls
    /// back to parsing each endpoint independently via [`parse`].
    ///
    /// [`parse`]: AttributeParser::parse
    fn parse_initial(
        &self,
        _source: &AttributeValue,
        _target: &AttributeValue,
    ) -> Option<(AttributeValue, AttributeValue)> {
        None
    }

    /// Blends `source` and `target` at the eased progress.
    ///
    /// `current` is the attribute's present raw value; implementations
    /// that cannot blend the given variants return it unchanged, which the
    /// pipeline treats as "no change".
    fn compute(
        &self,
        source: &AttributeValue,
        target: &AttributeValue,
        eased: f64,
        current: &AttributeValue,
    ) -> AttributeValue;

    /// Converts a computed intermediate value back to the stored
    /// representation. Identity by default.
    fn serve(&self, computed: AttributeValue) -> AttributeValue {
        computed
    }
}

/// Lerps scalar numbers.
pub struct NumberParser;

impl AttributeParser for NumberParser {
    fn compute(
        &self,
        source: &AttributeValue,
        target: &AttributeValue,
        eased: f64,
        current: &AttributeValue,
    ) -> AttributeValue {
        match (source.as_number(), target.as_number()) {
            (Some(a), Some(b)) => AttributeValue::Number(a + (b - a) * eased),
            _ => current.clone(),
        }
    }
}

/// Lerps colors per channel.
pub struct ColorParser;

impl AttributeParser for ColorParser {
    fn compute(
        &self,
        source: &AttributeValue,
        target: &AttributeValue,
        eased: f64,
        current: &AttributeValue,
    ) -> AttributeValue {
        match (source.as_color(), target.as_color()) {
            (Some(a), Some(b)) => AttributeValue::Color(a.lerp(b, eased as f32)),
            _ => current.clone(),
        }
    }
}

/// Lerps numeric lists pointwise. `parse_initial` pads the shorter endpoint
/// by repeating its last element so both sides match in length.
pub struct ListParser;

impl AttributeParser for ListParser {
    fn parse_initial(
        &self,
        source: &AttributeValue,
        target: &AttributeValue,
    ) -> Option<(AttributeValue, AttributeValue)> {
        let (a, b) = match (source.as_list(), target.as_list()) {
            (Some(a), Some(b)) => (a, b),
            _ => return None,
        };
        if a.is_empty() || b.is_empty() || a.len() == b.len() {
            return None;
        }
        let len = a.len().max(b.len());
        let pad = |v: &[f64]| {
            let mut out = v.to_vec();
            out.resize(len, *v.last().unwrap_or(&0.0));
            AttributeValue::List(out)
        };
        Some((pad(a), pad(b)))
    }

    fn compute(
        &self,
        source: &AttributeValue,
        target: &AttributeValue,
        eased: f64,
        current: &AttributeValue,
    ) -> AttributeValue {
        match (source.as_list(), target.as_list()) {
            (Some(a), Some(b)) if a.len() == b.len() => AttributeValue::List(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| x + (y - x) * eased)
                    .collect(),
            ),
            _ => current.clone(),
        }
    }
}

/// Lerps path control points when both endpoints share the same element
/// structure; otherwise holds the source shape until completion snaps to
/// the target.
pub struct PathParser;

impl AttributeParser for PathParser {
    fn compute(
        &self,
        source: &AttributeValue,
        target: &AttributeValue,
        eased: f64,
        current: &AttributeValue,
    ) -> AttributeValue {
        let (a, b) = match (source.as_path(), target.as_path()) {
            (Some(a), Some(b)) => (a, b),
            _ => return current.clone(),
        };
        match lerp_path(a, b, eased) {
            Some(path) => AttributeValue::Path(path),
            None => AttributeValue::Path(a.clone()),
        }
    }
}

/// Discrete text transition: the source string holds until the animation
/// completes and the target is pushed down.
pub struct TextParser;

impl AttributeParser for TextParser {
    fn compute(
        &self,
        source: &AttributeValue,
        _target: &AttributeValue,
        _eased: f64,
        _current: &AttributeValue,
    ) -> AttributeValue {
        source.clone()
    }
}

fn lerp_path(a: &BezPath, b: &BezPath, t: f64) -> Option<BezPath> {
    let ea = a.elements();
    let eb = b.elements();
    if ea.len() != eb.len() {
        return None;
    }
    let mut out = BezPath::new();
    for (x, y) in ea.iter().zip(eb.iter()) {
        let el = match (x, y) {
            (PathEl::MoveTo(p), PathEl::MoveTo(q)) => PathEl::MoveTo(p.lerp(*q, t)),
            (PathEl::LineTo(p), PathEl::LineTo(q)) => PathEl::LineTo(p.lerp(*q, t)),
            (PathEl::QuadTo(p1, p2), PathEl::QuadTo(q1, q2)) => {
                PathEl::QuadTo(p1.lerp(*q1, t), p2.lerp(*q2, t))
            }
            (PathEl::CurveTo(p1, p2, p3), PathEl::CurveTo(q1, q2, q3)) => {
                PathEl::CurveTo(p1.lerp(*q1, t), p2.lerp(*q2, t), p3.lerp(*q3, t))
            }
            (PathEl::ClosePath, PathEl::ClosePath) => PathEl::ClosePath,
            _ => return None,
        };
        out.push(el);
    }
    Some(out)
}

/// Maps attribute names to the parser that knows how to animate them.
///
/// The registry is an explicit, injected table rather than a process-wide
/// singleton so independent pipelines (and tests) never share state.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn AttributeParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the parsers for the usual draw attributes: numeric
    /// geometry, canvas-style paint colors, `path` and `text`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let number: Arc<dyn AttributeParser> = Arc::new(NumberParser);
        for name in [
            "x",
            "y",
            "width",
            "height",
            "r",
            "cx",
            "cy",
            "opacity",
            "lineWidth",
            "rotation",
            "scaleX",
            "scaleY",
            "translationX",
            "translationY",
        ] {
            registry.register(name, Arc::clone(&number));
        }
        let color: Arc<dyn AttributeParser> = Arc::new(ColorParser);
        for name in ["fillStyle", "strokeStyle", "shadowColor"] {
            registry.register(name, Arc::clone(&color));
        }
        registry.register("lineDash", Arc::new(ListParser));
        registry.register("path", Arc::new(PathParser));
        registry.register("text", Arc::new(TextParser));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, parser: Arc<dyn AttributeParser>) {
        self.parsers.insert(name.into(), parser);
    }

    pub fn unregister(&mut self, name: &str) {
        self.parsers.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AttributeParser>> {
        self.parsers.get(name)
    }
}
