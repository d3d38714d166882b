use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attribute::{AttributeSet, Changes, Timer};
use crate::easing::Easing;
use crate::parser::ParserRegistry;

/// Declarative animation settings for a sprite.
///
/// Keys of the custom maps may join several attribute names with commas
/// (`"fillStyle,strokeStyle"`); the override applies to each of them.
/// In serialized form easings are referenced by snake_case name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Default timing function for animated attributes.
    pub easing: Easing,
    /// Default transition length in milliseconds. `0` disables animation
    /// unless a custom duration applies.
    pub duration: f64,
    /// Per-attribute easing overrides.
    pub custom_easings: HashMap<String, Easing>,
    /// Per-attribute duration overrides (milliseconds).
    pub custom_durations: HashMap<String, f64>,
}

impl AnimationConfig {
    pub fn new(duration: f64, easing: Easing) -> Self {
        Self {
            easing,
            duration,
            ..Self::default()
        }
    }
}

/// The animation stage of a sprite's modifier chain.
///
/// Intercepts attribute writes on the way down, decides per attribute
/// whether to transition smoothly or snap, and drives the interpolation of
/// armed timers from the frame scheduler's clock. Attributes only animate
/// when a parser is registered for them and a positive duration applies;
/// everything else passes through untouched.
pub struct AnimationModifier {
    registry: Arc<ParserRegistry>,
    easing: Easing,
    duration: f64,
    custom_easings: HashMap<String, Easing>,
    custom_durations: HashMap<String, f64>,
    /// Fast-path flags: `any_animation` tracks the default duration,
    /// `any_special` whether any per-attribute override exists. When both
    /// are false the modifier is a plain write-through.
    any_animation: bool,
    any_special: bool,
}

impl AnimationModifier {
    /// A modifier with animation disabled (zero duration, no overrides).
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self {
            registry,
            easing: Easing::Linear,
            duration: 0.0,
            custom_easings: HashMap::new(),
            custom_durations: HashMap::new(),
            any_animation: false,
            any_special: false,
        }
    }

    pub fn with_config(registry: Arc<ParserRegistry>, config: &AnimationConfig) -> Self {
        let mut modifier = Self::new(registry);
        modifier.apply_config(config);
        modifier
    }

    /// Applies a declarative config on top of the current settings,
    /// expanding comma-joined custom keys into per-attribute entries.
    pub fn apply_config(&mut self, config: &AnimationConfig) {
        self.easing = config.easing.clone();
        self.set_duration(config.duration);
        for (key, easing) in &config.custom_easings {
            for name in split_names(key) {
                self.custom_easings.insert(name.to_owned(), easing.clone());
            }
        }
        for (key, duration) in &config.custom_durations {
            for name in split_names(key) {
                self.custom_durations.insert(name.to_owned(), *duration);
            }
        }
        self.refresh_special();
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
        self.any_animation = duration > 0.0;
    }

    pub fn easing(&self) -> &Easing {
        &self.easing
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    /// Overrides the easing for the comma-joined attribute names.
    pub fn set_easing_on(&mut self, attrs: &str, easing: Easing) {
        for name in split_names(attrs) {
            self.custom_easings.insert(name.to_owned(), easing.clone());
        }
        self.refresh_special();
    }

    /// Removes easing overrides for the comma-joined attribute names.
    pub fn clear_easing_on(&mut self, attrs: &str) {
        for name in split_names(attrs) {
            self.custom_easings.remove(name);
        }
        self.refresh_special();
    }

    /// Overrides the duration for the comma-joined attribute names.
    pub fn set_duration_on(&mut self, attrs: &str, duration: f64) {
        for name in split_names(attrs) {
            self.custom_durations.insert(name.to_owned(), duration);
        }
        self.refresh_special();
    }

    /// Removes duration overrides for the comma-joined attribute names.
    pub fn clear_duration_on(&mut self, attrs: &str) {
        for name in split_names(attrs) {
            self.custom_durations.remove(name);
        }
        self.refresh_special();
    }

    fn refresh_special(&mut self) {
        self.any_special = !self.custom_easings.is_empty() || !self.custom_durations.is_empty();
    }

    /// The write path: intercepts `changes` on their way toward storage.
    ///
    /// Animated attributes are withheld from the returned map (their writes
    /// happen incrementally from [`update_attributes`]); everything else is
    /// passed through for the downstream stages to store.
    ///
    /// [`update_attributes`]: AnimationModifier::update_attributes
    pub fn push_down(&self, attr: &mut AttributeSet, changes: Changes) -> Changes {
        self.set_attrs(attr, changes)
    }

    /// The read path: applies the same animation decisions so pending
    /// targets stay coherent, then hands the surviving changes back to the
    /// caller for merging into the pending view.
    pub fn pop_up(&self, attr: &mut AttributeSet, changes: Changes) -> Changes {
        self.set_attrs(attr, changes)
    }

    fn set_attrs(&self, attr: &mut AttributeSet, mut changes: Changes) -> Changes {
        let any = self.any_animation || self.any_special;
        let entries = changes.drain_entries();
        let mut out = Changes::new();
        let mut consumed_marks: Vec<String> = Vec::new();

        if !any {
            // Animation disabled entirely: stop whatever is in flight,
            // drop no-op writes, set the rest directly.
            for (name, value) in entries {
                attr.clear_animation_state(&name);
                if attr.get(&name) == Some(&value) {
                    continue;
                }
                attr.set(name.clone(), value.clone());
                out.insert(name, value);
            }
        } else {
            let mut ignited = false;
            for (name, new_value) in entries {
                let marked = changes.is_marked_for_removal(&name);
                let start_value = attr.get(&name).cloned();

                if let Some(start_value) = start_value {
                    if start_value == new_value {
                        // No-op write: never arms a timer, never propagates.
                        attr.clear_animation_state(&name);
                        continue;
                    }
                    if let Some(parser) = self.registry.get(&name) {
                        let mut easing = self.easing.clone();
                        let mut duration = self.duration;
                        if self.any_special {
                            if let Some(custom) = self.custom_easings.get(&name) {
                                easing = custom.clone();
                            }
                            if let Some(custom) = self.custom_durations.get(&name) {
                                duration = *custom;
                            }
                        }

                        // Transitions between a color and a gradient, or
                        // between two gradients, are not supported.
                        if start_value.is_gradient() || new_value.is_gradient() {
                            duration = 0.0;
                        }

                        if duration > 0.0 {
                            let (source, target) =
                                match parser.parse_initial(&start_value, &new_value) {
                                    Some(endpoints) => endpoints,
                                    None => {
                                        (parser.parse(&start_value), parser.parse(&new_value))
                                    }
                                };
                            debug!(attribute = %name, duration, "arming transition");
                            attr.set_timer(
                                name.clone(),
                                Timer {
                                    start: None,
                                    duration,
                                    easing,
                                    source,
                                    target,
                                    parser: Arc::clone(parser),
                                    remove: marked,
                                },
                            );
                            attr.set_pending(name.clone(), new_value);
                            if marked {
                                consumed_marks.push(name);
                            }
                            ignited = true;
                            continue;
                        }
                    }
                }

                // Not animatable here (no parser, nothing to interpolate
                // from, or zero duration): snap. Clear stale bookkeeping
                // and let the raw change proceed.
                attr.clear_animation_state(&name);
                out.insert(name.clone(), new_value);
                if marked {
                    out.mark_removal(&name);
                    consumed_marks.push(name);
                }
            }
            if ignited {
                attr.animating = true;
            }
        }

        // Removal marks with no accompanying value change pass through.
        for mark in changes.removals() {
            if !consumed_marks.iter().any(|n| n == mark) && !out.is_marked_for_removal(mark) {
                out.mark_removal(mark);
            }
        }
        out
    }

    /// The per-frame update, driven by the frame scheduler.
    ///
    /// Computes the interpolated value of every armed timer at `now`
    /// (milliseconds on the animation clock) and returns them as a changes
    /// map for the downstream stages. Completed timers push their pending
    /// target and disappear in the same step. A second call at the exact
    /// same timestamp yields an empty map.
    pub fn update_attributes(&self, attr: &mut AttributeSet, now: f64) -> Changes {
        if !attr.animating || attr.last_update == Some(now) {
            return Changes::new();
        }

        let mut changes = Changes::new();
        let mut any = false;
        let mut timers = std::mem::take(attr.timers_mut());
        let mut remaining = Vec::with_capacity(timers.len());

        for (name, mut timer) in timers.drain(..) {
            let progress = match timer.start {
                // The first frame establishes the baseline; no visible jump.
                None => {
                    timer.start = Some(now);
                    0.0
                }
                Some(start) => (now - start) / timer.duration,
            };

            if progress >= 1.0 {
                let final_value = attr
                    .take_pending(&name)
                    .unwrap_or_else(|| timer.parser.serve(timer.target.clone()));
                changes.insert(name.clone(), final_value);
                if timer.remove {
                    changes.mark_removal(&name);
                }
                // Timer record dropped here; no terminal state retained.
            } else {
                let eased = timer.easing.apply(progress);
                let current = attr
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| timer.source.clone());
                let value = timer
                    .parser
                    .serve(timer.parser.compute(&timer.source, &timer.target, eased, &current));
                changes.insert(name.clone(), value);
                any = true;
                remaining.push((name, timer));
            }
        }

        *attr.timers_mut() = remaining;
        attr.last_update = Some(now);
        attr.animating = any;
        changes
    }

    /// Advances every active timer straight to completion and clears the
    /// animating state. Returns the final changes for the caller to push
    /// downstream; used when synchronous finality is needed.
    pub fn stop(&self, attr: &mut AttributeSet) -> Changes {
        let mut changes = Changes::new();
        let timers = std::mem::take(attr.timers_mut());
        for (name, timer) in timers {
            let final_value = attr
                .take_pending(&name)
                .unwrap_or_else(|| timer.parser.serve(timer.target.clone()));
            changes.insert(name.clone(), final_value);
            if timer.remove {
                changes.mark_removal(&name);
            }
        }
        if !changes.is_empty() {
            debug!(count = changes.len(), "stopped in-flight transitions");
        }
        attr.clear_all_animation_state();
        changes
    }

    /// Abandons all in-flight state without a final completion step.
    /// Mid-transition values stay wherever the last frame left them.
    pub fn destroy(&self, attr: &mut AttributeSet) {
        attr.clear_all_animation_state();
        attr.last_update = None;
    }
}

fn split_names(key: &str) -> impl Iterator<Item = &str> {
    key.split(',').map(str::trim).filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{AttributeValue, Color};

    fn modifier(duration: f64) -> AnimationModifier {
        AnimationModifier::with_config(
            Arc::new(ParserRegistry::standard()),
            &AnimationConfig::new(duration, Easing::Linear),
        )
    }

    #[test]
    fn disabled_modifier_writes_through() {
        let fx = modifier(0.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        let out = fx.push_down(&mut attr, Changes::new().with("x", 100.0));
        assert_eq!(out.get("x"), Some(&AttributeValue::from(100.0)));
        assert_eq!(attr.get("x"), Some(&AttributeValue::from(100.0)));
        assert!(!attr.has_timers());
        assert!(!attr.is_animating());
    }

    #[test]
    fn no_op_changes_are_dropped() {
        // Disabled path.
        let fx = modifier(0.0);
        let mut attr = AttributeSet::with_attributes([("x", 5.0)]);
        let out = fx.push_down(&mut attr, Changes::new().with("x", 5.0));
        assert!(out.is_empty());

        // Enabled path.
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 5.0)]);
        let out = fx.push_down(&mut attr, Changes::new().with("x", 5.0));
        assert!(out.is_empty());
        assert!(!attr.has_timers());
    }

    #[test]
    fn positive_duration_arms_a_timer_and_withholds_the_change() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        let out = fx.push_down(&mut attr, Changes::new().with("x", 100.0));
        assert!(out.is_empty());
        assert!(attr.is_animating());
        let timer = attr.timer("x").expect("timer armed");
        assert_eq!(timer.duration(), 1000.0);
        // Stored value untouched; logical view already reports the target.
        assert_eq!(attr.get("x"), Some(&AttributeValue::from(0.0)));
        assert_eq!(attr.logical("x"), Some(&AttributeValue::from(100.0)));
    }

    #[test]
    fn attributes_without_parser_snap() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("customFlag", 0.0)]);
        let out = fx.push_down(&mut attr, Changes::new().with("customFlag", 1.0));
        assert_eq!(out.get("customFlag"), Some(&AttributeValue::from(1.0)));
        assert!(!attr.has_timers());
    }

    #[test]
    fn missing_current_value_snaps() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::new();
        let out = fx.push_down(&mut attr, Changes::new().with("x", 100.0));
        assert_eq!(out.get("x"), Some(&AttributeValue::from(100.0)));
        assert!(!attr.has_timers());
    }

    #[test]
    fn custom_duration_overrides_default() {
        let mut config = AnimationConfig::new(500.0, Easing::Linear);
        config
            .custom_durations
            .insert("fillStyle,strokeStyle".to_owned(), 2000.0);
        let fx = AnimationModifier::with_config(Arc::new(ParserRegistry::standard()), &config);

        let mut attr = AttributeSet::with_attributes([
            ("fillStyle", AttributeValue::from(Color::rgb(0.0, 0.0, 0.0))),
            ("width", AttributeValue::from(1.0)),
        ]);
        fx.push_down(
            &mut attr,
            Changes::new()
                .with("fillStyle", Color::rgb(1.0, 1.0, 1.0))
                .with("width", 50.0),
        );
        assert_eq!(attr.timer("fillStyle").unwrap().duration(), 2000.0);
        assert_eq!(attr.timer("width").unwrap().duration(), 500.0);
    }

    #[test]
    fn clearing_a_custom_duration_reverts_to_default() {
        let mut fx = modifier(500.0);
        fx.set_duration_on("r", 3000.0);

        let mut attr = AttributeSet::with_attributes([("r", 1.0)]);
        fx.push_down(&mut attr, Changes::new().with("r", 2.0));
        assert_eq!(attr.timer("r").unwrap().duration(), 3000.0);

        fx.clear_duration_on("r");
        fx.push_down(&mut attr, Changes::new().with("r", 3.0));
        assert_eq!(attr.timer("r").unwrap().duration(), 500.0);
    }

    #[test]
    fn custom_rules_enable_animation_despite_zero_default() {
        let mut fx = modifier(0.0);
        fx.set_duration_on("x", 800.0);

        let mut attr = AttributeSet::with_attributes([("x", 0.0), ("y", 0.0)]);
        let out = fx.push_down(&mut attr, Changes::new().with("x", 10.0).with("y", 10.0));
        // `x` animates under its override, `y` snaps on the zero default.
        assert!(attr.timer("x").is_some());
        assert!(attr.timer("y").is_none());
        assert_eq!(out.get("y"), Some(&AttributeValue::from(10.0)));
        assert!(out.get("x").is_none());
    }

    #[test]
    fn gradient_endpoints_force_a_snap() {
        use crate::value::{Gradient, GradientStop};
        use glam::Vec2;

        let fx = modifier(1000.0);
        let gradient = Gradient::Linear {
            start: Vec2::ZERO,
            end: Vec2::new(0.0, 1.0),
            stops: vec![
                GradientStop { offset: 0.0, color: Color::rgb(1.0, 0.0, 0.0) },
                GradientStop { offset: 1.0, color: Color::rgb(0.0, 1.0, 0.0) },
            ],
        };
        let mut attr =
            AttributeSet::with_attributes([("fillStyle", Color::rgb(0.0, 0.0, 0.0))]);
        let out = fx.push_down(
            &mut attr,
            Changes::new().with("fillStyle", gradient.clone()),
        );
        assert_eq!(out.get("fillStyle"), Some(&AttributeValue::from(gradient)));
        assert!(!attr.has_timers());
    }

    #[test]
    fn linear_interpolation_over_the_clock() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        fx.push_down(&mut attr, Changes::new().with("x", 100.0));

        // First frame fixes the baseline.
        let changes = fx.update_attributes(&mut attr, 0.0);
        assert_eq!(changes.get("x"), Some(&AttributeValue::from(0.0)));

        let changes = fx.update_attributes(&mut attr, 500.0);
        assert_eq!(changes.get("x"), Some(&AttributeValue::from(50.0)));

        let changes = fx.update_attributes(&mut attr, 1000.0);
        assert_eq!(changes.get("x"), Some(&AttributeValue::from(100.0)));
        assert!(attr.timer("x").is_none());
        assert!(!attr.is_animating());
    }

    #[test]
    fn fractional_progress_interpolates_exactly() {
        // Eased progress stays in f64, so linear lerp of f64 numbers has
        // no single-precision residue at awkward fractions like 0.4.
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        fx.push_down(&mut attr, Changes::new().with("x", 100.0));

        fx.update_attributes(&mut attr, 0.0);
        let changes = fx.update_attributes(&mut attr, 400.0);
        assert_eq!(changes.get("x"), Some(&AttributeValue::from(40.0)));
        let changes = fx.update_attributes(&mut attr, 700.0);
        assert_eq!(changes.get("x"), Some(&AttributeValue::from(70.0)));
    }

    #[test]
    fn same_timestamp_update_is_idempotent() {
        // The guard compares exact clock equality; repeated ticks at the
        // same timestamp are treated as one frame.
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        fx.push_down(&mut attr, Changes::new().with("x", 100.0));

        fx.update_attributes(&mut attr, 0.0);
        let first = fx.update_attributes(&mut attr, 250.0);
        assert!(!first.is_empty());
        let second = fx.update_attributes(&mut attr, 250.0);
        assert!(second.is_empty());
        // Progress continues on the next distinct tick.
        let third = fx.update_attributes(&mut attr, 500.0);
        assert_eq!(third.get("x"), Some(&AttributeValue::from(50.0)));
    }

    #[test]
    fn completion_honors_removal_marks() {
        let fx = modifier(100.0);
        let mut attr = AttributeSet::with_attributes([("opacity", 1.0)]);
        fx.push_down(
            &mut attr,
            Changes::new().with("opacity", 0.0).with_removal("opacity"),
        );

        fx.update_attributes(&mut attr, 0.0);
        let done = fx.update_attributes(&mut attr, 100.0);
        assert_eq!(done.get("opacity"), Some(&AttributeValue::from(0.0)));
        assert!(done.is_marked_for_removal("opacity"));
    }

    #[test]
    fn stop_forces_completion() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0), ("y", 0.0)]);
        fx.push_down(&mut attr, Changes::new().with("x", 10.0).with("y", 20.0));
        fx.update_attributes(&mut attr, 250.0);

        let finals = fx.stop(&mut attr);
        assert_eq!(finals.get("x"), Some(&AttributeValue::from(10.0)));
        assert_eq!(finals.get("y"), Some(&AttributeValue::from(20.0)));
        assert!(!attr.is_animating());
        assert!(!attr.has_timers());
    }

    #[test]
    fn destroy_abandons_without_final_values() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        fx.push_down(&mut attr, Changes::new().with("x", 10.0));
        fx.destroy(&mut attr);
        assert!(!attr.is_animating());
        assert!(!attr.has_timers());
        assert_eq!(attr.logical("x"), Some(&AttributeValue::from(0.0)));
    }

    #[test]
    fn retarget_mid_flight_restarts_from_current_value() {
        let fx = modifier(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        fx.push_down(&mut attr, Changes::new().with("x", 100.0));

        fx.update_attributes(&mut attr, 0.0);
        let mid = fx.update_attributes(&mut attr, 500.0);
        // Simulate the target stage writing the interpolated value back.
        attr.set("x", mid.get("x").unwrap().clone());

        fx.push_down(&mut attr, Changes::new().with("x", 0.0));
        let timer = attr.timer("x").unwrap();
        assert_eq!(timer.source(), &AttributeValue::from(50.0));
        assert_eq!(timer.target(), &AttributeValue::from(0.0));
    }

    #[test]
    fn config_deserializes_with_easing_names() {
        let json = r#"{
            "duration": 500,
            "easing": "ease_out",
            "custom_durations": { "fillStyle,strokeStyle": 2000 },
            "custom_easings": { "r": "bounce_out" }
        }"#;
        let config: AnimationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.duration, 500.0);
        assert!(matches!(config.easing, Easing::EaseOut));

        let fx =
            AnimationModifier::with_config(Arc::new(ParserRegistry::standard()), &config);
        let mut attr = AttributeSet::with_attributes([(
            "strokeStyle",
            Color::rgb(0.0, 0.0, 0.0),
        )]);
        fx.push_down(
            &mut attr,
            Changes::new().with("strokeStyle", Color::rgb(1.0, 1.0, 1.0)),
        );
        assert_eq!(attr.timer("strokeStyle").unwrap().duration(), 2000.0);
    }
}
