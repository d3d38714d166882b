use crate::animation::AnimationModifier;
use crate::attribute::{AttributeSet, Changes};

/// A stage in a sprite's attribute pipeline.
///
/// Changes travel down the chain toward storage (`push_down`) and query
/// results travel back up (`pop_up`). Each stage may alter, withhold or
/// augment the changes map; the default implementations pass it through.
pub trait Modifier: Send {
    fn push_down(&mut self, _attr: &mut AttributeSet, changes: Changes) -> Changes {
        changes
    }

    fn pop_up(&mut self, _attr: &mut AttributeSet, changes: Changes) -> Changes {
        changes
    }
}

/// The ordered pipeline attribute changes flow through.
///
/// Writes run the upstream stages first, then the animation stage, then the
/// downstream stages, and whatever survives is applied to storage. The
/// per-frame `step` starts at the animation stage instead, feeding that
/// frame's interpolated values through the downstream stages and into
/// storage.
pub struct ModifierChain {
    upstream: Vec<Box<dyn Modifier>>,
    fx: AnimationModifier,
    downstream: Vec<Box<dyn Modifier>>,
}

impl ModifierChain {
    pub fn new(fx: AnimationModifier) -> Self {
        Self {
            upstream: Vec::new(),
            fx,
            downstream: Vec::new(),
        }
    }

    pub fn fx(&self) -> &AnimationModifier {
        &self.fx
    }

    pub fn fx_mut(&mut self) -> &mut AnimationModifier {
        &mut self.fx
    }

    /// Appends a stage that runs before the animation stage on writes.
    pub fn add_upstream(&mut self, modifier: Box<dyn Modifier>) {
        self.upstream.push(modifier);
    }

    /// Appends a stage that runs after the animation stage.
    pub fn add_downstream(&mut self, modifier: Box<dyn Modifier>) {
        self.downstream.push(modifier);
    }

    /// Pushes a set of changes through the whole chain and applies the
    /// survivors to storage. Returns the changes as applied.
    pub fn push_down(&mut self, attr: &mut AttributeSet, changes: Changes) -> Changes {
        let mut changes = changes;
        for modifier in &mut self.upstream {
            changes = modifier.push_down(attr, changes);
        }
        changes = self.fx.push_down(attr, changes);
        for modifier in &mut self.downstream {
            changes = modifier.push_down(attr, changes);
        }
        apply(attr, changes)
    }

    /// Advances the animation stage to `now` and routes that frame's
    /// interpolated values through the downstream stages into storage.
    pub fn step(&mut self, attr: &mut AttributeSet, now: f64) -> Changes {
        let mut changes = self.fx.update_attributes(attr, now);
        if changes.is_empty() {
            return changes;
        }
        for modifier in &mut self.downstream {
            changes = modifier.pop_up(attr, changes);
        }
        apply(attr, changes)
    }

    /// The read path: runs the changes through the animation stage's
    /// decision logic and the downstream stages, then merges the survivors
    /// into the pending view instead of storage. Readers of the logical
    /// view observe the merged end state immediately.
    pub fn pop_up(&mut self, attr: &mut AttributeSet, changes: Changes) -> Changes {
        let mut changes = self.fx.pop_up(attr, changes);
        for modifier in &mut self.downstream {
            changes = modifier.pop_up(attr, changes);
        }
        for (name, value) in changes.iter() {
            attr.set_pending(name.to_owned(), value.clone());
        }
        for name in changes.removals() {
            attr.take_pending(name);
        }
        changes
    }

    /// Forces every in-flight transition to its end state and applies the
    /// final values.
    pub fn stop(&mut self, attr: &mut AttributeSet) -> Changes {
        let mut changes = self.fx.stop(attr);
        if changes.is_empty() {
            return changes;
        }
        for modifier in &mut self.downstream {
            changes = modifier.pop_up(attr, changes);
        }
        apply(attr, changes)
    }

    /// Drops all in-flight state without emitting final values.
    pub fn destroy(&mut self, attr: &mut AttributeSet) {
        self.fx.destroy(attr);
    }
}

/// The implicit last stage: writes surviving values to storage and honors
/// removal marks by deleting the attribute instead.
fn apply(attr: &mut AttributeSet, changes: Changes) -> Changes {
    for (name, value) in changes.iter() {
        if changes.is_marked_for_removal(name) {
            continue;
        }
        attr.set(name.to_owned(), value.clone());
    }
    for name in changes.removals() {
        attr.delete(name);
    }
    changes
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::animation::{AnimationConfig, AnimationModifier};
    use crate::easing::Easing;
    use crate::parser::ParserRegistry;
    use crate::value::AttributeValue;

    fn chain(duration: f64) -> ModifierChain {
        ModifierChain::new(AnimationModifier::with_config(
            Arc::new(ParserRegistry::standard()),
            &AnimationConfig::new(duration, Easing::Linear),
        ))
    }

    /// Doubles every numeric value on the way down.
    struct Doubler;

    impl Modifier for Doubler {
        fn push_down(&mut self, _attr: &mut AttributeSet, changes: Changes) -> Changes {
            changes
                .iter()
                .map(|(name, value)| {
                    let value = match value.as_number() {
                        Some(n) => AttributeValue::from(n * 2.0),
                        None => value.clone(),
                    };
                    (name.to_owned(), value)
                })
                .collect()
        }
    }

    #[test]
    fn upstream_stages_run_before_animation() {
        let mut chain = chain(1000.0);
        chain.add_upstream(Box::new(Doubler));
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);

        chain.push_down(&mut attr, Changes::new().with("x", 50.0));
        // The animation stage saw the doubled target.
        assert_eq!(attr.timer("x").unwrap().target(), &AttributeValue::from(100.0));
    }

    #[test]
    fn synchronous_write_lands_in_storage() {
        let mut chain = chain(0.0);
        let mut attr = AttributeSet::new();
        let applied = chain.push_down(&mut attr, Changes::new().with("width", 30.0));
        assert_eq!(applied.get("width"), Some(&AttributeValue::from(30.0)));
        assert_eq!(attr.get("width"), Some(&AttributeValue::from(30.0)));
    }

    #[test]
    fn step_writes_interpolated_values_to_storage() {
        let mut chain = chain(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        chain.push_down(&mut attr, Changes::new().with("x", 100.0));

        chain.step(&mut attr, 0.0);
        chain.step(&mut attr, 250.0);
        assert_eq!(attr.get("x"), Some(&AttributeValue::from(25.0)));

        chain.step(&mut attr, 1000.0);
        assert_eq!(attr.get("x"), Some(&AttributeValue::from(100.0)));
        assert!(!attr.is_animating());
    }

    #[test]
    fn completion_deletes_removal_marked_attributes() {
        let mut chain = chain(100.0);
        let mut attr = AttributeSet::with_attributes([("opacity", 1.0)]);
        chain.push_down(
            &mut attr,
            Changes::new().with("opacity", 0.0).with_removal("opacity"),
        );

        chain.step(&mut attr, 0.0);
        assert!(attr.get("opacity").is_some());
        chain.step(&mut attr, 100.0);
        assert!(attr.get("opacity").is_none());
    }

    #[test]
    fn pop_up_merges_into_the_pending_view() {
        let mut chain = chain(0.0);
        let mut attr = AttributeSet::with_attributes([("x", 1.0)]);
        chain.pop_up(&mut attr, Changes::new().with("y", 9.0));
        assert_eq!(attr.logical("y"), Some(&AttributeValue::from(9.0)));
    }

    #[test]
    fn stop_applies_final_values() {
        let mut chain = chain(1000.0);
        let mut attr = AttributeSet::with_attributes([("x", 0.0)]);
        chain.push_down(&mut attr, Changes::new().with("x", 100.0));
        chain.step(&mut attr, 0.0);
        chain.step(&mut attr, 300.0);

        chain.stop(&mut attr);
        assert_eq!(attr.get("x"), Some(&AttributeValue::from(100.0)));
        assert!(!attr.is_animating());
    }
}
