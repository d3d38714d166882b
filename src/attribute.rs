use std::collections::HashMap;
use std::sync::Arc;

use crate::easing::Easing;
use crate::parser::AttributeParser;
use crate::value::AttributeValue;

/// An insertion-ordered set of attribute changes.
///
/// Iteration order is the order entries were inserted, which downstream
/// consumers rely on for consistent completion ordering. Entries may
/// additionally be marked for removal: once such a change lands, the
/// attribute is deleted from the set instead of keeping a terminal value.
///
/// Attribute sets are small, so this is a plain vector with linear lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changes {
    entries: Vec<(String, AttributeValue)>,
    removals: Vec<String>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, preserving the original position on
    /// replacement.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style [`insert`].
    ///
    /// [`insert`]: Changes::insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Marks an attribute for deletion from the instance once the change
    /// lands (after any animation completes).
    pub fn mark_removal(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.removals.contains(&name) {
            self.removals.push(name);
        }
    }

    /// Builder-style [`mark_removal`].
    ///
    /// [`mark_removal`]: Changes::mark_removal
    pub fn with_removal(mut self, name: impl Into<String>) -> Self {
        self.mark_removal(name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn is_marked_for_removal(&self, name: &str) -> bool {
        self.removals.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn removals(&self) -> impl Iterator<Item = &str> {
        self.removals.iter().map(String::as_str)
    }

    pub(crate) fn drain_entries(&mut self) -> Vec<(String, AttributeValue)> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.removals.is_empty()
    }
}

impl FromIterator<(String, AttributeValue)> for Changes {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        let mut changes = Changes::new();
        for (name, value) in iter {
            changes.insert(name, value);
        }
        changes
    }
}

/// Bookkeeping for one attribute's in-flight transition.
///
/// A timer exists for an attribute name if and only if that attribute is
/// currently animating; it is deleted in the same step that pushes the
/// resolved value onward.
pub struct Timer {
    /// Animation-clock timestamp of the first frame that observed this
    /// timer. `None` until then; the first frame establishes the baseline
    /// with zero elapsed progress.
    pub(crate) start: Option<f64>,
    /// Transition length in milliseconds. Always > 0 for an armed timer.
    pub(crate) duration: f64,
    pub(crate) easing: Easing,
    /// Parsed intermediate representations of the endpoints.
    pub(crate) source: AttributeValue,
    pub(crate) target: AttributeValue,
    pub(crate) parser: Arc<dyn AttributeParser>,
    /// Delete the attribute from the instance on completion.
    pub(crate) remove: bool,
}

impl Timer {
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn easing(&self) -> &Easing {
        &self.easing
    }

    pub fn source(&self) -> &AttributeValue {
        &self.source
    }

    pub fn target(&self) -> &AttributeValue {
        &self.target
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("start", &self.start)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("remove", &self.remove)
            .finish()
    }
}

/// The named values describing a sprite's visual state, plus the shadow
/// bookkeeping used while attributes animate.
///
/// `actual` holds the stored values the rendering backend sees. `pending`
/// holds the logical end state of in-flight transitions, so a reader asking
/// "what will this attribute be" gets the target rather than a transient
/// interpolated snapshot. The two are explicit maps; the logical view is
/// the merge `pending[name]` falling back to `actual[name]`.
#[derive(Default)]
pub struct AttributeSet {
    actual: HashMap<String, AttributeValue>,
    pending: HashMap<String, AttributeValue>,
    /// Insertion-ordered: completion events fire in arming order.
    timers: Vec<(String, Timer)>,
    pub(crate) animating: bool,
    /// Animation-clock timestamp of the last per-frame update; used to
    /// absorb duplicate ticks at the exact same timestamp.
    pub(crate) last_update: Option<f64>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes<I, N, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<AttributeValue>,
    {
        let mut set = Self::new();
        for (name, value) in attributes {
            set.actual.insert(name.into(), value.into());
        }
        set
    }

    /// The stored value the rendering backend currently sees.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.actual.get(name)
    }

    /// The logical value: the pending animation target if one exists,
    /// otherwise the stored value.
    pub fn logical(&self, name: &str) -> Option<&AttributeValue> {
        self.pending.get(name).or_else(|| self.actual.get(name))
    }

    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.actual.insert(name.into(), value);
    }

    pub fn delete(&mut self, name: &str) {
        self.actual.remove(name);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actual.keys().map(String::as_str)
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn timer(&self, name: &str) -> Option<&Timer> {
        self.timers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub(crate) fn set_pending(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.pending.insert(name.into(), value);
    }

    pub(crate) fn take_pending(&mut self, name: &str) -> Option<AttributeValue> {
        self.pending.remove(name)
    }

    pub(crate) fn set_timer(&mut self, name: impl Into<String>, timer: Timer) {
        let name = name.into();
        match self.timers.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = timer,
            None => self.timers.push((name, timer)),
        }
    }

    /// Clears the timer and pending entry for one attribute, keeping the
    /// iff-invariant between the two maps.
    pub(crate) fn clear_animation_state(&mut self, name: &str) {
        self.timers.retain(|(n, _)| n != name);
        self.pending.remove(name);
    }

    pub(crate) fn timers_mut(&mut self) -> &mut Vec<(String, Timer)> {
        &mut self.timers
    }

    pub(crate) fn clear_all_animation_state(&mut self) {
        self.timers.clear();
        self.pending.clear();
        self.animating = false;
    }
}

impl std::fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeSet")
            .field("actual", &self.actual)
            .field("pending", &self.pending)
            .field("timers", &self.timers.len())
            .field("animating", &self.animating)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_iterate_in_insertion_order() {
        let changes = Changes::new()
            .with("width", 10.0)
            .with("x", 1.0)
            .with("height", 5.0);
        let names: Vec<&str> = changes.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["width", "x", "height"]);
    }

    #[test]
    fn changes_replace_keeps_position() {
        let mut changes = Changes::new().with("a", 1.0).with("b", 2.0);
        changes.insert("a", AttributeValue::from(9.0));
        let names: Vec<&str> = changes.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(changes.get("a"), Some(&AttributeValue::from(9.0)));
    }

    #[test]
    fn removal_marks_survive_without_entries() {
        let mut changes = Changes::new();
        changes.mark_removal("highlight");
        assert!(!changes.is_empty());
        assert!(changes.is_marked_for_removal("highlight"));
    }

    #[test]
    fn logical_view_prefers_pending() {
        let mut attr = AttributeSet::with_attributes([("x", 1.0)]);
        assert_eq!(attr.logical("x"), Some(&AttributeValue::from(1.0)));
        attr.set_pending("x", AttributeValue::from(100.0));
        assert_eq!(attr.logical("x"), Some(&AttributeValue::from(100.0)));
        assert_eq!(attr.get("x"), Some(&AttributeValue::from(1.0)));
        attr.take_pending("x");
        assert_eq!(attr.logical("x"), Some(&AttributeValue::from(1.0)));
    }
}
