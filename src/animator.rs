use tracing::trace;

use crate::surface::SpriteId;

/// The shared frame scheduler.
///
/// Owns the animation clock (milliseconds, monotonic) and the pool of
/// sprites with in-flight transitions. The surface advances the clock once
/// per frame and steps every pooled sprite against that single timestamp,
/// so concurrent transitions stay in lockstep.
#[derive(Debug, Default)]
pub struct Animator {
    time: f64,
    pool: Vec<SpriteId>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current animation-clock timestamp in milliseconds.
    pub fn now(&self) -> f64 {
        self.time
    }

    /// Advances the clock to `now`. The clock never moves backward; a
    /// stale timestamp is ignored and the current time returned.
    pub fn advance(&mut self, now: f64) -> f64 {
        if now > self.time {
            self.time = now;
        }
        self.time
    }

    /// Registers a sprite in the animating pool. Idempotent.
    pub fn add(&mut self, id: SpriteId) {
        if !self.pool.contains(&id) {
            trace!(sprite = id.raw(), "joining animating pool");
            self.pool.push(id);
        }
    }

    /// Drops a sprite from the pool, preserving the order of the rest.
    pub fn remove(&mut self, id: SpriteId) {
        self.pool.retain(|entry| *entry != id);
    }

    pub fn is_registered(&self, id: SpriteId) -> bool {
        self.pool.contains(&id)
    }

    /// A copy of the pool for this frame's iteration. Stepping a sprite
    /// may add or remove pool members; the snapshot keeps the frame's
    /// membership fixed.
    pub fn snapshot(&self) -> Vec<SpriteId> {
        self.pool.clone()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
