use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::animation::{AnimationConfig, AnimationModifier};
use crate::animator::Animator;
use crate::attribute::{AttributeSet, Changes};
use crate::errors::Error;
use crate::modifier::ModifierChain;
use crate::parser::ParserRegistry;

/// Handle to a sprite owned by a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u64);

impl SpriteId {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A drawable element: its attribute set and the modifier chain its
/// attribute changes flow through.
pub struct Sprite {
    attr: AttributeSet,
    chain: ModifierChain,
}

impl Sprite {
    pub fn attributes(&self) -> &AttributeSet {
        &self.attr
    }

    pub fn chain_mut(&mut self) -> &mut ModifierChain {
        &mut self.chain
    }
}

/// Owns a set of sprites and the frame scheduler that animates them.
///
/// Writes go through [`set_attributes`]; a host drives [`tick`] once per
/// frame with the new clock value, and the surface steps every sprite in
/// the animating pool against it. Sprites join the pool when a write arms
/// a transition and leave it when their last timer completes.
///
/// [`set_attributes`]: Surface::set_attributes
/// [`tick`]: Surface::tick
pub struct Surface {
    sprites: HashMap<SpriteId, Sprite>,
    animator: Animator,
    registry: Arc<ParserRegistry>,
    next_id: u64,
}

impl Surface {
    /// A surface using the standard parser registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ParserRegistry::standard()))
    }

    pub fn with_registry(registry: Arc<ParserRegistry>) -> Self {
        Self {
            sprites: HashMap::new(),
            animator: Animator::new(),
            registry,
            next_id: 0,
        }
    }

    /// The current animation-clock timestamp.
    pub fn now(&self) -> f64 {
        self.animator.now()
    }

    /// Adds a sprite with the given initial attributes and animation
    /// settings, returning its handle.
    pub fn add_sprite<I, N, V>(&mut self, attributes: I, config: &AnimationConfig) -> SpriteId
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<crate::value::AttributeValue>,
    {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        let fx = AnimationModifier::with_config(Arc::clone(&self.registry), config);
        self.sprites.insert(
            id,
            Sprite {
                attr: AttributeSet::with_attributes(attributes),
                chain: ModifierChain::new(fx),
            },
        );
        debug!(sprite = id.raw(), "sprite added");
        id
    }

    /// Pushes a set of attribute changes into the sprite's chain. Returns
    /// the changes that were applied synchronously; withheld (animating)
    /// attributes update frame by frame from [`tick`].
    ///
    /// [`tick`]: Surface::tick
    pub fn set_attributes(&mut self, id: SpriteId, changes: Changes) -> Result<Changes, Error> {
        let sprite = self
            .sprites
            .get_mut(&id)
            .ok_or(Error::SpriteNotFound(id.raw()))?;
        let applied = sprite.chain.push_down(&mut sprite.attr, changes);
        if sprite.attr.is_animating() {
            self.animator.add(id);
        } else {
            self.animator.remove(id);
        }
        Ok(applied)
    }

    /// The read path: runs the changes through the chain and reports the
    /// merged end state without waiting for animation. Shares the write
    /// path's decision logic, so it can arm transitions; pool membership
    /// is synced the same way as [`set_attributes`].
    ///
    /// [`set_attributes`]: Surface::set_attributes
    pub fn pop_up(&mut self, id: SpriteId, changes: Changes) -> Result<Changes, Error> {
        let sprite = self
            .sprites
            .get_mut(&id)
            .ok_or(Error::SpriteNotFound(id.raw()))?;
        let merged = sprite.chain.pop_up(&mut sprite.attr, changes);
        if sprite.attr.is_animating() {
            self.animator.add(id);
        } else {
            self.animator.remove(id);
        }
        Ok(merged)
    }

    /// Advances the clock and steps every animating sprite once against
    /// the new timestamp. Sprites whose transitions all completed leave
    /// the pool.
    pub fn tick(&mut self, frame_time: f64) {
        let now = self.animator.advance(frame_time);
        for id in self.animator.snapshot() {
            let Some(sprite) = self.sprites.get_mut(&id) else {
                self.animator.remove(id);
                continue;
            };
            sprite.chain.step(&mut sprite.attr, now);
            if !sprite.attr.is_animating() {
                self.animator.remove(id);
            }
        }
    }

    /// Forces every in-flight transition on one sprite to completion.
    pub fn stop(&mut self, id: SpriteId) -> Result<Changes, Error> {
        let sprite = self
            .sprites
            .get_mut(&id)
            .ok_or(Error::SpriteNotFound(id.raw()))?;
        let finals = sprite.chain.stop(&mut sprite.attr);
        self.animator.remove(id);
        Ok(finals)
    }

    /// Forces every in-flight transition on every sprite to completion.
    pub fn stop_all(&mut self) {
        for id in self.animator.snapshot() {
            if let Some(sprite) = self.sprites.get_mut(&id) {
                sprite.chain.stop(&mut sprite.attr);
            }
            self.animator.remove(id);
        }
    }

    /// Removes a sprite, abandoning any in-flight transitions without a
    /// final completion step.
    pub fn remove_sprite(&mut self, id: SpriteId) -> Result<(), Error> {
        let mut sprite = self
            .sprites
            .remove(&id)
            .ok_or(Error::SpriteNotFound(id.raw()))?;
        sprite.chain.destroy(&mut sprite.attr);
        self.animator.remove(id);
        debug!(sprite = id.raw(), "sprite removed");
        Ok(())
    }

    /// The stored value the rendering backend currently sees.
    pub fn get(&self, id: SpriteId, name: &str) -> Option<&crate::value::AttributeValue> {
        self.sprites.get(&id)?.attr.get(name)
    }

    /// The logical value: the pending animation target if one exists.
    pub fn logical(&self, id: SpriteId, name: &str) -> Option<&crate::value::AttributeValue> {
        self.sprites.get(&id)?.attr.logical(name)
    }

    pub fn is_animating(&self, id: SpriteId) -> bool {
        self.sprites
            .get(&id)
            .map(|sprite| sprite.attr.is_animating())
            .unwrap_or(false)
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(&id)
    }

    /// Mutable access to a sprite's animation stage, for runtime easing
    /// and duration overrides.
    pub fn fx_mut(&mut self, id: SpriteId) -> Result<&mut AnimationModifier, Error> {
        self.sprites
            .get_mut(&id)
            .map(|sprite| sprite.chain.fx_mut())
            .ok_or(Error::SpriteNotFound(id.raw()))
    }

    /// Mutable access to a sprite's full modifier chain, for installing
    /// custom stages.
    pub fn chain_mut(&mut self, id: SpriteId) -> Result<&mut ModifierChain, Error> {
        self.sprites
            .get_mut(&id)
            .map(Sprite::chain_mut)
            .ok_or(Error::SpriteNotFound(id.raw()))
    }

    pub fn animating_count(&self) -> usize {
        self.animator.len()
    }
}
