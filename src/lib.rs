//! # Sprite FX
//!
//! `sprite-fx` is the attribute animation pipeline of a 2D sprite engine.
//!
//! Attribute writes flow through a per-sprite modifier chain whose animation
//! stage turns discrete changes into smooth transitions: each animated
//! attribute gets its own timer, easing and duration, driven frame by frame
//! from a shared scheduler clock. Attributes without a registered
//! interpolation parser simply snap to their target.

pub mod animation;
pub mod animator;
pub mod attribute;
pub mod easing;
pub mod errors;
pub mod modifier;
pub mod parser;
pub mod surface;
pub mod value;

pub use animation::{AnimationConfig, AnimationModifier};
pub use animator::Animator;
pub use attribute::{AttributeSet, Changes, Timer};
pub use easing::Easing;
pub use errors::Error;
pub use modifier::{Modifier, ModifierChain};
pub use parser::{AttributeParser, ParserRegistry};
pub use surface::{Sprite, SpriteId, Surface};
pub use value::{AttributeValue, Color, Gradient, GradientStop};
