use thiserror::Error;

/// Errors surfaced by the pipeline's public API.
///
/// Missing interpolation parsers are deliberately not represented here:
/// an attribute without a parser snaps to its target instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown easing: {0}")]
    UnknownEasing(String),
    #[error("Sprite not found: {0}")]
    SpriteNotFound(u64),
}
