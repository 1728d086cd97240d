//! Movement and layout constants used across the level.
//!
//! These values are hardcoded rather than loaded from configuration; only
//! the candidate query margin is tunable through
//! [`LevelSettings`](crate::level::LevelSettings).

/// Gap left between a stopped entity and the box that stopped it.
pub const CLIP_EPSILON: f64 = 0.01;
/// Width of a single map tile in world units.
pub const TILE_WIDTH: f64 = 32.0;
/// Height of a single map tile in world units.
pub const TILE_HEIGHT: f64 = 32.0;
/// Half-extent given to freshly constructed bodies on both axes.
pub const DEFAULT_RADIUS: f64 = 10.0;
/// Vertical lift applied to the filler sprite so it sits above the tile.
pub const FILLER_SPRITE_LIFT: f64 = 8.0;
