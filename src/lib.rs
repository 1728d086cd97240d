#![cfg_attr(docsrs, feature(doc_cfg))]
//! Movement and collision resolution for tile-based 2D games.
//! Re-exports the level, entity and geometry types for the binary and tests.
pub mod behaviour;
pub mod collision;
pub mod constants;
pub mod entity;
pub mod geometry;
pub mod level;
pub mod logging;
pub mod movement;
pub mod numeric;
pub mod plugin;
pub mod render;
pub use constants::*;

// Re-export commonly used items
pub use behaviour::{render_filler, Behaviour};
pub use collision::{blocks, CollideContext, CollisionResponder, EntityView};
pub use entity::{Body, EntityId, LevelId};
pub use geometry::BoundingBox;
pub use level::{Level, LevelError, LevelSettings, TickContext};
pub use logging::init as init_logging;
pub use movement::{clip_axis, Axis, AxisClip, MovePolicy};
pub use plugin::{tick_level_system, LevelPlugin};
pub use render::{DrawCommand, RenderSurface, Screen, SpriteId};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use tileclip::prelude::*;
    //! ```

    pub use crate::Behaviour;
    pub use crate::Body;
    pub use crate::BoundingBox;
    pub use crate::CollideContext;
    pub use crate::CollisionResponder;
    pub use crate::EntityId;
    pub use crate::Level;
    pub use crate::LevelPlugin;
    pub use crate::TickContext;
    pub use glam::DVec2;
}
