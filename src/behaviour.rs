//! Per-entity gameplay hooks driven by the level scheduler.
use crate::constants::{FILLER_SPRITE_LIFT, TILE_HEIGHT, TILE_WIDTH};
use crate::entity::Body;
use crate::level::TickContext;
use crate::render::{RenderSurface, SpriteId};

/// Gameplay logic attached to an entity.
///
/// Every hook has a default so simple entities only override what they
/// need. Render hooks must not change game state.
pub trait Behaviour: Send + Sync {
    /// Runs once, right after the entity is bound to its level.
    fn init(&mut self, _body: &mut Body) {}

    /// Advances the entity by one frame.
    fn tick(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Applies damage to the entity.
    fn hurt(&mut self, _body: &mut Body) {}

    /// Draws the entity.
    fn render(&self, body: &Body, surface: &mut dyn RenderSurface) {
        render_filler(body, surface);
    }

    /// Draws overlays above every entity's [`Behaviour::render`] pass.
    fn render_top(&self, _body: &Body, _surface: &mut dyn RenderSurface) {}
}

/// Draws the placeholder sprite centred on the body's tile.
pub fn render_filler(body: &Body, surface: &mut dyn RenderSurface) {
    surface.draw(
        SpriteId::ENTITY_FILLER,
        body.pos.x - TILE_WIDTH / 2.0,
        body.pos.y - TILE_HEIGHT / 2.0 - FILLER_SPRITE_LIFT,
    );
}
