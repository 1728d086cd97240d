//! Collision dispatch between a moving entity and the owner of the box that
//! stopped it.
//!
//! Contact only has gameplay consequences when both sides agree to block
//! each other. The owner hears about the mover with the attempted delta, and
//! the mover hears about the owner with the delta negated.
//!
//! Callbacks only hold the two bodies, so effects that need the rest of the
//! level, such as hurting the other entity, are queued on a
//! [`CollideContext`] and applied by the level once both callbacks return.
use crate::entity::{Body, EntityId};
use crate::level::Entity;

/// Requests raised by collision callbacks, applied after the handshake.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollideContext {
    hurts: Vec<EntityId>,
    removals: Vec<EntityId>,
}

impl CollideContext {
    /// Queues a call to the target's hurt hook.
    pub fn hurt(&mut self, target: EntityId) {
        self.hurts.push(target);
    }

    /// Queues the target for removal.
    pub fn remove(&mut self, target: EntityId) {
        self.removals.push(target);
    }

    /// Hurt requests in the order they were raised.
    #[must_use]
    pub fn hurts(&self) -> &[EntityId] {
        &self.hurts
    }

    /// Removal requests in the order they were raised.
    #[must_use]
    pub fn removals(&self) -> &[EntityId] {
        &self.removals
    }

    /// Whether no callback asked for anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hurts.is_empty() && self.removals.is_empty()
    }
}

/// Optional per-entity component deciding how contact plays out.
///
/// Entities without a responder block everything and ignore contact.
#[cfg_attr(test, mockall::automock)]
pub trait CollisionResponder: Send + Sync {
    /// Whether this entity is willing to block `other`.
    fn should_block(&self, _me: &Body, _other: &Body) -> bool {
        true
    }

    /// Reacts to blocking contact with `other`.
    ///
    /// `dx`/`dy` is the displacement the contact happened along, as seen
    /// from this entity. Either body may be removed or moved here; hurting
    /// goes through `ctx`.
    fn collide(
        &mut self,
        _me: &mut Body,
        _other: &mut Body,
        _dx: f64,
        _dy: f64,
        _ctx: &mut CollideContext,
    ) {
    }
}

/// Read-only view of an entity taking part in a blocking negotiation.
#[derive(Clone, Copy)]
pub struct EntityView<'a> {
    /// Physical state of the entity.
    pub body: &'a Body,
    /// The entity's responder, if it has one.
    pub responder: Option<&'a dyn CollisionResponder>,
}

impl<'a> EntityView<'a> {
    /// Builds a view over a body and its optional responder.
    #[must_use]
    pub const fn new(body: &'a Body, responder: Option<&'a dyn CollisionResponder>) -> Self {
        Self { body, responder }
    }

    fn should_block(&self, other: &Body) -> bool {
        self.responder
            .map_or(true, |r| r.should_block(self.body, other))
    }
}

/// Returns `true` when `a` and `b` mutually block each other.
///
/// Both blocking flags must be set and both sides must agree to block the
/// other. The relation is symmetric.
///
/// # Examples
/// ```
/// use tileclip::{blocks, Body, EntityView};
/// let wall = Body::default();
/// let mut ghost = Body::default();
/// assert!(blocks(EntityView::new(&wall, None), EntityView::new(&ghost, None)));
/// ghost.is_blocking = false;
/// assert!(!blocks(EntityView::new(&wall, None), EntityView::new(&ghost, None)));
/// ```
#[must_use]
pub fn blocks(a: EntityView<'_>, b: EntityView<'_>) -> bool {
    a.body.is_blocking && b.body.is_blocking && a.should_block(b.body) && b.should_block(a.body)
}

/// Runs the contact handshake for `owner` being hit by `mover`.
///
/// Returns whether the pair blocked, i.e. whether callbacks fired.
pub(crate) fn handle_collision(
    owner: &mut Entity,
    mover: &mut Entity,
    dx: f64,
    dy: f64,
    ctx: &mut CollideContext,
) -> bool {
    if !blocks(owner.view(), mover.view()) {
        return false;
    }
    owner.collide(&mut mover.body, dx, dy, ctx);
    mover.collide(&mut owner.body, -dx, -dy, ctx);
    true
}
