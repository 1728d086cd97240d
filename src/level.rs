//! The level: owner of every entity and every piece of static geometry.
//!
//! The level answers candidate-box queries for movers, resolves movement
//! through [`clip_axis`], runs the collision handshake and drives the
//! per-frame tick. Entities are addressed by [`EntityId`] handles; removal is
//! a flag on the body and the table is compacted once the tick finishes, so
//! behaviours may remove anything at any point without invalidating the
//! iteration in progress.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use bevy::prelude::Resource;
use glam::DVec2;
use hashbrown::HashMap;
use log::{debug, trace, warn};
use thiserror::Error;

use crate::behaviour::{render_filler, Behaviour};
use crate::collision::{blocks, handle_collision, CollideContext, CollisionResponder, EntityView};
use crate::constants::{TILE_HEIGHT, TILE_WIDTH};
use crate::entity::{Body, EntityId, LevelId};
use crate::geometry::BoundingBox;
use crate::movement::{clip_axis, Axis, MovePolicy};
use crate::render::RenderSurface;

static NEXT_LEVEL_ID: AtomicU32 = AtomicU32::new(0);

/// Errors raised by gameplay operations on a [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The handle does not name an entity in this level.
    #[error("no entity {0:?} in this level")]
    UnknownEntity(EntityId),
    /// The body was already spawned into a level.
    #[error("body is already bound to level {level:?}")]
    AlreadyBound {
        /// Level the body belongs to.
        level: LevelId,
    },
}

/// Tunables for a [`Level`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSettings {
    /// Extra distance around a mover searched for candidate boxes, on top
    /// of the requested displacement.
    pub clip_margin: f64,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            clip_margin: TILE_WIDTH,
        }
    }
}

/// Table entry: a body plus its optional components.
pub(crate) struct Entity {
    pub(crate) body: Body,
    behaviour: Option<Box<dyn Behaviour>>,
    responder: Option<Box<dyn CollisionResponder>>,
    /// Set while the behaviour is out of the table for its own tick.
    ticking: bool,
    /// Hurts raised while `ticking`, delivered when the behaviour returns.
    pending_hurts: u32,
}

impl Entity {
    pub(crate) fn view(&self) -> EntityView<'_> {
        EntityView::new(&self.body, self.responder.as_deref())
    }

    pub(crate) fn collide(
        &mut self,
        other: &mut Body,
        dx: f64,
        dy: f64,
        ctx: &mut CollideContext,
    ) {
        if let Some(responder) = self.responder.as_deref_mut() {
            responder.collide(&mut self.body, other, dx, dy, ctx);
        }
    }
}

/// A playable level.
#[derive(Resource)]
pub struct Level {
    id: LevelId,
    settings: LevelSettings,
    entities: HashMap<EntityId, Entity>,
    /// Spawn order; also the tick and render order.
    order: Vec<EntityId>,
    statics: Vec<BoundingBox>,
    next_entity: u64,
    tick_count: u64,
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("entities", &self.order.len())
            .field("statics", &self.statics.len())
            .field("tick_count", &self.tick_count)
            .finish()
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::new(LevelSettings::default())
    }
}

impl Level {
    /// Creates an empty level.
    #[must_use]
    pub fn new(settings: LevelSettings) -> Self {
        Self {
            id: LevelId(NEXT_LEVEL_ID.fetch_add(1, Ordering::Relaxed)),
            settings,
            entities: HashMap::new(),
            order: Vec::new(),
            statics: Vec::new(),
            next_entity: 0,
            tick_count: 0,
        }
    }

    /// Handle of this level.
    #[must_use]
    pub const fn id(&self) -> LevelId {
        self.id
    }

    /// Settings the level was built with.
    #[must_use]
    pub const fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of entities in the table, including any awaiting compaction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the level holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Spawns a body with no behaviour and default collision handling.
    ///
    /// # Errors
    /// Returns [`LevelError::AlreadyBound`] if the body belongs to a level.
    pub fn spawn(&mut self, body: Body) -> Result<EntityId, LevelError> {
        self.spawn_with(body, None, None)
    }

    /// Binds `body` to this level and runs its behaviour's init hook.
    ///
    /// # Errors
    /// Returns [`LevelError::AlreadyBound`] if the body belongs to a level.
    ///
    /// # Examples
    /// ```
    /// use tileclip::{Body, Level};
    /// let mut level = Level::default();
    /// let id = level.spawn_with(Body::at(16.0, 16.0), None, None).unwrap();
    /// assert_eq!(level.body(id).and_then(|b| b.id()), Some(id));
    /// ```
    pub fn spawn_with(
        &mut self,
        mut body: Body,
        mut behaviour: Option<Box<dyn Behaviour>>,
        responder: Option<Box<dyn CollisionResponder>>,
    ) -> Result<EntityId, LevelError> {
        if let Some(level) = body.level() {
            return Err(LevelError::AlreadyBound { level });
        }
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        body.bind(self.id, id);
        if let Some(b) = behaviour.as_deref_mut() {
            b.init(&mut body);
        }
        debug!("spawned {id:?} at ({}, {}) in {:?}", body.pos.x, body.pos.y, self.id);
        self.entities.insert(
            id,
            Entity {
                body,
                behaviour,
                responder,
                ticking: false,
                pending_hurts: 0,
            },
        );
        self.order.push(id);
        Ok(id)
    }

    /// Adds an inert static box.
    pub fn add_static_box(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        self.statics.push(BoundingBox::new(x0, y0, x1, y1));
    }

    /// Adds a solid tile at grid cell `(col, row)`.
    pub fn add_solid_tile(&mut self, col: i32, row: i32) {
        let x0 = f64::from(col) * TILE_WIDTH;
        let y0 = f64::from(row) * TILE_HEIGHT;
        self.add_static_box(x0, y0, x0 + TILE_WIDTH, y0 + TILE_HEIGHT);
    }

    /// Static geometry in insertion order.
    ///
    /// # Examples
    /// ```
    /// use tileclip::{Level, TILE_HEIGHT, TILE_WIDTH};
    /// let mut level = Level::default();
    /// level.add_solid_tile(2, 1);
    /// let tile = level.static_boxes()[0];
    /// assert_eq!((tile.x0, tile.y0), (2.0 * TILE_WIDTH, TILE_HEIGHT));
    /// assert!(tile.owner.is_none());
    /// ```
    #[must_use]
    pub fn static_boxes(&self) -> &[BoundingBox] {
        &self.statics
    }

    /// Looks up a body, removed or not.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.entities.get(&id).map(|e| &e.body)
    }

    /// Mutable access to a body.
    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.entities.get_mut(&id).map(|e| &mut e.body)
    }

    /// Live bodies in spawn order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.live_entities().map(|e| &e.body)
    }

    fn live_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| !e.body.is_removed())
    }

    fn is_live(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(|e| !e.body.is_removed())
    }

    /// Candidate boxes a mover may run into while travelling `(dx, dy)`.
    ///
    /// Searches the mover's box grown by the clip margin plus the
    /// displacement. Static boxes come first in insertion order, then the
    /// boxes of other live entities that mutually block the mover, in spawn
    /// order. Entities that do not block the mover are left out so it passes
    /// through them.
    #[must_use]
    pub fn clip_boxes(&self, id: EntityId, dx: f64, dy: f64) -> Vec<BoundingBox> {
        let Some(mover) = self.entities.get(&id) else {
            return Vec::new();
        };
        let margin = self.settings.clip_margin;
        let region = mover
            .body
            .bounding_box()
            .grow(margin + dx.abs(), margin + dy.abs());

        let statics = self
            .statics
            .iter()
            .filter(|bb| region.intersects(bb))
            .copied();
        let dynamics = self
            .live_entities()
            .filter(|other| other.body.id() != Some(id))
            .filter(|other| blocks(other.view(), mover.view()))
            .map(|other| other.body.bounding_box())
            .filter(|bb| region.intersects(bb));
        statics.chain(dynamics).collect()
    }

    /// Moves an entity by up to `(dx, dy)`, clipping against the level.
    ///
    /// Returns whether the entity moved, following its sliding policy.
    /// Unknown and removed entities never move.
    pub fn move_entity(&mut self, id: EntityId, dx: f64, dy: f64) -> bool {
        let candidates = self.clip_boxes(id, dx, dy);
        self.move_entity_among(id, dx, dy, &candidates)
    }

    /// Like [`Level::move_entity`] but against caller-supplied candidates.
    ///
    /// The x step runs first, then the y step from the updated position.
    /// If a collision callback removes the mover, the remaining step is
    /// skipped.
    pub fn move_entity_among(
        &mut self,
        id: EntityId,
        dx: f64,
        dy: f64,
        candidates: &[BoundingBox],
    ) -> bool {
        let Some(slide) = self
            .entities
            .get(&id)
            .filter(|e| !e.body.is_removed())
            .map(|e| e.body.physics_slide)
        else {
            return false;
        };
        let policy = MovePolicy::for_request(slide, dx, dy);
        let mut moved = policy.initial();
        for (axis, amount) in [(Axis::X, dx), (Axis::Y, dy)] {
            if !self.is_live(id) {
                break;
            }
            let step = self.part_move(id, candidates, axis, amount);
            moved = policy.fold(moved, step);
        }
        moved
    }

    fn part_move(
        &mut self,
        id: EntityId,
        candidates: &[BoundingBox],
        axis: Axis,
        amount: f64,
    ) -> bool {
        let Some(from) = self.body(id).map(Body::bounding_box) else {
            return false;
        };
        let clip = clip_axis(&from, candidates, axis, amount);
        if let Some(owner) = clip.blocker.and_then(|bb| bb.owner) {
            let (dx, dy) = axis.components(amount);
            self.dispatch_collision(owner, id, dx, dy);
        }
        let (dx, dy) = axis.components(clip.allowed);
        self.body_mut(id).is_some_and(|body| body.displace(dx, dy))
    }

    fn dispatch_collision(&mut self, owner: EntityId, mover: EntityId, dx: f64, dy: f64) {
        if owner == mover {
            trace!("{mover:?} clipped against its own box");
            return;
        }
        let Some([owner_entity, mover_entity]) = self.entities.get_many_mut([&owner, &mover])
        else {
            warn!("collision with unknown entity {owner:?} ignored");
            return;
        };
        if owner_entity.body.is_removed() {
            trace!("{mover:?} hit removed {owner:?}; no dispatch");
            return;
        }
        let mut ctx = CollideContext::default();
        let blocked = handle_collision(owner_entity, mover_entity, dx, dy, &mut ctx);
        trace!("{mover:?} hit {owner:?} along ({dx}, {dy}); blocked: {blocked}");
        self.apply_collide_requests(&ctx);
    }

    fn apply_collide_requests(&mut self, ctx: &CollideContext) {
        for &target in ctx.hurts() {
            if let Err(err) = self.hurt(target) {
                warn!("contact hurt dropped: {err}");
            }
        }
        for &target in ctx.removals() {
            if let Err(err) = self.remove(target) {
                warn!("contact removal dropped: {err}");
            }
        }
    }

    /// Flags an entity for removal at the end of the tick.
    ///
    /// # Errors
    /// Returns [`LevelError::UnknownEntity`] for an unknown handle.
    pub fn remove(&mut self, id: EntityId) -> Result<(), LevelError> {
        let body = self.body_mut(id).ok_or(LevelError::UnknownEntity(id))?;
        body.remove();
        Ok(())
    }

    /// Runs an entity's hurt hook.
    ///
    /// An entity hurt during its own tick receives the hit as soon as its
    /// tick returns. Entities without a behaviour shrug the hit off.
    ///
    /// # Errors
    /// Returns [`LevelError::UnknownEntity`] for an unknown handle.
    pub fn hurt(&mut self, id: EntityId) -> Result<(), LevelError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(LevelError::UnknownEntity(id))?;
        match entity.behaviour.as_deref_mut() {
            Some(behaviour) => behaviour.hurt(&mut entity.body),
            None if entity.ticking => {
                entity.pending_hurts += 1;
                trace!("{id:?} hurt mid-tick; deferred");
            }
            None => debug!("{id:?} has no behaviour to hurt"),
        }
        Ok(())
    }

    /// Teleports an entity; `None` leaves it in place.
    ///
    /// # Errors
    /// Returns [`LevelError::UnknownEntity`] for an unknown handle.
    pub fn set_pos(&mut self, id: EntityId, position: Option<DVec2>) -> Result<(), LevelError> {
        let body = self.body_mut(id).ok_or(LevelError::UnknownEntity(id))?;
        body.place(position);
        Ok(())
    }

    /// Advances every live entity by one frame, then drops removed ones.
    ///
    /// Entities tick in spawn order. An entity removed earlier in the same
    /// tick is skipped.
    pub fn tick(&mut self) {
        let order = self.order.clone();
        for id in order {
            let Some(entity) = self
                .entities
                .get_mut(&id)
                .filter(|e| !e.body.is_removed())
            else {
                continue;
            };
            let Some(mut behaviour) = entity.behaviour.take() else {
                continue;
            };
            entity.ticking = true;
            behaviour.tick(&mut TickContext { level: self, id });
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.ticking = false;
                for _ in 0..std::mem::take(&mut entity.pending_hurts) {
                    behaviour.hurt(&mut entity.body);
                }
                entity.behaviour = Some(behaviour);
            }
        }
        self.compact();
        self.tick_count += 1;
    }

    fn compact(&mut self) {
        let entities = &mut self.entities;
        let before = self.order.len();
        self.order.retain(|id| {
            let live = entities.get(id).is_some_and(|e| !e.body.is_removed());
            if !live {
                entities.remove(id);
            }
            live
        });
        let dropped = before - self.order.len();
        if dropped > 0 {
            debug!("compacted {dropped} removed entities from {:?}", self.id);
        }
    }

    /// Draws every live entity.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        for entity in self.live_entities() {
            match entity.behaviour.as_deref() {
                Some(behaviour) => behaviour.render(&entity.body, surface),
                None => render_filler(&entity.body, surface),
            }
        }
    }

    /// Draws the overlay pass of every live entity.
    pub fn render_top(&self, surface: &mut dyn RenderSurface) {
        for entity in self.live_entities() {
            if let Some(behaviour) = entity.behaviour.as_deref() {
                behaviour.render_top(&entity.body, surface);
            }
        }
    }
}

/// What a ticking behaviour may do to its level.
pub struct TickContext<'a> {
    level: &'a mut Level,
    id: EntityId,
}

impl TickContext<'_> {
    /// The ticking entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// The ticking entity's body.
    #[must_use]
    pub fn body(&self) -> Option<&Body> {
        self.level.body(self.id)
    }

    /// Mutable access to the ticking entity's body.
    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.level.body_mut(self.id)
    }

    /// Read-only view of the whole level.
    #[must_use]
    pub fn level(&self) -> &Level {
        &*self.level
    }

    /// Moves the ticking entity; see [`Level::move_entity`].
    pub fn move_by(&mut self, dx: f64, dy: f64) -> bool {
        self.level.move_entity(self.id, dx, dy)
    }

    /// Hurts another entity; see [`Level::hurt`].
    ///
    /// # Errors
    /// Returns [`LevelError::UnknownEntity`] for an unknown handle.
    pub fn hurt(&mut self, target: EntityId) -> Result<(), LevelError> {
        self.level.hurt(target)
    }

    /// Flags another entity for removal; see [`Level::remove`].
    ///
    /// # Errors
    /// Returns [`LevelError::UnknownEntity`] for an unknown handle.
    pub fn remove(&mut self, target: EntityId) -> Result<(), LevelError> {
        self.level.remove(target)
    }

    /// Flags the ticking entity for removal.
    pub fn remove_self(&mut self) {
        if let Some(body) = self.body_mut() {
            body.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::MockCollisionResponder;
    use crate::render::{Screen, SpriteId};
    use approx::assert_abs_diff_eq;
    use rstest::{fixture, rstest};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(EntityId, f64, f64)>>>;

    struct Recorder {
        log: Log,
        remove_other: bool,
    }

    impl CollisionResponder for Recorder {
        fn collide(
            &mut self,
            _me: &mut Body,
            other: &mut Body,
            dx: f64,
            dy: f64,
            _ctx: &mut CollideContext,
        ) {
            if let Some(id) = other.id() {
                self.log.lock().expect("log lock").push((id, dx, dy));
            }
            if self.remove_other {
                other.remove();
            }
        }
    }

    #[fixture]
    fn level() -> Level {
        Level::default()
    }

    fn pos(level: &Level, id: EntityId) -> DVec2 {
        level.body(id).map(|b| b.pos).expect("body present")
    }

    #[rstest]
    fn unobstructed_move_applies_full_displacement(mut level: Level) {
        let id = level.spawn(Body::at(100.0, 100.0)).expect("spawn");
        assert!(level.move_entity(id, 7.5, 0.0));
        assert_abs_diff_eq!(pos(&level, id).x, 107.5, epsilon = 1e-9);
        assert_abs_diff_eq!(pos(&level, id).y, 100.0);
    }

    #[rstest]
    fn static_wall_clips_without_dispatch(mut level: Level) {
        let id = level.spawn(Body::at(100.0, 100.0)).expect("spawn");
        level.add_static_box(115.0, 95.0, 125.0, 105.0);
        assert!(level.move_entity(id, 20.0, 0.0));
        assert_abs_diff_eq!(pos(&level, id).x, 104.99, epsilon = 1e-9);
    }

    #[rstest]
    fn owned_box_runs_paired_callbacks(mut level: Level) {
        let mut owner_mock = MockCollisionResponder::new();
        owner_mock.expect_should_block().return_const(true);
        owner_mock
            .expect_collide()
            .withf(|_, _, dx, dy, _| (*dx - 20.0).abs() < 1e-9 && dy.abs() < 1e-9)
            .times(1)
            .return_const(());
        let mut mover_mock = MockCollisionResponder::new();
        mover_mock.expect_should_block().return_const(true);
        mover_mock
            .expect_collide()
            .withf(|_, _, dx, dy, _| (*dx + 20.0).abs() < 1e-9 && dy.abs() < 1e-9)
            .times(1)
            .return_const(());

        let mut owner_body = Body::at(125.0, 100.0);
        owner_body.set_size(10, 5);
        level
            .spawn_with(owner_body, None, Some(Box::new(owner_mock)))
            .expect("spawn owner");
        let mover = level
            .spawn_with(Body::at(100.0, 100.0), None, Some(Box::new(mover_mock)))
            .expect("spawn mover");

        assert!(level.move_entity(mover, 20.0, 0.0));
        assert_abs_diff_eq!(pos(&level, mover).x, 104.99, epsilon = 1e-9);
    }

    #[rstest]
    fn non_mutual_contact_clips_but_stays_silent(mut level: Level) {
        let mut ghost_mock = MockCollisionResponder::new();
        ghost_mock.expect_should_block().return_const(true);
        ghost_mock.expect_collide().times(0);
        let mut ghost = Body::at(125.0, 100.0);
        ghost.is_blocking = false;
        let ghost_id = level
            .spawn_with(ghost, None, Some(Box::new(ghost_mock)))
            .expect("spawn ghost");
        let mover = level.spawn(Body::at(100.0, 100.0)).expect("spawn mover");

        assert!(level.clip_boxes(mover, 20.0, 0.0).is_empty());

        let ghost_box = level.body(ghost_id).map(Body::bounding_box).expect("ghost");
        assert!(level.move_entity_among(mover, 20.0, 0.0, &[ghost_box]));
        assert_abs_diff_eq!(pos(&level, mover).x, 104.99, epsilon = 1e-9);
    }

    #[rstest]
    fn diagonal_without_slide_fails_when_one_axis_is_blocked(mut level: Level) {
        let mut body = Body::at(100.0, 100.0);
        body.physics_slide = false;
        let id = level.spawn(body).expect("spawn");
        level.add_static_box(80.0, 110.0, 120.0, 130.0);
        assert!(!level.move_entity(id, 5.0, 5.0));
        assert_abs_diff_eq!(pos(&level, id).x, 105.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pos(&level, id).y, 100.0);
    }

    #[rstest]
    fn diagonal_with_slide_reports_partial_progress(mut level: Level) {
        let id = level.spawn(Body::at(100.0, 100.0)).expect("spawn");
        level.add_static_box(80.0, 110.0, 120.0, 130.0);
        assert!(level.move_entity(id, 5.0, 5.0));
        assert_abs_diff_eq!(pos(&level, id).x, 105.0, epsilon = 1e-9);
    }

    #[rstest]
    fn removed_entity_does_not_move(mut level: Level) {
        let id = level.spawn(Body::at(0.0, 0.0)).expect("spawn");
        level.remove(id).expect("remove");
        assert!(!level.move_entity(id, 3.0, 3.0));
        assert_eq!(pos(&level, id), DVec2::ZERO);
        assert!(!level.move_entity(EntityId(999), 1.0, 0.0));
    }

    #[rstest]
    fn removal_in_callback_skips_second_axis(mut level: Level) {
        let log = Log::default();
        let wall = Recorder {
            log: Arc::clone(&log),
            remove_other: true,
        };
        level
            .spawn_with(Body::at(125.0, 100.0), None, Some(Box::new(wall)))
            .expect("spawn wall");
        let mover = level.spawn(Body::at(100.0, 100.0)).expect("spawn mover");

        assert!(level.move_entity(mover, 20.0, 20.0));
        let after = pos(&level, mover);
        assert_abs_diff_eq!(after.x, 104.99, epsilon = 1e-9);
        assert_abs_diff_eq!(after.y, 100.0);
        assert!(level.body(mover).is_some_and(Body::is_removed));
        assert_eq!(log.lock().expect("log lock").len(), 1);
    }

    #[rstest]
    fn overlapping_entity_can_slide_free(mut level: Level) {
        let id = level.spawn(Body::at(100.0, 100.0)).expect("spawn");
        level.add_static_box(109.995, 95.0, 130.0, 105.0);
        assert!(level.move_entity(id, 5.0, 0.0));
        assert_abs_diff_eq!(pos(&level, id).x, 105.0, epsilon = 1e-9);
    }

    #[rstest]
    fn clip_boxes_filters_region_self_and_removed(mut level: Level) {
        let mover = level.spawn(Body::at(100.0, 100.0)).expect("spawn");
        let near = level.spawn(Body::at(140.0, 100.0)).expect("spawn");
        let gone = level.spawn(Body::at(60.0, 100.0)).expect("spawn");
        level.spawn(Body::at(1000.0, 1000.0)).expect("spawn");
        level.add_solid_tile(4, 3);
        level.add_solid_tile(40, 40);
        level.remove(gone).expect("remove");

        let boxes = level.clip_boxes(mover, 5.0, 0.0);
        let owners: Vec<_> = boxes.iter().map(|bb| bb.owner).collect();
        assert_eq!(owners, vec![None, Some(near)]);
        assert_eq!(boxes.first().map(|bb| bb.x0), Some(128.0));
    }

    #[rstest]
    fn clip_region_grows_with_displacement(mut level: Level) {
        let mover = level.spawn(Body::at(0.0, 0.0)).expect("spawn");
        level.add_static_box(200.0, -5.0, 210.0, 5.0);
        assert!(level.clip_boxes(mover, 10.0, 0.0).is_empty());
        assert_eq!(level.clip_boxes(mover, 300.0, 0.0).len(), 1);
        assert!(level.move_entity(mover, 300.0, 0.0));
        assert_abs_diff_eq!(pos(&level, mover).x, 189.99, epsilon = 1e-9);
    }

    #[rstest]
    fn spawning_a_bound_body_fails(mut level: Level) {
        let id = level.spawn(Body::default()).expect("spawn");
        let copy = level.body(id).cloned().expect("body");
        assert_eq!(
            level.spawn(copy),
            Err(LevelError::AlreadyBound { level: level.id() })
        );
    }

    #[rstest]
    fn operations_on_unknown_ids_fail(mut level: Level) {
        let ghost = EntityId(42);
        assert_eq!(level.remove(ghost), Err(LevelError::UnknownEntity(ghost)));
        assert_eq!(level.hurt(ghost), Err(LevelError::UnknownEntity(ghost)));
        assert_eq!(
            level.set_pos(ghost, None),
            Err(LevelError::UnknownEntity(ghost))
        );
    }

    #[rstest]
    fn set_pos_none_is_a_no_op(mut level: Level) {
        let id = level.spawn(Body::at(5.0, 6.0)).expect("spawn");
        level.set_pos(id, None).expect("set_pos");
        assert_eq!(pos(&level, id), DVec2::new(5.0, 6.0));
        level.set_pos(id, Some(DVec2::new(1.0, 2.0))).expect("set_pos");
        assert_eq!(pos(&level, id), DVec2::new(1.0, 2.0));
    }

    struct Stepper;

    impl Behaviour for Stepper {
        fn init(&mut self, body: &mut Body) {
            body.xd = 2.0;
        }

        fn tick(&mut self, ctx: &mut TickContext<'_>) {
            let dx = ctx.body().map_or(0.0, |b| b.xd);
            ctx.move_by(dx, 0.0);
        }

        fn render(&self, body: &Body, surface: &mut dyn RenderSurface) {
            surface.draw(SpriteId(7), body.pos.x, body.pos.y);
        }
    }

    struct SelfDestruct;

    impl Behaviour for SelfDestruct {
        fn tick(&mut self, ctx: &mut TickContext<'_>) {
            ctx.remove_self();
        }
    }

    #[rstest]
    fn tick_runs_behaviours_and_compacts(mut level: Level) {
        let stepper = level
            .spawn_with(Body::at(0.0, 0.0), Some(Box::new(Stepper)), None)
            .expect("spawn");
        let doomed = level
            .spawn_with(Body::at(500.0, 0.0), Some(Box::new(SelfDestruct)), None)
            .expect("spawn");
        assert_eq!(level.len(), 2);

        level.tick();
        level.tick();

        assert_eq!(level.tick_count(), 2);
        assert_eq!(level.len(), 1);
        assert!(level.body(doomed).is_none());
        assert_abs_diff_eq!(pos(&level, stepper).x, 4.0, epsilon = 1e-9);
    }

    /// Hurts itself every tick and counts the hits it takes.
    struct Spiky {
        hits: Arc<AtomicU32>,
    }

    impl Behaviour for Spiky {
        fn tick(&mut self, ctx: &mut TickContext<'_>) {
            let me = ctx.id();
            ctx.hurt(me).expect("self is known");
        }

        fn hurt(&mut self, _body: &mut Body) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[rstest]
    fn self_hurt_during_tick_is_delivered_after_it(mut level: Level) {
        let hits = Arc::new(AtomicU32::new(0));
        let id = level
            .spawn_with(
                Body::at(0.0, 0.0),
                Some(Box::new(Spiky {
                    hits: Arc::clone(&hits),
                })),
                None,
            )
            .expect("spawn");

        level.tick();
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        level.tick();
        level.hurt(id).expect("hurt");
        assert_eq!(hits.load(Ordering::Relaxed), 3);
    }

    #[rstest]
    fn static_boxes_keep_insertion_order(mut level: Level) {
        level.add_static_box(1.0, 2.0, 3.0, 4.0);
        level.add_solid_tile(0, 0);
        let edges: Vec<_> = level
            .static_boxes()
            .iter()
            .map(|bb| (bb.x0, bb.y0, bb.x1, bb.y1))
            .collect();
        assert_eq!(edges, vec![(1.0, 2.0, 3.0, 4.0), (0.0, 0.0, 32.0, 32.0)]);
    }

    #[rstest]
    fn render_skips_removed_and_uses_behaviour(mut level: Level) {
        level
            .spawn_with(Body::at(10.0, 20.0), Some(Box::new(Stepper)), None)
            .expect("spawn");
        let plain = level.spawn(Body::at(100.0, 100.0)).expect("spawn");
        let hidden = level.spawn(Body::at(50.0, 50.0)).expect("spawn");
        level.remove(hidden).expect("remove");
        let before: Vec<_> = level.bodies().cloned().collect();

        let mut screen = Screen::new(320, 240);
        level.render(&mut screen);
        level.render_top(&mut screen);

        let drawn: Vec<_> = screen
            .commands()
            .iter()
            .map(|c| (c.sprite, c.x, c.y))
            .collect();
        assert_eq!(
            drawn,
            vec![(SpriteId(7), 10, 20), (SpriteId::ENTITY_FILLER, 84, 76)]
        );
        let after: Vec<_> = level.bodies().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(after.len(), 2);
        assert!(level.body(plain).is_some());
    }
}
