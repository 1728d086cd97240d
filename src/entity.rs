//! Entity identifiers and the per-entity physical state.
use glam::DVec2;
use serde::Serialize;

use crate::constants::DEFAULT_RADIUS;
use crate::geometry::BoundingBox;

/// Stable handle to an entity inside its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

/// Opaque handle naming the level a body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LevelId(pub u32);

/// Physical state of a game entity.
///
/// The level owns every `Body`; behaviours and responders only ever see it
/// by reference. Removal is soft: [`Body::remove`] flags the body and the
/// level drops it at the end of the tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    /// Centre of the entity in world units.
    pub pos: DVec2,
    /// Half-extent on each axis.
    pub radius: DVec2,
    /// Whether this entity takes part in blocking negotiations.
    pub is_blocking: bool,
    /// Whether a blocked diagonal step may still slide along one axis.
    pub physics_slide: bool,
    /// Horizontal intent, in tiles.
    pub xto: i32,
    /// Vertical intent, in tiles.
    pub yto: i32,
    /// Horizontal scratch velocity.
    pub xd: f64,
    /// Vertical scratch velocity.
    pub yd: f64,
    /// Minimap icon index, if the entity shows on the minimap.
    pub minimap_icon: Option<u32>,
    /// Minimap colour, if the entity shows on the minimap.
    pub minimap_color: Option<u32>,
    /// Team the entity fights for.
    pub team: i32,
    removed: bool,
    id: Option<EntityId>,
    level: Option<LevelId>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            pos: DVec2::ZERO,
            radius: DVec2::splat(DEFAULT_RADIUS),
            is_blocking: true,
            physics_slide: true,
            xto: 0,
            yto: 0,
            xd: 0.0,
            yd: 0.0,
            minimap_icon: None,
            minimap_color: None,
            team: 0,
            removed: false,
            id: None,
            level: None,
        }
    }
}

impl Body {
    /// Creates an unbound body at `(x, y)` with the default radius.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        let mut body = Self::default();
        body.set_pos(x, y);
        body
    }

    /// Moves the body to `(x, y)`.
    pub fn set_pos(&mut self, x: f64, y: f64) {
        self.pos = DVec2::new(x, y);
    }

    /// Moves the body to `position`; `None` leaves it where it is.
    ///
    /// # Examples
    /// ```
    /// use glam::DVec2;
    /// use tileclip::Body;
    /// let mut body = Body::at(4.0, 2.0);
    /// body.place(None);
    /// assert_eq!(body.pos, DVec2::new(4.0, 2.0));
    /// body.place(Some(DVec2::new(1.0, 1.0)));
    /// assert_eq!(body.pos, DVec2::new(1.0, 1.0));
    /// ```
    pub fn place(&mut self, position: Option<DVec2>) {
        if let Some(p) = position {
            self.pos = p;
        }
    }

    /// Sets the half-extent of the body.
    pub fn set_size(&mut self, xr: i32, yr: i32) {
        self.radius = DVec2::new(f64::from(xr), f64::from(yr));
    }

    /// Flags the body for removal at the end of the current tick.
    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Whether the body has been flagged for removal.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    /// Identifier assigned when the body was spawned into a level.
    #[must_use]
    pub const fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Level the body is bound to, if any.
    #[must_use]
    pub const fn level(&self) -> Option<LevelId> {
        self.level
    }

    pub(crate) fn bind(&mut self, level: LevelId, id: EntityId) {
        self.level = Some(level);
        self.id = Some(id);
    }

    /// Current bounding box, attributed to this body once it is bound.
    ///
    /// Always derived from the present position and radius.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let bb = BoundingBox::around(self.pos, self.radius);
        match self.id {
            Some(id) => bb.owned_by(id),
            None => bb,
        }
    }

    /// Returns `true` when the body's box overlaps the given edges.
    #[must_use]
    pub fn intersects(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
        self.bounding_box().intersects_rect(x0, y0, x1, y1)
    }

    /// Shifts the body by `(dx, dy)`, reporting whether anything changed.
    pub(crate) fn displace(&mut self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.pos += DVec2::new(dx, dy);
        true
    }
}
