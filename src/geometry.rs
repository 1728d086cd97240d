//! Axis-aligned bounding boxes used by the clip routine.
//!
//! Boxes carry an optional owner: `None` marks inert static geometry, while
//! `Some(id)` names the entity that answers for contact with the box.
use glam::DVec2;
use serde::Serialize;

use crate::entity::EntityId;

/// Axis-aligned rectangle with an optional owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
    /// Entity responsible for contact with this box, if any.
    pub owner: Option<EntityId>,
}

impl BoundingBox {
    /// Creates an ownerless box from its edges.
    ///
    /// Edges must satisfy `x0 <= x1` and `y0 <= y1`; inverted boxes are a
    /// construction bug and never intersect anything sensibly.
    ///
    /// # Examples
    /// ```
    /// use tileclip::BoundingBox;
    /// let wall = BoundingBox::new(115.0, 95.0, 125.0, 105.0);
    /// assert!(wall.owner.is_none());
    /// ```
    #[must_use]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        debug_assert!(x0 <= x1 && y0 <= y1, "inverted bounding box");
        Self {
            x0,
            y0,
            x1,
            y1,
            owner: None,
        }
    }

    /// Builds the box spanning `centre ± radius`.
    #[must_use]
    pub fn around(centre: DVec2, radius: DVec2) -> Self {
        let min = centre - radius;
        let max = centre + radius;
        Self::new(min.x, min.y, max.x, max.y)
    }

    /// Returns a copy of the box attributed to `owner`.
    #[must_use]
    pub const fn owned_by(self, owner: EntityId) -> Self {
        Self {
            owner: Some(owner),
            ..self
        }
    }

    /// Returns `true` when both boxes overlap on both axes.
    ///
    /// Touching edges do not count as an intersection.
    ///
    /// # Examples
    /// ```
    /// use tileclip::BoundingBox;
    /// let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    /// assert!(a.intersects(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
    /// assert!(!a.intersects(&BoundingBox::new(10.0, 0.0, 20.0, 10.0)));
    /// ```
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersects_rect(other.x0, other.y0, other.x1, other.y1)
    }

    /// Edge-wise variant of [`BoundingBox::intersects`].
    #[must_use]
    pub fn intersects_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
        !(x0 >= self.x1 || y0 >= self.y1 || x1 <= self.x0 || y1 <= self.y0)
    }

    /// Expands the box by `dx` horizontally and `dy` vertically on each side.
    #[must_use]
    pub fn grow(&self, dx: f64, dy: f64) -> Self {
        Self {
            x0: self.x0 - dx,
            y0: self.y0 - dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            owner: self.owner,
        }
    }

    /// Width and height of the box.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.x1 - self.x0, self.y1 - self.y0)
    }
}
