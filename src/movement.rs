//! Axis-separated sweep-and-clip.
//!
//! A requested displacement is resolved one axis at a time: the x component
//! is clipped against every candidate box first, applied, and then the y
//! component is clipped from the updated position. Each axis step leaves
//! [`CLIP_EPSILON`] of clearance in front of whatever stopped it.
//!
//! The routines here are pure; [`Level`](crate::level::Level) owns the
//! side effects (applying the step and dispatching collisions).

use crate::constants::CLIP_EPSILON;
use crate::geometry::BoundingBox;

/// Axis a single clip step runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal motion.
    X,
    /// Vertical motion.
    Y,
}

impl Axis {
    /// Splits an amount along this axis into an `(dx, dy)` pair.
    #[must_use]
    pub const fn components(self, amount: f64) -> (f64, f64) {
        match self {
            Self::X => (amount, 0.0),
            Self::Y => (0.0, amount),
        }
    }
}

/// Outcome of clipping one axis of a displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisClip {
    /// Displacement that may be applied along the axis.
    pub allowed: f64,
    /// Last candidate that shortened the step, if any.
    pub blocker: Option<BoundingBox>,
}

/// Edges of `bb` as `(near, far)` along `axis` and `(near, far)` across it.
const fn spans(bb: &BoundingBox, axis: Axis) -> ((f64, f64), (f64, f64)) {
    match axis {
        Axis::X => ((bb.x0, bb.x1), (bb.y0, bb.y1)),
        Axis::Y => ((bb.y0, bb.y1), (bb.x0, bb.x1)),
    }
}

/// Clips `amount` of motion along `axis` for a mover occupying `from`.
///
/// Candidates are visited in the given order. Boxes that already overlap
/// `from` are ignored, as are boxes whose span across the axis does not
/// overlap the mover. Each remaining box that would be entered shortens the
/// step to its gap less [`CLIP_EPSILON`] (never reversing direction) and
/// becomes the reported blocker, so a later blocker replaces an earlier one.
///
/// # Examples
/// ```
/// use tileclip::movement::{clip_axis, Axis};
/// use tileclip::BoundingBox;
///
/// let mover = BoundingBox::new(90.0, 90.0, 110.0, 110.0);
/// let wall = BoundingBox::new(115.0, 95.0, 125.0, 105.0);
/// let clip = clip_axis(&mover, &[wall], Axis::X, 20.0);
/// assert!((clip.allowed - 4.99).abs() < 1e-9);
/// assert_eq!(clip.blocker, Some(wall));
/// ```
#[must_use]
pub fn clip_axis(from: &BoundingBox, candidates: &[BoundingBox], axis: Axis, amount: f64) -> AxisClip {
    let ((from_near, from_far), (from_lo, from_hi)) = spans(from, axis);
    let mut allowed = amount;
    let mut blocker = None;

    for to in candidates {
        if from.intersects(to) {
            continue;
        }
        let ((to_near, to_far), (to_lo, to_hi)) = spans(to, axis);
        if to_lo >= from_hi || to_hi <= from_lo {
            continue;
        }
        if allowed > 0.0 {
            let gap = to_near - from_far;
            if gap >= 0.0 && allowed > gap {
                blocker = Some(*to);
                allowed = (gap - CLIP_EPSILON).max(0.0);
            }
        } else if allowed < 0.0 {
            let gap = to_far - from_near;
            if gap <= 0.0 && allowed < gap {
                blocker = Some(*to);
                allowed = (gap + CLIP_EPSILON).min(0.0);
            }
        }
    }

    AxisClip { allowed, blocker }
}

/// How the per-axis results of a move combine into a single verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePolicy {
    /// Either axis progressing counts as movement.
    Slide,
    /// Both axes must progress for the move to count.
    AllOrNothing,
}

impl MovePolicy {
    /// Picks the policy for a requested displacement.
    ///
    /// Sliding bodies and single-axis requests always slide; a diagonal
    /// request from a non-sliding body is all-or-nothing.
    #[must_use]
    pub fn for_request(physics_slide: bool, dx: f64, dy: f64) -> Self {
        if physics_slide || dx == 0.0 || dy == 0.0 {
            Self::Slide
        } else {
            Self::AllOrNothing
        }
    }

    /// Folds an axis result into the running verdict.
    #[must_use]
    pub const fn fold(self, acc: bool, axis_moved: bool) -> bool {
        match self {
            Self::Slide => acc || axis_moved,
            Self::AllOrNothing => acc && axis_moved,
        }
    }

    /// Verdict before any axis has been processed.
    #[must_use]
    pub const fn initial(self) -> bool {
        matches!(self, Self::AllOrNothing)
    }
}
