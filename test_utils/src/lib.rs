//! Utility helpers for tests.
//!
//! Fixtures for building bodies and a responder that records every contact
//! it hears about, shared by the integration suites.
use std::sync::{Arc, Mutex, PoisonError};

use glam::DVec2;
use tileclip::{Body, CollideContext, CollisionResponder, EntityId};

/// Default tolerance for comparing world coordinates.
pub const TOLERANCE: f64 = 1e-9;

/// Body centred at `(x, y)` with half-extent `(rx, ry)`.
#[must_use]
pub fn body(x: f64, y: f64, rx: i32, ry: i32) -> Body {
    let mut b = Body::at(x, y);
    b.set_size(rx, ry);
    b
}

/// Assert that `actual` is within [`TOLERANCE`] of `expected` on both axes.
///
/// # Panics
/// Panics with both vectors in the message when they differ.
pub fn assert_pos(actual: DVec2, expected: DVec2) {
    assert!(
        (actual - expected).abs().max_element() < TOLERANCE,
        "expected position {expected:?}, got {actual:?}"
    );
}

/// One contact as seen by a [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The recording entity.
    pub me: Option<EntityId>,
    /// The entity it touched.
    pub other: Option<EntityId>,
    /// Horizontal delta of the contact.
    pub dx: f64,
    /// Vertical delta of the contact.
    pub dy: f64,
}

/// Shared, append-only contact log.
pub type ContactLog = Arc<Mutex<Vec<Contact>>>;

/// Responder that appends every contact to a shared log.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    log: ContactLog,
    blocks: Option<bool>,
}

impl Recorder {
    /// Creates a recorder writing into `log`.
    #[must_use]
    pub const fn new(log: ContactLog) -> Self {
        Self { log, blocks: None }
    }

    /// Creates a recorder whose `should_block` always answers `answer`.
    #[must_use]
    pub const fn with_block_answer(log: ContactLog, answer: bool) -> Self {
        Self {
            log,
            blocks: Some(answer),
        }
    }
}

impl CollisionResponder for Recorder {
    fn should_block(&self, _me: &Body, _other: &Body) -> bool {
        self.blocks.unwrap_or(true)
    }

    fn collide(
        &mut self,
        me: &mut Body,
        other: &mut Body,
        dx: f64,
        dy: f64,
        _ctx: &mut CollideContext,
    ) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Contact {
                me: me.id(),
                other: other.id(),
                dx,
                dy,
            });
    }
}

/// Copies the current contents of a contact log.
#[must_use]
pub fn contacts(log: &ContactLog) -> Vec<Contact> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}
