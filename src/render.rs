//! Drawing contract for entity render hooks.
//!
//! Pixel blitting lives outside this crate. Hooks talk to a
//! [`RenderSurface`]; [`Screen`] is an in-memory surface that records what
//! would have been drawn, which is what the binary and the tests use.
use crate::numeric::truncate_to_i32;

/// Handle to a sprite in the game's art tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

impl SpriteId {
    /// Placeholder art drawn for entities without their own sprite.
    pub const ENTITY_FILLER: Self = Self(0);
}

/// Target for entity render hooks.
pub trait RenderSurface {
    /// Draws `sprite` with its top-left corner at world `(x, y)`.
    fn draw(&mut self, sprite: SpriteId, x: f64, y: f64);
}

/// A single recorded draw call in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    /// Sprite that was drawn.
    pub sprite: SpriteId,
    /// Left edge in screen pixels.
    pub x: i32,
    /// Top edge in screen pixels.
    pub y: i32,
}

/// Fixed-size screen that records draw calls relative to a camera offset.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    width: u32,
    height: u32,
    x_offset: i32,
    y_offset: i32,
    commands: Vec<DrawCommand>,
}

impl Screen {
    /// Creates an empty screen of `width` x `height` pixels.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            commands: Vec::new(),
        }
    }

    /// Screen dimensions in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sets the camera offset subtracted from every subsequent draw.
    pub fn set_offset(&mut self, x_offset: i32, y_offset: i32) {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
    }

    /// Draw calls recorded since the last [`Screen::clear`].
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Forgets all recorded draw calls.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSurface for Screen {
    fn draw(&mut self, sprite: SpriteId, x: f64, y: f64) {
        self.commands.push(DrawCommand {
            sprite,
            x: truncate_to_i32(x).saturating_sub(self.x_offset),
            y: truncate_to_i32(y).saturating_sub(self.y_offset),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn draw_truncates_world_coordinates() {
        let mut screen = Screen::new(320, 240);
        screen.draw(SpriteId(4), 84.99, -7.5);
        assert_eq!(
            screen.commands(),
            &[DrawCommand {
                sprite: SpriteId(4),
                x: 84,
                y: -7
            }]
        );
    }

    #[rstest]
    fn draw_applies_camera_offset() {
        let mut screen = Screen::new(320, 240);
        screen.set_offset(100, 50);
        screen.draw(SpriteId::ENTITY_FILLER, 120.0, 60.0);
        let cmd = screen.commands().first().copied();
        assert_eq!(cmd.map(|c| (c.x, c.y)), Some((20, 10)));
    }

    #[rstest]
    fn clear_discards_commands() {
        let mut screen = Screen::new(8, 8);
        screen.draw(SpriteId(1), 0.0, 0.0);
        screen.clear();
        assert!(screen.commands().is_empty());
        assert_eq!(screen.size(), (8, 8));
    }
}
