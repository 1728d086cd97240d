//! Bevy plugin wiring the level tick into the schedule.

use bevy::prelude::{App, Plugin, ResMut, Update};

use crate::level::{Level, LevelSettings};

/// Advances the [`Level`] resource by one tick.
pub fn tick_level_system(mut level: ResMut<Level>) {
    level.tick();
}

/// Bevy plugin installing a [`Level`] resource and ticking it every update.
#[derive(Default)]
pub struct LevelPlugin {
    /// Settings for the level created at build time.
    pub settings: LevelSettings,
}

impl LevelPlugin {
    /// Creates the plugin with explicit level settings.
    #[must_use]
    pub const fn new(settings: LevelSettings) -> Self {
        Self { settings }
    }
}

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Level::new(self.settings));
        app.add_systems(Update, tick_level_system);
    }
}
