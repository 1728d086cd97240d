//! Headless demo: a patrolling guard walks a walled corridor, picks up a
//! coin, gets pricked by spikes and bumps into the far wall, then the final
//! state is logged.
use anyhow::Context;
use bevy::prelude::App;
use clap::Parser;
use log::{debug, info};
use tileclip::{
    init_logging, Behaviour, Body, CollideContext, CollisionResponder, Level, LevelPlugin,
    LevelSettings, TickContext, TILE_WIDTH,
};

/// Axis-separated movement demo
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Number of frames to simulate
    #[arg(long, default_value_t = 120)]
    ticks: u32,
    /// Extra search distance around movers when gathering candidate boxes
    #[arg(long, default_value_t = TILE_WIDTH)]
    clip_margin: f64,
}

/// Walks along x and turns around whenever a step is fully blocked.
struct Patrol {
    speed: f64,
    health: u32,
}

impl Behaviour for Patrol {
    fn init(&mut self, body: &mut Body) {
        body.xd = self.speed;
    }

    fn hurt(&mut self, body: &mut Body) {
        self.health = self.health.saturating_sub(1);
        info!("{:?} hurt; health {}", body.id(), self.health);
        if self.health == 0 {
            body.remove();
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let Some((xd, yd)) = ctx.body().map(|b| (b.xd, b.yd)) else {
            return;
        };
        if !ctx.move_by(xd, yd) {
            let id = ctx.id();
            if let Some(body) = ctx.body_mut() {
                body.xd = -body.xd;
                info!("{id:?} turned around at x={:.2}", body.pos.x);
            }
        }
    }
}

/// Disappears when touched.
struct Coin;

impl CollisionResponder for Coin {
    fn collide(
        &mut self,
        me: &mut Body,
        other: &mut Body,
        _dx: f64,
        _dy: f64,
        _ctx: &mut CollideContext,
    ) {
        info!("coin {:?} picked up by {:?}", me.id(), other.id());
        me.remove();
    }
}

/// Hurts whatever walks into it.
struct Spikes;

impl CollisionResponder for Spikes {
    fn collide(
        &mut self,
        _me: &mut Body,
        other: &mut Body,
        _dx: f64,
        _dy: f64,
        ctx: &mut CollideContext,
    ) {
        if let Some(victim) = other.id() {
            ctx.hurt(victim);
        }
    }
}

fn build_corridor(level: &mut Level) -> anyhow::Result<()> {
    for row in [0, 2] {
        for col in 0..12 {
            level.add_solid_tile(col, row);
        }
    }
    level.add_solid_tile(0, 1);
    level.add_solid_tile(11, 1);

    let mut guard = Body::at(64.0, 48.0);
    guard.set_size(8, 8);
    guard.team = 1;
    level
        .spawn_with(
            guard,
            Some(Box::new(Patrol {
                speed: 3.0,
                health: 3,
            })),
            None,
        )
        .context("spawning guard")?;

    let mut coin = Body::at(160.0, 48.0);
    coin.set_size(4, 4);
    coin.minimap_color = Some(0x00ff_d700);
    level
        .spawn_with(coin, None, Some(Box::new(Coin)))
        .context("spawning coin")?;

    let mut spikes = Body::at(40.0, 48.0);
    spikes.set_size(4, 8);
    level
        .spawn_with(spikes, None, Some(Box::new(Spikes)))
        .context("spawning spikes")?;
    debug!("corridor built from {} tiles", level.static_boxes().len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut app = App::new();
    app.add_plugins(LevelPlugin::new(LevelSettings {
        clip_margin: args.clip_margin,
    }));
    build_corridor(&mut app.world_mut().resource_mut::<Level>())?;

    for _ in 0..args.ticks {
        app.update();
    }

    let level = app.world().resource::<Level>();
    let bodies: Vec<&Body> = level.bodies().collect();
    info!(
        "after {} ticks: {}",
        level.tick_count(),
        serde_json::to_string(&bodies).context("serialising bodies")?
    );
    Ok(())
}
