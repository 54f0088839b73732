/// Level: the complete state of one running episode.
///
/// ## Layers
///
///   - `map`        : the terrain as loaded. Never mutated after load.
///   - entities     : player, enemies, bullets, powerups, explosions, portal.
///   - outcome      : `game_over` / `victory` flags read by the screen.
///
/// `update()` (see `step.rs`) is the only mutator once the level is built,
/// and it does nothing after either outcome flag is set.

use crate::config::GameConfig;
use crate::domain::entity::{Bullet, Enemy, ExitPortal, Explosion, Player, Powerup};
use crate::domain::tile::TileMap;

/// Tuning values copied out of the config when a level is built, so the
/// simulation never reaches back into the global configuration.
#[derive(Clone, Debug)]
pub struct LevelRules {
    pub gravity: f32,
    pub walk_speed: f32,
    pub jump_speed: f32,
    pub max_jump_duration: f32,
    pub knockback_x: f32,
    pub knockback_y: f32,
    pub bullet_speed: f32,
    pub enemy_speed: f32,
    pub kill_plane_margin: f32,
    pub enemy_hit_score: u32,
    pub enemy_kill_score: u32,
    pub powerup_score: u32,
    pub powerup_ammo: u32,
}

impl LevelRules {
    pub fn from_config(config: &GameConfig) -> Self {
        let p = &config.physics;
        let s = &config.scoring;
        LevelRules {
            gravity: p.gravity,
            walk_speed: p.walk_speed,
            jump_speed: p.jump_speed,
            max_jump_duration: p.max_jump_duration,
            knockback_x: p.knockback_x,
            knockback_y: p.knockback_y,
            bullet_speed: p.bullet_speed,
            enemy_speed: p.enemy_speed,
            kill_plane_margin: p.kill_plane_margin,
            enemy_hit_score: s.enemy_hit_score,
            enemy_kill_score: s.enemy_kill_score,
            powerup_score: s.powerup_score,
            powerup_ammo: s.powerup_ammo,
        }
    }
}

pub struct Level {
    pub name: String,
    pub map: TileMap,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub powerups: Vec<Powerup>,
    pub explosions: Vec<Explosion>,
    pub exit_portal: ExitPortal,

    // ── Tracking ──
    pub score: u32,
    /// Seconds of simulated time since the level started.
    pub elapsed: f32,
    pub game_over: bool,
    pub victory: bool,

    pub rules: LevelRules,
}

impl Level {
    pub fn width(&self) -> usize {
        self.map.width
    }

    pub fn height(&self) -> usize {
        self.map.height
    }

    /// Has the episode reached an outcome?
    pub fn is_finished(&self) -> bool {
        self.game_over || self.victory
    }

    /// Rows below the map past which a fall costs a life.
    pub fn kill_plane(&self) -> f32 {
        self.map.height as f32 + self.rules.kill_plane_margin
    }
}
