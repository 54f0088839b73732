/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub scoring: ScoringConfig,
    pub levels: LevelsConfig,
    pub hud: HudStyle,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    /// How long the game-over / victory overlay stays up before a restart.
    pub level_end_duration: Duration,
}

/// All physics values are in cell units (one terminal cell = 1.0).
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub walk_speed: f32,
    pub jump_speed: f32,
    pub max_jump_duration: f32, // seconds of sustained upward speed while jump is held
    pub knockback_x: f32,
    pub knockback_y: f32,
    pub bullet_speed: f32,
    pub enemy_speed: f32,
    pub kill_plane_margin: f32, // rows below the map before a fall costs a life
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub initial_lives: u32,
    pub initial_ammo: u32,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub enemy_hit_score: u32,
    pub enemy_kill_score: u32,
    pub powerup_score: u32,
    pub powerup_ammo: u32,
    pub enemy_health: u32,
}

#[derive(Clone, Debug)]
pub struct LevelsConfig {
    pub names: Vec<String>,
    pub dir: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HudStyle {
    Classic,
    Compact,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown hud style {0:?} (expected \"classic\" or \"compact\")")]
    HudStyle(String),
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    levels: TomlLevels,
    #[serde(default)]
    hud: TomlHud,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_level_end_duration")]
    level_end_duration: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_walk_speed")]
    walk_speed: f32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_max_jump_duration")]
    max_jump_duration: f32,
    #[serde(default = "default_knockback_x")]
    knockback_x: f32,
    #[serde(default = "default_knockback_y")]
    knockback_y: f32,
    #[serde(default = "default_bullet_speed")]
    bullet_speed: f32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
    #[serde(default = "default_kill_plane_margin")]
    kill_plane_margin: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_initial_lives")]
    initial_lives: u32,
    #[serde(default = "default_initial_ammo")]
    initial_ammo: u32,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_enemy_hit_score")]
    enemy_hit_score: u32,
    #[serde(default = "default_enemy_kill_score")]
    enemy_kill_score: u32,
    #[serde(default = "default_powerup_score")]
    powerup_score: u32,
    #[serde(default = "default_powerup_ammo")]
    powerup_ammo: u32,
    #[serde(default = "default_enemy_health")]
    enemy_health: u32,
}

#[derive(Deserialize, Debug)]
struct TomlLevels {
    #[serde(default = "default_level_names")]
    names: Vec<String>,
    #[serde(default = "default_levels_dir")]
    dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlHud {
    #[serde(default = "default_hud_style")]
    style: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_level_end_duration() -> f32 { 5.0 }
fn default_gravity() -> f32 { 60.0 }
fn default_walk_speed() -> f32 { 8.0 }
fn default_jump_speed() -> f32 { 16.0 }
fn default_max_jump_duration() -> f32 { 0.15 }
fn default_knockback_x() -> f32 { 10.0 }
fn default_knockback_y() -> f32 { 12.0 }
fn default_bullet_speed() -> f32 { 24.0 }
fn default_enemy_speed() -> f32 { 2.0 }
fn default_kill_plane_margin() -> f32 { 4.0 }
fn default_initial_lives() -> u32 { 3 }
fn default_initial_ammo() -> u32 { 10 }
fn default_enemy_hit_score() -> u32 { 25 }
fn default_enemy_kill_score() -> u32 { 100 }
fn default_powerup_score() -> u32 { 50 }
fn default_powerup_ammo() -> u32 { 10 }
fn default_enemy_health() -> u32 { 5 }
fn default_level_names() -> Vec<String> { vec!["Level1".into(), "Level2".into(), "Level3".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_hud_style() -> String { "classic".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            level_end_duration: default_level_end_duration(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            walk_speed: default_walk_speed(),
            jump_speed: default_jump_speed(),
            max_jump_duration: default_max_jump_duration(),
            knockback_x: default_knockback_x(),
            knockback_y: default_knockback_y(),
            bullet_speed: default_bullet_speed(),
            enemy_speed: default_enemy_speed(),
            kill_plane_margin: default_kill_plane_margin(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            initial_lives: default_initial_lives(),
            initial_ammo: default_initial_ammo(),
        }
    }
}

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring {
            enemy_hit_score: default_enemy_hit_score(),
            enemy_kill_score: default_enemy_kill_score(),
            powerup_score: default_powerup_score(),
            powerup_ammo: default_powerup_ammo(),
            enemy_health: default_enemy_health(),
        }
    }
}

impl Default for TomlLevels {
    fn default() -> Self {
        TomlLevels {
            names: default_level_names(),
            dir: default_levels_dir(),
        }
    }
}

impl Default for TomlHud {
    fn default() -> Self {
        TomlHud { style: default_hud_style() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::assemble(TomlConfig::default(), HudStyle::Classic, &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file, missing keys or a broken file all fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();

        match load_toml(&search_dirs) {
            Ok(Some(toml_cfg)) => match GameConfig::from_toml(toml_cfg, &search_dirs) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("{e}; using default settings");
                    GameConfig::default()
                }
            },
            Ok(None) => {
                info!("no config.toml found, using default settings");
                GameConfig::assemble(TomlConfig::default(), HudStyle::Classic, &search_dirs)
            }
            Err(e) => {
                warn!("{e}; using default settings");
                GameConfig::default()
            }
        }
    }

    /// Parse a config from TOML text. Relative level directories are kept
    /// relative (no filesystem lookup).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        GameConfig::from_toml(toml_cfg, &[])
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.timing.tick_rate_ms.max(1))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        let hud = match toml_cfg.hud.style.to_ascii_lowercase().as_str() {
            "classic" => HudStyle::Classic,
            "compact" => HudStyle::Compact,
            other => return Err(ConfigError::HudStyle(other.to_string())),
        };
        Ok(GameConfig::assemble(toml_cfg, hud, search_dirs))
    }

    fn assemble(toml_cfg: TomlConfig, hud: HudStyle, search_dirs: &[PathBuf]) -> Self {

        // Resolve levels directory
        let dir_str = &toml_cfg.levels.dir;
        let dir = if PathBuf::from(dir_str).is_absolute() {
            PathBuf::from(dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(dir_str))
        };

        let mut names = toml_cfg.levels.names;
        if names.is_empty() {
            warn!("levels.names is empty, falling back to the built-in list");
            names = default_level_names();
        }

        // Negative or NaN durations would make the overlay permanent.
        let end_secs = toml_cfg.timing.level_end_duration;
        let end_secs = if end_secs.is_finite() && end_secs >= 0.0 { end_secs } else { default_level_end_duration() };
        let level_end_duration = match Duration::try_from_secs_f32(end_secs) {
            Ok(d) => d,
            Err(e) => {
                warn!(end_secs, error = %e, "timing.level_end_duration out of range, using default");
                Duration::from_secs_f32(default_level_end_duration())
            }
        };

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms,
                level_end_duration,
            },
            physics: PhysicsConfig {
                gravity: toml_cfg.physics.gravity,
                walk_speed: toml_cfg.physics.walk_speed,
                jump_speed: toml_cfg.physics.jump_speed,
                max_jump_duration: toml_cfg.physics.max_jump_duration,
                knockback_x: toml_cfg.physics.knockback_x,
                knockback_y: toml_cfg.physics.knockback_y,
                bullet_speed: toml_cfg.physics.bullet_speed,
                enemy_speed: toml_cfg.physics.enemy_speed,
                kill_plane_margin: toml_cfg.physics.kill_plane_margin,
            },
            player: PlayerConfig {
                initial_lives: toml_cfg.player.initial_lives,
                initial_ammo: toml_cfg.player.initial_ammo,
            },
            scoring: ScoringConfig {
                enemy_hit_score: toml_cfg.scoring.enemy_hit_score,
                enemy_kill_score: toml_cfg.scoring.enemy_kill_score,
                powerup_score: toml_cfg.scoring.powerup_score,
                powerup_ammo: toml_cfg.scoring.powerup_ammo,
                enemy_health: toml_cfg.scoring.enemy_health.max(1),
            },
            levels: LevelsConfig { names, dir },
            hud,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// `Ok(None)` means no file was found anywhere.
fn load_toml(search_dirs: &[PathBuf]) -> Result<Option<TomlConfig>, ConfigError> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        let cfg = toml::from_str::<TomlConfig>(&text)?;
        info!("loaded {}", path.display());
        return Ok(Some(cfg));
    }
    Ok(None)
}
