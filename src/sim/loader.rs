/// Level loader.
///
/// ## Sources (priority order):
///   1. `<levels dir>/<name>.txt`
///   2. Built-in embedded level with the same name
///
/// ## Level format (`.txt`):
///   ```
///   ; Level Name
///   <map rows>
///   ```
///
/// Lines starting with `;` are comments; the first one names the level.
/// Rows are right-padded to the widest row and trailing blank rows dropped.
///
/// ## Tile legend:
///   '#' = Solid block             '=' = One-way platform
///   'P' = Player spawn            'E' = Enemy spawn
///   '*' = Ammo powerup            'O' = Exit portal
///   ' ' = Empty

use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::config::GameConfig;
use crate::domain::entity::{Enemy, ExitPortal, Player, Powerup};
use crate::domain::tile::TileMap;
use super::level::{Level, LevelRules};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no level named {0:?} in the levels directory or built-ins")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level {0:?} has no map rows")]
    Empty(String),
    #[error("level {0:?} needs exactly one player spawn 'P' (found {1})")]
    Spawn(String, usize),
    #[error("level {0:?} needs exactly one exit portal 'O' (found {1})")]
    Exit(String, usize),
    #[error("no level names configured")]
    NoLevelsConfigured,
}

/// Parsed but not yet instantiated level.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub struct LevelLoader {
    dir: PathBuf,
}

impl LevelLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LevelLoader { dir: dir.into() }
    }

    /// Resolve a level name to its definition (file first, then built-in).
    pub fn find(&self, name: &str) -> Result<LevelDef, LevelError> {
        let path = self.dir.join(format!("{name}.txt"));
        if path.is_file() {
            debug!("loading level {name:?} from {}", path.display());
            return load_from_file(name, &path);
        }
        embedded_level(name)
            .ok_or_else(|| LevelError::NotFound(name.to_string()))
            .and_then(|rows| parse_level_text(name, &rows.join("\n")))
    }

    /// Resolve and instantiate a level.
    pub fn load(&self, name: &str, config: &GameConfig) -> Result<Level, LevelError> {
        let def = self.find(name)?;
        Ok(build_level(&def, config))
    }
}

/// Pick one of the configured level names uniformly at random.
pub fn random_level_name<'a, R: Rng + ?Sized>(names: &'a [String], rng: &mut R) -> Result<&'a str, LevelError> {
    if names.is_empty() {
        return Err(LevelError::NoLevelsConfigured);
    }
    Ok(&names[rng.random_range(0..names.len())])
}

/// Parse a single level from text content.
pub fn parse_level_text(name: &str, content: &str) -> Result<LevelDef, LevelError> {
    let mut title = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if let Some(comment) = line.strip_prefix(';') {
            if title.is_empty() {
                title = comment.trim().to_string();
            }
        } else {
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LevelError::Empty(name.to_string()));
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    let count = |marker: char| rows.iter().map(|r| r.matches(marker).count()).sum::<usize>();
    let spawns = count('P');
    if spawns != 1 {
        return Err(LevelError::Spawn(name.to_string(), spawns));
    }
    let exits = count('O');
    if exits != 1 {
        return Err(LevelError::Exit(name.to_string(), exits));
    }

    if title.is_empty() {
        title = name.to_string();
    }

    Ok(LevelDef { name: title, rows })
}

/// Instantiate a parsed level with the configured rules and starting inventory.
pub fn build_level(def: &LevelDef, config: &GameConfig) -> Level {
    let map = TileMap::from_rows(&def.rows);
    let mut player = Player::new(0.0, 0.0, config.player.initial_lives, config.player.initial_ammo);
    let mut enemies = vec![];
    let mut powerups = vec![];
    let mut exit_portal = ExitPortal { x: 0.0, y: 0.0 };

    for (y, row) in def.rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let (fx, fy) = (x as f32, y as f32);
            match ch {
                'P' => {
                    player = Player::new(fx, fy, config.player.initial_lives, config.player.initial_ammo);
                }
                'E' => enemies.push(Enemy::new(fx, fy, config.scoring.enemy_health)),
                '*' => powerups.push(Powerup { x: fx, y: fy }),
                'O' => exit_portal = ExitPortal { x: fx, y: fy },
                _ => {}
            }
        }
    }

    Level {
        name: def.name.clone(),
        map,
        player,
        enemies,
        bullets: vec![],
        powerups,
        explosions: vec![],
        exit_portal,
        score: 0,
        elapsed: 0.0,
        game_over: false,
        victory: false,
        rules: LevelRules::from_config(config),
    }
}

// ══════════════════════════════════════════════════════════════
// Files
// ══════════════════════════════════════════════════════════════

fn load_from_file(name: &str, path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_level_text(name, &content)
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

/// Names of the built-in levels, in order.
#[cfg(test)]
pub fn embedded_names() -> Vec<&'static str> {
    EMBEDDED.iter().map(|(name, _)| *name).collect()
}

fn embedded_level(name: &str) -> Option<&'static [&'static str]> {
    EMBEDDED.iter().find(|(n, _)| *n == name).map(|(_, rows)| *rows)
}

const EMBEDDED: &[(&str, &[&str])] = &[
    ("Level1", &[
        "; First Steps",
        "                                                                                ",
        "                                                                                ",
        "                                                                                ",
        "                                                              *                 ",
        "                                                                           O    ",
        "                                                           =======    ######### ",
        "                                     *                                          ",
        "                                  =======       E                               ",
        "                   *                       ==========           E               ",
        "                ========                                  ##########            ",
        "  P                           E                                                 ",
        "                       ############                                             ",
        "#############    #####################    ##############   #####################",
        "#############    #####################    ##############   #####################",
    ]),
    ("Level2", &[
        "; Stepping Stones",
        "                                                                                            ",
        "                                                                                            ",
        "                                                                          *                 ",
        "                                                      E                ======        O      ",
        "                                        *          =========                      #######   ",
        "                                     ======                    ====                         ",
        "                          E                                                                 ",
        "                 *     ========                                                             ",
        "              =====                          ===                                            ",
        "   P                             ===                                                        ",
        "                                                                                            ",
        "##############     ####                                   #####           ##                ",
        "##############     ####                                   #####           ##                ",
    ]),
    ("Level3", &[
        "; The Gauntlet",
        "                                                                                      ",
        "                                                                                      ",
        "                                                                             O        ",
        "                                                                         #########    ",
        "                                  *                           E                       ",
        "                               =======                 ==========                     ",
        "                    E                        *                                        ",
        "                 ========                 =======                                     ",
        "          *                   E                            E                          ",
        "  P    =======          ##########       ######        ##########                     ",
        "                                                                                      ",
        "############     ######                       ######                ##########        ",
        "############     ######                       ######                ##########        ",
    ]),
];

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
