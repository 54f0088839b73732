/// Draws a `Level` through the chase camera.
///
/// Terrain first, then portal, powerups, enemies, bullets, explosions and
/// the player on top. The view starts at row `top` so the HUD keeps its row.

use crossterm::style::Color;

use super::camera::ChaseCam;
use super::surface::{Cell, Surface, BASE_BG};
use crate::domain::entity::{nearest_cell, Facing, JumpState};
use crate::domain::tile::Tile;
use crate::sim::level::Level;

pub const BACKGROUND: Color = BASE_BG;
/// Cells outside the level map.
const VOID_BG: Color = Color::Rgb { r: 10, g: 10, b: 16 };

const SOLID_GLYPH: char = '█';
const SOLID_FG: Color = Color::Rgb { r: 90, g: 100, b: 140 };
const PLATFORM_GLYPH: char = '▀';
const PLATFORM_FG: Color = Color::Rgb { r: 170, g: 120, b: 60 };

pub const ENEMY_GLYPH: char = 'Ж';
const ENEMY_FG: Color = Color::Rgb { r: 200, g: 80, b: 255 };
const PORTAL_GLYPH: char = 'O';
const PORTAL_FG: Color = Color::Rgb { r: 80, g: 230, b: 255 };
const POWERUP_GLYPH: char = '♦';
const POWERUP_FG: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const BULLET_GLYPH: char = '-';
const BULLET_FG: Color = Color::Rgb { r: 255, g: 255, b: 160 };

const PLAYER_RIGHT: char = '►';
const PLAYER_LEFT: char = '◄';
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const PLAYER_HURT_FG: Color = Color::Rgb { r: 255, g: 60, b: 60 };

/// Indexed by `Explosion::stage()`.
pub const EXPLOSION_GLYPHS: [char; 4] = ['*', '+', 'x', '.'];
pub const EXPLOSION_COLORS: [Color; 4] = [
    Color::Rgb { r: 255, g: 255, b: 200 },
    Color::Rgb { r: 255, g: 200, b: 60 },
    Color::Rgb { r: 255, g: 120, b: 40 },
    Color::Rgb { r: 140, g: 60, b: 40 },
];

pub fn draw_level<S: Surface + ?Sized>(surface: &mut S, level: &Level, cam: &ChaseCam, top: i32) {
    draw_terrain(surface, level, cam, top);

    let sprite = |surface: &mut S, (x, y): (f32, f32), ch: char, fg: Color| {
        let (cx, cy) = nearest_cell(x, y);
        if let Some((vx, vy)) = cam.world_to_view(cx, cy) {
            surface.put_char(vx, vy + top, ch, fg);
        }
    };

    let portal = &level.exit_portal;
    sprite(surface, (portal.x, portal.y), PORTAL_GLYPH, PORTAL_FG);
    for p in &level.powerups {
        sprite(surface, (p.x, p.y), POWERUP_GLYPH, POWERUP_FG);
    }
    for e in &level.enemies {
        sprite(surface, e.pos(), ENEMY_GLYPH, ENEMY_FG);
    }
    for b in &level.bullets {
        sprite(surface, (b.x, b.y), BULLET_GLYPH, BULLET_FG);
    }
    for ex in &level.explosions {
        let stage = ex.stage() as usize;
        sprite(surface, (ex.x, ex.y), EXPLOSION_GLYPHS[stage], EXPLOSION_COLORS[stage]);
    }

    let player = &level.player;
    let glyph = match player.facing {
        Facing::Right => PLAYER_RIGHT,
        Facing::Left => PLAYER_LEFT,
    };
    let fg = if player.jump == JumpState::Recoiling { PLAYER_HURT_FG } else { PLAYER_FG };
    sprite(surface, player.pos(), glyph, fg);
}

fn draw_terrain<S: Surface + ?Sized>(surface: &mut S, level: &Level, cam: &ChaseCam, top: i32) {
    let (w, h) = (level.width() as i32, level.height() as i32);
    for vy in 0..cam.view_h as i32 {
        for vx in 0..cam.view_w as i32 {
            let (wx, wy) = cam.view_to_world(vx, vy);
            let inside = wx >= 0 && wy >= 0 && wx < w && wy < h;
            let cell = if !inside {
                Cell { ch: ' ', fg: Color::White, bg: VOID_BG }
            } else {
                match level.map.get(wx, wy) {
                    Tile::Solid => Cell { ch: SOLID_GLYPH, fg: SOLID_FG, bg: BACKGROUND },
                    Tile::Platform => Cell { ch: PLATFORM_GLYPH, fg: PLATFORM_FG, bg: BACKGROUND },
                    Tile::Empty => Cell { ch: ' ', fg: Color::White, bg: BACKGROUND },
                }
            };
            surface.set(vx, vy + top, cell);
        }
    }
}
