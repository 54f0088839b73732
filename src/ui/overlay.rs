/// Level-end overlays drawn over the frozen level.
///
/// Both follow the same protocol: `init(now)` rolls a fresh animation
/// layout and records the start time, `render(surface, now)` draws the
/// animation at `now - start`. Layouts are stored as fractions of the
/// surface so a resize mid-overlay keeps working.

use std::time::Instant;

use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::level_view::{ENEMY_GLYPH, EXPLOSION_GLYPHS, EXPLOSION_COLORS};
use super::surface::{Cell, Surface};

const BANNER_BG: Color = Color::Rgb { r: 10, g: 10, b: 20 };
const GAME_OVER_FG: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const VICTORY_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const RAIN_FG: Color = Color::Rgb { r: 200, g: 80, b: 255 };

const RAIN_DROPS: usize = 24;
const BURSTS: usize = 12;
/// Seconds one burst takes to expand and fade.
const BURST_PERIOD: f32 = 0.8;

/// Seconds since `started`, or zero before the overlay is initialised.
fn seconds_since(started: Option<Instant>, now: Instant) -> f32 {
    started.map_or(0.0, |s| now.saturating_duration_since(s).as_secs_f32())
}

/// Boxed banner centred on the surface.
fn draw_banner<S: Surface + ?Sized>(surface: &mut S, text: &str, fg: Color) {
    let (w, h) = surface.size();
    let padded = format!("   {}   ", text);
    let len = padded.chars().count() as i32;
    let x0 = (w as i32 - len) / 2;
    let y = h as i32 / 2;
    for dy in -1..=1 {
        for dx in 0..len {
            surface.set(x0 + dx, y + dy, Cell { ch: ' ', fg, bg: BANNER_BG });
        }
    }
    surface.put_centered(y, &padded, fg);
}

// ── Game over: enemies rain down ──

#[derive(Clone, Debug)]
struct Drop {
    /// Column as a fraction of the surface width.
    col: f32,
    /// Seconds before this drop starts falling.
    delay: f32,
    /// Rows per second.
    speed: f32,
}

pub struct GameOverOverlay {
    rng: StdRng,
    drops: Vec<Drop>,
    started: Option<Instant>,
}

impl GameOverOverlay {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        GameOverOverlay { rng, drops: Vec::new(), started: None }
    }

    pub fn init(&mut self, now: Instant) {
        let rng = &mut self.rng;
        self.drops = (0..RAIN_DROPS)
            .map(|_| Drop {
                col: rng.random_range(0.0..1.0),
                delay: rng.random_range(0.0..1.5),
                speed: rng.random_range(6.0..14.0),
            })
            .collect();
        self.started = Some(now);
    }

    #[allow(dead_code)]
    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, now: Instant) {
        let (w, h) = surface.size();
        let t = seconds_since(self.started, now);
        for drop in &self.drops {
            let falling = t - drop.delay;
            if falling < 0.0 {
                continue;
            }
            let x = (drop.col * w as f32) as i32;
            // Wrap so the rain keeps falling for the whole display time.
            let y = (falling * drop.speed) as i32 % (h.max(1) as i32);
            surface.put_char(x, y, ENEMY_GLYPH, RAIN_FG);
        }
        draw_banner(surface, "GAME OVER", GAME_OVER_FG);
    }
}

// ── Victory: explosion bursts ──

#[derive(Clone, Debug)]
struct Burst {
    x: f32,
    y: f32,
    delay: f32,
}

pub struct VictoryOverlay {
    rng: StdRng,
    bursts: Vec<Burst>,
    started: Option<Instant>,
}

impl VictoryOverlay {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        VictoryOverlay { rng, bursts: Vec::new(), started: None }
    }

    pub fn init(&mut self, now: Instant) {
        let rng = &mut self.rng;
        self.bursts = (0..BURSTS)
            .map(|_| Burst {
                x: rng.random_range(0.05..0.95),
                y: rng.random_range(0.1..0.9),
                delay: rng.random_range(0.0..2.0),
            })
            .collect();
        self.started = Some(now);
    }

    #[allow(dead_code)]
    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, now: Instant) {
        let (w, h) = surface.size();
        let t = seconds_since(self.started, now);
        for burst in &self.bursts {
            let age = t - burst.delay;
            if age < 0.0 {
                continue;
            }
            // Each burst repeats: a flash that grows into a ring of embers.
            let phase = (age % BURST_PERIOD) / BURST_PERIOD;
            let stage = ((phase * 4.0) as usize).min(3);
            let radius = stage as i32;
            let cx = (burst.x * w as f32) as i32;
            let cy = (burst.y * h as f32) as i32;
            let (glyph, color) = (EXPLOSION_GLYPHS[stage], EXPLOSION_COLORS[stage]);
            if radius == 0 {
                surface.put_char(cx, cy, glyph, color);
                continue;
            }
            for (dx, dy) in [(-2, 0), (2, 0), (0, -1), (0, 1), (-1, -1), (1, -1), (-1, 1), (1, 1)] {
                surface.put_char(cx + dx * radius, cy + dy * radius, glyph, color);
            }
        }
        draw_banner(surface, "YOU WIN!", VICTORY_FG);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ui::surface::Frame;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn game_over_banner_and_rain() {
        let mut overlay = GameOverOverlay::with_rng(seeded(7));
        let t0 = Instant::now();
        overlay.init(t0);
        assert_eq!(overlay.started(), Some(t0));

        let mut f = Frame::new(60, 20);
        overlay.render(&mut f, t0 + Duration::from_secs(3));
        assert!(f.contains("GAME OVER"));
        // Every drop has started falling by 1.5s.
        let glyphs: usize = (0..20)
            .map(|y| f.row_text(y).chars().filter(|&c| c == ENEMY_GLYPH).count())
            .sum();
        assert!(glyphs > 0);
    }

    #[test]
    fn rain_waits_for_delays() {
        let mut overlay = GameOverOverlay::with_rng(seeded(1));
        let t0 = Instant::now();
        overlay.init(t0);
        let mut f = Frame::new(60, 20);
        overlay.render(&mut f, t0);
        let early = (0..20)
            .map(|y| f.row_text(y).chars().filter(|&c| c == ENEMY_GLYPH).count())
            .sum::<usize>();
        // Only drops with a zero delay could be visible at t = 0.
        assert!(early <= overlay.drops.iter().filter(|d| d.delay <= 0.0).count());
    }

    #[test]
    fn victory_banner() {
        let mut overlay = VictoryOverlay::with_rng(seeded(3));
        let t0 = Instant::now();
        overlay.init(t0);
        let mut f = Frame::new(60, 20);
        overlay.render(&mut f, t0 + Duration::from_millis(2500));
        assert!(f.contains("YOU WIN!"));
        assert!(!f.contains("GAME OVER"));
    }

    #[test]
    fn init_rolls_a_new_layout() {
        let mut overlay = VictoryOverlay::with_rng(seeded(11));
        let t0 = Instant::now();
        overlay.init(t0);
        let first: Vec<f32> = overlay.bursts.iter().map(|b| b.x).collect();
        let t1 = t0 + Duration::from_secs(1);
        overlay.init(t1);
        let second: Vec<f32> = overlay.bursts.iter().map(|b| b.x).collect();
        assert_eq!(overlay.started(), Some(t1));
        assert_eq!(second.len(), BURSTS);
        assert_ne!(first, second);
    }

    #[test]
    fn tiny_surface_does_not_panic() {
        let mut overlay = GameOverOverlay::with_rng(seeded(5));
        let t0 = Instant::now();
        overlay.init(t0);
        let mut f = Frame::new(1, 1);
        overlay.render(&mut f, t0 + Duration::from_secs(4));
        let mut f = Frame::new(0, 0);
        overlay.render(&mut f, t0 + Duration::from_secs(4));
    }
}
