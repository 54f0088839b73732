/// Heads-up display: lives, ammo and score on the top row.
///
/// The layout is a capability chosen once from `hud.style` in the config;
/// the screen holds it as `Box<dyn Hud>`.

use crossterm::style::Color;

use super::surface::Surface;
use crate::config::HudStyle;

/// Rows the HUD reserves at the top of the screen.
pub const HUD_ROWS: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const LABEL: Color = Color::Rgb { r: 150, g: 150, b: 190 };
const VALUE: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const LIFE: Color = Color::Rgb { r: 255, g: 80, b: 120 };
const LIFE_ICON: char = '♥';

pub trait Hud {
    fn render(&self, surface: &mut dyn Surface, lives: u32, ammo: u32, score: u32);
}

pub fn from_style(style: HudStyle) -> Box<dyn Hud> {
    match style {
        HudStyle::Classic => Box::new(ClassicHud),
        HudStyle::Compact => Box::new(CompactHud),
    }
}

/// Score and ammo on the left, one heart per life on the right.
pub struct ClassicHud;

impl Hud for ClassicHud {
    fn render(&self, surface: &mut dyn Surface, lives: u32, ammo: u32, score: u32) {
        let (w, _) = surface.size();
        surface.fill_row(0, HUD_BG);

        surface.put_str(1, 0, "SCORE", LABEL);
        surface.put_str(7, 0, &format!("{:06}", score), VALUE);
        surface.put_str(15, 0, "AMMO", LABEL);
        surface.put_str(20, 0, &format!("{:>3}", ammo), VALUE);

        let hearts: String = (0..lives).map(|_| LIFE_ICON).collect();
        let x = w as i32 - hearts.chars().count() as i32 - 1;
        surface.put_str(x, 0, &hearts, LIFE);
    }
}

/// One condensed line for narrow terminals.
pub struct CompactHud;

impl Hud for CompactHud {
    fn render(&self, surface: &mut dyn Surface, lives: u32, ammo: u32, score: u32) {
        surface.fill_row(0, HUD_BG);
        surface.put_str(0, 0, &format!("{}x{} A:{} S:{}", LIFE_ICON, lives, ammo, score), VALUE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::surface::Frame;

    #[test]
    fn classic_layout() {
        let mut f = Frame::new(40, 3);
        ClassicHud.render(&mut f, 3, 7, 150);
        let row = f.row_text(0);
        assert!(row.starts_with(" SCORE 000150  AMMO   7"));
        assert!(row.ends_with("♥♥♥ "));
        assert_eq!(f.row_text(1).trim(), "");
    }

    #[test]
    fn classic_with_no_lives_draws_no_hearts() {
        let mut f = Frame::new(40, 1);
        ClassicHud.render(&mut f, 0, 0, 0);
        assert!(!f.contains("♥"));
    }

    #[test]
    fn compact_layout() {
        let mut f = Frame::new(30, 1);
        CompactHud.render(&mut f, 2, 10, 75);
        assert_eq!(f.row_text(0).trim_end(), "♥x2 A:10 S:75");
    }

    #[test]
    fn style_selects_variant() {
        let mut f = Frame::new(30, 1);
        from_style(HudStyle::Compact).render(&mut f, 1, 1, 1);
        assert!(f.contains("A:1"));
        from_style(HudStyle::Classic).render(&mut f, 1, 1, 1);
        assert!(f.contains("SCORE"));
    }
}
