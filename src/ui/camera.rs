/// ChaseCam: a viewport into the level that follows the player.
///
/// `(x, y)` is the level cell shown at the top-left of the viewport and
/// `(view_w, view_h)` is how many cells fit. Both are set from the terminal
/// size on resize; `x`/`y` go negative when a small map is centred.

use crate::domain::entity::nearest_cell;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChaseCam {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

/// Share of the viewport kept clear on each side before the camera scrolls.
const MARGIN_DIVISOR: i32 = 5;

impl ChaseCam {
    pub fn new() -> Self {
        ChaseCam::default()
    }

    pub fn set_viewport(&mut self, view_w: usize, view_h: usize) {
        self.view_w = view_w;
        self.view_h = view_h;
    }

    /// Scroll only when the target leaves the inner dead zone, then clamp
    /// to the level bounds.
    pub fn follow(&mut self, target: (f32, f32), world: (usize, usize)) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        let (tx, ty) = nearest_cell(target.0, target.1);
        self.x = follow_axis(self.x, tx, self.view_w, world.0);
        self.y = follow_axis(self.y, ty, self.view_h, world.1);
    }

    /// Snap directly onto the target. Used when a level starts.
    pub fn center_on(&mut self, target: (f32, f32), world: (usize, usize)) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        let (tx, ty) = nearest_cell(target.0, target.1);
        self.x = center_axis(tx, self.view_w, world.0);
        self.y = center_axis(ty, self.view_h, world.1);
    }

    /// Level cell to viewport cell, or None when off screen.
    pub fn world_to_view(&self, wx: i32, wy: i32) -> Option<(i32, i32)> {
        let vx = wx - self.x;
        let vy = wy - self.y;
        if vx < 0 || vy < 0 || vx >= self.view_w as i32 || vy >= self.view_h as i32 {
            return None;
        }
        Some((vx, vy))
    }

    /// Viewport cell to level cell.
    pub fn view_to_world(&self, vx: i32, vy: i32) -> (i32, i32) {
        (vx + self.x, vy + self.y)
    }
}

/// Offset that centres a map narrower than the viewport.
fn centred(view: usize, world: usize) -> i32 {
    -((view as i32 - world as i32) / 2)
}

fn clamp_axis(pos: i32, view: usize, world: usize) -> i32 {
    pos.clamp(0, (world as i32 - view as i32).max(0))
}

fn follow_axis(pos: i32, target: i32, view: usize, world: usize) -> i32 {
    if world <= view {
        return centred(view, world);
    }
    let margin = view as i32 / MARGIN_DIVISOR;
    let low = pos + margin;
    let high = pos + view as i32 - margin - 1;
    let pos = if target < low {
        target - margin
    } else if target > high {
        target - view as i32 + margin + 1
    } else {
        pos
    };
    clamp_axis(pos, view, world)
}

fn center_axis(target: i32, view: usize, world: usize) -> i32 {
    if world <= view {
        return centred(view, world);
    }
    clamp_axis(target - view as i32 / 2, view, world)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(view_w: usize, view_h: usize) -> ChaseCam {
        let mut c = ChaseCam::new();
        c.set_viewport(view_w, view_h);
        c
    }

    #[test]
    fn dead_zone_holds_still() {
        let mut c = cam(20, 10);
        c.x = 10;
        c.y = 5;
        // Margin is 4 columns / 2 rows; (20, 10) is inside the zone.
        c.follow((20.0, 10.0), (100, 40));
        assert_eq!((c.x, c.y), (10, 5));
    }

    #[test]
    fn scrolls_when_leaving_dead_zone() {
        let mut c = cam(20, 10);
        c.x = 10;
        c.follow((27.0, 0.0), (100, 40));
        // Right bound is 10 + 20 - 4 - 1 = 25; target at 27 pulls by 2.
        assert_eq!(c.x, 12);

        c.follow((12.0, 0.0), (100, 40));
        // Left bound is 12 + 4 = 16; target at 12 pulls to 8.
        assert_eq!(c.x, 8);
    }

    #[test]
    fn clamps_to_world_bounds() {
        let mut c = cam(20, 10);
        c.follow((1.0, 1.0), (100, 40));
        assert_eq!((c.x, c.y), (0, 0));

        c.center_on((99.0, 39.0), (100, 40));
        assert_eq!((c.x, c.y), (80, 30));
    }

    #[test]
    fn small_maps_are_centred() {
        let mut c = cam(40, 20);
        c.follow((3.0, 3.0), (10, 8));
        assert_eq!((c.x, c.y), (-15, -6));
        assert_eq!(c.world_to_view(0, 0), Some((15, 6)));
    }

    #[test]
    fn world_to_view_clips() {
        let mut c = cam(10, 5);
        c.x = 3;
        c.y = 2;
        assert_eq!(c.world_to_view(3, 2), Some((0, 0)));
        assert_eq!(c.world_to_view(12, 6), Some((9, 4)));
        assert_eq!(c.world_to_view(13, 6), None);
        assert_eq!(c.world_to_view(2, 2), None);
        assert_eq!(c.view_to_world(0, 0), (3, 2));
    }

    #[test]
    fn zero_viewport_is_ignored() {
        let mut c = ChaseCam::new();
        c.follow((50.0, 50.0), (100, 100));
        c.center_on((50.0, 50.0), (100, 100));
        assert_eq!(c, ChaseCam::new());
    }
}
