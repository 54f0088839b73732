/// Tile collision for unit-sized bodies.
///
/// ## Architecture
///
/// A body is a 1x1 box with its top-left corner at `(x, y)`.
/// Motion is resolved one axis at a time:
///   1. HORIZONTAL: `Solid` tiles (and the map's side edges) stop the body.
///   2. VERTICAL:   rising is stopped by `Solid` only; falling lands on
///      both `Solid` and one-way `Platform` tiles.
///
/// ## Support Specification
///
/// A body has SUPPORT (will not fall) if ALL of:
///   - Its bottom edge sits on a row boundary (y is integral within EPS)
///   - Any column it overlaps has a supporting tile directly below
///
/// Below the map there is no support: bodies fall toward the kill plane.

use super::entity::Body;
use super::tile::TileMap;

/// Tolerance for "exactly on a cell boundary".
pub const EPS: f32 = 1e-3;

/// Fastest fall speed, in cells/second.
pub const MAX_FALL_SPEED: f32 = 40.0;

/// Outcome of a vertical move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VerticalHit {
    None,
    Landed,
    Bumped, // hit a ceiling while rising
}

/// Columns overlapped by a box starting at `x`.
#[inline]
fn cols_spanned(x: f32) -> (i32, i32) {
    (x.floor() as i32, (x + 1.0 - EPS).floor() as i32)
}

/// Rows overlapped by a box starting at `y`.
#[inline]
fn rows_spanned(y: f32) -> (i32, i32) {
    (y.floor() as i32, (y + 1.0 - EPS).floor() as i32)
}

/// Is the body resting on something it can stand on?
pub fn has_support(map: &TileMap, body: &Body) -> bool {
    let rest = body.y.round();
    if (body.y - rest).abs() > EPS {
        return false;
    }
    let below = rest as i32 + 1;
    let (c0, c1) = cols_spanned(body.x);
    (c0..=c1).any(|c| map.supports(c, below))
}

/// Would a body at `x` (same row as `body`) overlap a blocking tile?
pub fn blocked_at(map: &TileMap, x: f32, y: f32) -> bool {
    let (c0, c1) = cols_spanned(x);
    let (r0, r1) = rows_spanned(y);
    (c0..=c1).any(|c| (r0..=r1).any(|r| map.blocks(c, r)))
}

/// Apply `vx * dt`, stopping flush against walls. Returns true if blocked.
pub fn move_horizontal(map: &TileMap, body: &mut Body, dt: f32) -> bool {
    if body.vx == 0.0 {
        return false;
    }
    let target = body.x + body.vx * dt;
    if !blocked_at(map, target, body.y) {
        body.x = target;
        return false;
    }
    // Snap flush against the wall we ran into.
    if body.vx > 0.0 {
        body.x = (target + 1.0 - EPS).floor() - 1.0;
    } else {
        body.x = target.floor() + 1.0;
    }
    body.vx = 0.0;
    true
}

/// Apply gravity and `vy * dt`, landing on supports and bumping ceilings.
pub fn move_vertical(map: &TileMap, body: &mut Body, gravity: f32, dt: f32) -> VerticalHit {
    body.vy = (body.vy + gravity * dt).min(MAX_FALL_SPEED);
    let target = body.y + body.vy * dt;

    if body.vy > 0.0 {
        // Every resting row crossed on the way down, nearest first.
        let first = (body.y - EPS).ceil() as i32;
        let last = (target + EPS).floor() as i32;
        let (c0, c1) = cols_spanned(body.x);
        for rest in first..=last {
            if (c0..=c1).any(|c| map.supports(c, rest + 1)) {
                body.y = rest as f32;
                body.vy = 0.0;
                return VerticalHit::Landed;
            }
        }
    } else if body.vy < 0.0 {
        let head = target.floor() as i32;
        if head < (body.y - EPS).ceil() as i32 {
            let (c0, c1) = cols_spanned(body.x);
            if (c0..=c1).any(|c| map.blocks(c, head)) {
                body.y = (head + 1) as f32;
                body.vy = 0.0;
                return VerticalHit::Bumped;
            }
        }
    }

    body.y = target;
    VerticalHit::None
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
