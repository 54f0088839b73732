/// Enemy AI: ledge-aware patrol.
///
/// Enemies walk back and forth along the platform they spawned on:
///   1. Walk in the facing direction at `speed`.
///   2. Turn around when the next step would hit a wall or leave the ledge.
///
/// Enemies never fall; a patrol that cannot move in either direction
/// simply stands still.

use super::entity::{Body, Enemy, Facing};
use super::physics;
use super::tile::TileMap;

/// Would a body at `x` on the enemy's row still have ground under it?
fn ground_ahead(map: &TileMap, x: f32, y: f32) -> bool {
    physics::has_support(map, &Body::at(x, y))
}

/// Can the enemy occupy `x` (no wall, still supported)?
fn can_stand(map: &TileMap, x: f32, y: f32) -> bool {
    !physics::blocked_at(map, x, y) && ground_ahead(map, x, y)
}

/// Advance one enemy by `dt`. Returns true if it turned around this step.
pub fn patrol(map: &TileMap, enemy: &mut Enemy, speed: f32, dt: f32) -> bool {
    let step = speed * dt;
    if step <= 0.0 {
        return false;
    }

    let ahead = enemy.body.x + enemy.facing.sign() * step;
    if can_stand(map, ahead, enemy.body.y) {
        enemy.body.x = ahead;
        return false;
    }

    enemy.facing = enemy.facing.flipped();
    let back = enemy.body.x + enemy.facing.sign() * step;
    if can_stand(map, back, enemy.body.y) {
        enemy.body.x = back;
    }
    true
}

/// Which way should a knocked-back player fly, given where the enemy is?
pub fn knockback_direction(player_x: f32, enemy_x: f32) -> Facing {
    if player_x < enemy_x { Facing::Left } else { Facing::Right }
}
