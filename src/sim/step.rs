/// The step function: advances a level by one frame.
///
/// Processing order:
///   1. Player movement (walk, jump, gravity, tile collision)
///   2. Shooting
///   3. Enemy patrol
///   4. Bullets (travel, walls, enemy hits)
///   5. Enemy contact (knock-back)
///   6. Powerup pickup
///   7. Kill plane (lose a life / game over)
///   8. Exit portal (victory)
///   9. Explosion aging
///
/// Once `game_over` or `victory` is set the level is frozen.

use crate::domain::ai;
use crate::domain::entity::{touching, Bullet, Explosion, JumpState, PlayerInput};
use crate::domain::physics::{self, VerticalHit};
use crate::domain::tile::TileMap;
use super::event::LevelEvent;
use super::level::Level;

/// Overlap slack for player-vs-enemy and player-vs-powerup contact.
const CONTACT_SLACK: f32 = 0.2;

impl Level {
    /// Advance the level by `dt` seconds with this frame's input.
    pub fn update(&mut self, dt: f32, input: PlayerInput) -> Vec<LevelEvent> {
        step(self, input, dt)
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(level: &mut Level, input: PlayerInput, dt: f32) -> Vec<LevelEvent> {
    if level.is_finished() || dt <= 0.0 { return vec![]; }

    let mut events: Vec<LevelEvent> = Vec::new();
    level.elapsed += dt;

    resolve_player_movement(level, input, dt, &mut events);
    resolve_shooting(level, input, &mut events);
    resolve_enemy_patrol(level, dt);
    resolve_bullets(level, dt, &mut events);
    resolve_enemy_contact(level, &mut events);
    resolve_powerups(level, &mut events);
    if resolve_kill_plane(level, &mut events) { return events; }
    resolve_exit(level, &mut events);
    resolve_explosions(level, dt);

    events
}

// ══════════════════════════════════════════════════════════════
// 1. Player movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(level: &mut Level, input: PlayerInput, dt: f32, events: &mut Vec<LevelEvent>) {
    let rules = &level.rules;
    let player = &mut level.player;

    if player.jump != JumpState::Recoiling {
        player.body.vx = match input.walk {
            Some(dir) => {
                player.facing = dir;
                dir.sign() * rules.walk_speed
            }
            None => 0.0,
        };
    }

    match player.jump {
        JumpState::Grounded if input.jump_pressed => {
            player.jump = JumpState::Jumping;
            player.jump_start = level.elapsed;
            player.body.vy = -rules.jump_speed;
            events.push(LevelEvent::Jumped);
        }
        JumpState::Jumping => {
            let held_for = level.elapsed - player.jump_start;
            if input.jump_held && held_for < rules.max_jump_duration {
                player.body.vy = -rules.jump_speed;
            } else {
                player.jump = JumpState::Falling;
            }
        }
        _ => {}
    }

    physics::move_horizontal(&level.map, &mut player.body, dt);

    match physics::move_vertical(&level.map, &mut player.body, rules.gravity, dt) {
        VerticalHit::Landed => {
            if player.jump == JumpState::Recoiling {
                player.body.vx = 0.0;
            }
            if player.jump != JumpState::Grounded {
                events.push(LevelEvent::Landed);
            }
            player.jump = JumpState::Grounded;
        }
        VerticalHit::Bumped => {
            if player.jump == JumpState::Jumping {
                player.jump = JumpState::Falling;
            }
        }
        VerticalHit::None => {
            // Walked off a ledge
            if player.jump == JumpState::Grounded {
                player.jump = JumpState::Falling;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// 2. Shooting
// ══════════════════════════════════════════════════════════════

fn resolve_shooting(level: &mut Level, input: PlayerInput, events: &mut Vec<LevelEvent>) {
    if !input.shoot_pressed { return; }
    let player = &mut level.player;
    if player.jump == JumpState::Recoiling { return; }

    if player.ammo == 0 {
        events.push(LevelEvent::OutOfAmmo);
        return;
    }
    player.ammo -= 1;
    let muzzle_x = player.body.x + player.facing.sign() * 0.5;
    level.bullets.push(Bullet::new(muzzle_x, player.body.y, player.facing));
    events.push(LevelEvent::BulletFired { ammo_left: player.ammo });
}

// ══════════════════════════════════════════════════════════════
// 3. Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_patrol(level: &mut Level, dt: f32) {
    let speed = level.rules.enemy_speed;
    for enemy in &mut level.enemies {
        ai::patrol(&level.map, enemy, speed, dt);
    }
}

// ══════════════════════════════════════════════════════════════
// 4. Bullets
// ══════════════════════════════════════════════════════════════

fn resolve_bullets(level: &mut Level, dt: f32, events: &mut Vec<LevelEvent>) {
    let speed = level.rules.bullet_speed;

    for bullet in &mut level.bullets {
        let from = bullet.x;
        let to = from + bullet.direction.sign() * speed * dt;
        let (reach, walled) = sweep_to_wall(&level.map, bullet.y, from, to);
        bullet.x = reach;
        if walled {
            bullet.alive = false;
        }

        // Nearest live enemy overlapping the stretch travelled this frame.
        let (lo, hi) = if from <= reach { (from, reach) } else { (reach, from) };
        let Some(enemy) = level.enemies.iter_mut()
            .filter(|e| e.health > 0 && (e.body.y - bullet.y).abs() < 1.0)
            .filter(|e| lo < e.body.x + 1.0 && hi > e.body.x - 1.0)
            .min_by(|a, b| (a.body.x - from).abs().total_cmp(&(b.body.x - from).abs()))
        else {
            continue;
        };

        bullet.alive = false;
        level.score = level.score.saturating_add(level.rules.enemy_hit_score);
        if enemy.hit() {
            level.score = level.score.saturating_add(level.rules.enemy_kill_score);
            level.explosions.push(Explosion::new(enemy.body.x, enemy.body.y));
            events.push(LevelEvent::EnemyKilled { x: enemy.body.x, y: enemy.body.y });
        } else {
            events.push(LevelEvent::EnemyHit { health_left: enemy.health });
        }
    }

    level.bullets.retain(|b| b.alive);
    level.enemies.retain(|e| e.health > 0);
}

/// Walk a bullet's columns from `from` toward `to`, one at a time, so fast
/// bullets never skip a thin wall. Returns where it stopped and whether a
/// wall (or the map edge) stopped it.
fn sweep_to_wall(map: &TileMap, y: f32, from: f32, to: f32) -> (f32, bool) {
    let row = (y + 0.5).floor() as i32;
    let step = if to >= from { 1 } else { -1 };
    let last = (to + 0.5).floor() as i32;
    let mut col = (from + 0.5).floor() as i32;
    loop {
        if map.blocks(col, row) {
            // Stopped on the edge of the column it tried to enter.
            let edge = col as f32 - step as f32 * 0.5;
            return (if step > 0 { edge.min(to) } else { edge.max(to) }, true);
        }
        if col == last {
            return (to, false);
        }
        col += step;
    }
}

// ══════════════════════════════════════════════════════════════
// 5-6. Contact: enemies and powerups
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_contact(level: &mut Level, events: &mut Vec<LevelEvent>) {
    let player = &mut level.player;
    if player.jump == JumpState::Recoiling { return; }

    let Some(enemy) = level.enemies.iter()
        .find(|e| touching(player.pos(), e.pos(), CONTACT_SLACK))
    else {
        return;
    };

    let away = ai::knockback_direction(player.body.x, enemy.body.x);
    player.jump = JumpState::Recoiling;
    player.body.vx = away.sign() * level.rules.knockback_x;
    player.body.vy = -level.rules.knockback_y;
    events.push(LevelEvent::PlayerKnockedBack);
}

fn resolve_powerups(level: &mut Level, events: &mut Vec<LevelEvent>) {
    let pos = level.player.pos();
    let before = level.powerups.len();
    level.powerups.retain(|p| !touching(pos, (p.x, p.y), CONTACT_SLACK));
    let collected = (before - level.powerups.len()) as u32;

    for _ in 0..collected {
        level.player.ammo = level.player.ammo.saturating_add(level.rules.powerup_ammo);
        level.score = level.score.saturating_add(level.rules.powerup_score);
        events.push(LevelEvent::PowerupCollected { ammo: level.player.ammo });
    }
}

// ══════════════════════════════════════════════════════════════
// 7-8. Outcome checks
// ══════════════════════════════════════════════════════════════

/// Returns true if the fall ended the game.
fn resolve_kill_plane(level: &mut Level, events: &mut Vec<LevelEvent>) -> bool {
    if level.player.body.y <= level.kill_plane() { return false; }

    if level.player.lives == 0 {
        level.game_over = true;
        events.push(LevelEvent::GameOver);
        return true;
    }
    level.player.lives -= 1;
    level.player.respawn();
    events.push(LevelEvent::LifeLost { lives_left: level.player.lives });
    false
}

fn resolve_exit(level: &mut Level, events: &mut Vec<LevelEvent>) {
    let portal = (level.exit_portal.x, level.exit_portal.y);
    if touching(level.player.pos(), portal, 0.0) {
        level.victory = true;
        events.push(LevelEvent::Victory);
    }
}

fn resolve_explosions(level: &mut Level, dt: f32) {
    level.explosions.retain_mut(|e| !e.tick(dt));
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Facing;
    use crate::sim::loader::{build_level, parse_level_text};

    const DT: f32 = 1.0 / 30.0;

    fn level_from(rows: &[&str]) -> Level {
        let text = rows.join("\n");
        let def = parse_level_text("Test", &text).unwrap();
        build_level(&def, &GameConfig::default())
    }

    fn idle() -> PlayerInput {
        PlayerInput::default()
    }

    fn run(level: &mut Level, input: PlayerInput, frames: usize) -> Vec<LevelEvent> {
        let mut all = vec![];
        for _ in 0..frames {
            all.extend(level.update(DT, input));
        }
        all
    }

    /// Let the player drop onto whatever is below the spawn point.
    fn settle(level: &mut Level) {
        run(level, idle(), 30);
        assert_eq!(level.player.jump, JumpState::Grounded);
    }

    #[test]
    fn player_lands_on_ground() {
        let mut lv = level_from(&[
            " P       O",
            "          ",
            "##########",
        ]);
        let events = run(&mut lv, idle(), 30);
        assert_eq!(lv.player.jump, JumpState::Grounded);
        assert_eq!(lv.player.body.y, 1.0);
        assert!(events.contains(&LevelEvent::Landed));
    }

    #[test]
    fn walking_moves_and_faces() {
        let mut lv = level_from(&[
            "    P    O",
            "##########",
        ]);
        settle(&mut lv);
        let x0 = lv.player.body.x;
        run(&mut lv, PlayerInput { walk: Some(Facing::Left), ..idle() }, 5);
        assert!(lv.player.body.x < x0);
        assert_eq!(lv.player.facing, Facing::Left);
    }

    #[test]
    fn jump_leaves_ground_and_comes_back() {
        let mut lv = level_from(&[
            "          ",
            "          ",
            "          ",
            "          ",
            " P       O",
            "##########",
        ]);
        settle(&mut lv);
        let ground_y = lv.player.body.y;

        let press = PlayerInput { jump_pressed: true, jump_held: true, ..idle() };
        let events = lv.update(DT, press);
        assert!(events.contains(&LevelEvent::Jumped));
        assert_eq!(lv.player.jump, JumpState::Jumping);

        run(&mut lv, PlayerInput { jump_held: true, ..idle() }, 5);
        assert!(lv.player.body.y < ground_y);

        run(&mut lv, idle(), 60);
        assert_eq!(lv.player.jump, JumpState::Grounded);
        assert_eq!(lv.player.body.y, ground_y);
    }

    #[test]
    fn holding_jump_goes_higher() {
        let rows = [
            "          ",
            "          ",
            "          ",
            "          ",
            "          ",
            "          ",
            " P       O",
            "##########",
        ];
        let peak = |hold: bool| {
            let mut lv = level_from(&rows);
            settle(&mut lv);
            lv.update(DT, PlayerInput { jump_pressed: true, jump_held: true, ..idle() });
            let mut top = lv.player.body.y;
            for _ in 0..40 {
                lv.update(DT, PlayerInput { jump_held: hold, ..idle() });
                top = top.min(lv.player.body.y);
            }
            top
        };
        assert!(peak(true) < peak(false));
    }

    #[test]
    fn jumps_up_through_platform() {
        let mut lv = level_from(&[
            "          ",
            "          ",
            "  ======  ",
            "          ",
            "   P     O",
            "##########",
        ]);
        settle(&mut lv);
        lv.update(DT, PlayerInput { jump_pressed: true, jump_held: true, ..idle() });
        run(&mut lv, PlayerInput { jump_held: true, ..idle() }, 10);
        run(&mut lv, idle(), 60);
        // Came down on top of the one-way platform, not back on the floor.
        assert_eq!(lv.player.jump, JumpState::Grounded);
        assert_eq!(lv.player.body.y, 1.0);
    }

    #[test]
    fn shooting_spends_ammo() {
        let mut lv = level_from(&[
            " P       O",
            "##########",
        ]);
        lv.player.ammo = 1;
        let shoot = PlayerInput { shoot_pressed: true, ..idle() };
        let events = lv.update(DT, shoot);
        assert!(events.contains(&LevelEvent::BulletFired { ammo_left: 0 }));
        assert_eq!(lv.bullets.len(), 1);

        let events = lv.update(DT, shoot);
        assert!(events.contains(&LevelEvent::OutOfAmmo));
        assert_eq!(lv.player.ammo, 0);
    }

    #[test]
    fn bullet_stops_at_wall() {
        let mut lv = level_from(&[
            " P   #   O",
            "##########",
        ]);
        settle(&mut lv);
        lv.update(DT, PlayerInput { shoot_pressed: true, ..idle() });
        run(&mut lv, idle(), 10);
        assert!(lv.bullets.is_empty());
    }

    #[test]
    fn fast_bullet_cannot_skip_a_thin_wall() {
        let mut lv = level_from(&[
            " P #      O",
            "###########",
        ]);
        settle(&mut lv);
        let mut xs = vec![];
        lv.update(0.1, PlayerInput { shoot_pressed: true, ..idle() });
        xs.extend(lv.bullets.iter().map(|b| b.x));
        for _ in 0..3 {
            lv.update(0.1, idle());
            xs.extend(lv.bullets.iter().map(|b| b.x));
        }
        assert!(xs.iter().all(|&x| x < 3.0), "bullet crossed the wall: {xs:?}");
        assert!(lv.bullets.is_empty());
    }

    #[test]
    fn fast_bullet_hits_enemy_it_would_pass() {
        let mut lv = level_from(&[
            "P   E      O",
            "############",
        ]);
        lv.rules.enemy_speed = 0.0;
        settle(&mut lv);
        lv.enemies[0].health = 1;

        let mut events = lv.update(0.1, PlayerInput { shoot_pressed: true, ..idle() });
        events.extend(lv.update(0.1, idle()));
        assert!(events.iter().any(|e| matches!(e, LevelEvent::EnemyKilled { .. })));
        assert!(lv.enemies.is_empty());
        assert!(lv.bullets.is_empty());
    }

    #[test]
    fn bullets_hit_then_kill_enemy() {
        let mut lv = level_from(&[
            "P      E        O",
            "#################",
        ]);
        settle(&mut lv);
        lv.enemies[0].health = 2;
        lv.rules.enemy_speed = 0.0;
        let shoot = PlayerInput { shoot_pressed: true, ..idle() };

        lv.update(DT, shoot);
        let events = run(&mut lv, idle(), 15);
        assert!(events.contains(&LevelEvent::EnemyHit { health_left: 1 }));
        assert_eq!(lv.score, 25);

        lv.update(DT, shoot);
        let events = run(&mut lv, idle(), 15);
        assert!(events.iter().any(|e| matches!(e, LevelEvent::EnemyKilled { .. })));
        assert!(lv.enemies.is_empty());
        assert_eq!(lv.score, 25 + 25 + 100);
    }

    #[test]
    fn touching_enemy_knocks_player_back() {
        let mut lv = level_from(&[
            "          ",
            "          ",
            "   PE    O",
            "##########",
        ]);
        lv.rules.enemy_speed = 0.0;
        settle(&mut lv);

        let walk = PlayerInput { walk: Some(Facing::Right), ..idle() };
        let knocked = (0..30).any(|_| lv.update(DT, walk).contains(&LevelEvent::PlayerKnockedBack));
        assert!(knocked);
        assert_eq!(lv.player.jump, JumpState::Recoiling);

        // Input is ignored while recoiling: still pushed left, away from the enemy.
        run(&mut lv, walk, 5);
        assert!(lv.player.body.x < 3.0);
    }

    #[test]
    fn powerup_grants_ammo_and_score() {
        let mut lv = level_from(&[
            " P*      O",
            "##########",
        ]);
        settle(&mut lv);
        let ammo = lv.player.ammo;
        let events = run(&mut lv, PlayerInput { walk: Some(Facing::Right), ..idle() }, 6);
        assert!(events.iter().any(|e| matches!(e, LevelEvent::PowerupCollected { .. })));
        assert!(lv.powerups.is_empty());
        assert_eq!(lv.player.ammo, ammo + 10);
        assert_eq!(lv.score, 50);
    }

    #[test]
    fn huge_powerup_reward_saturates() {
        let mut lv = level_from(&[
            " P*      O",
            "##########",
        ]);
        lv.rules.powerup_ammo = u32::MAX;
        lv.rules.powerup_score = u32::MAX;
        settle(&mut lv);
        run(&mut lv, PlayerInput { walk: Some(Facing::Right), ..idle() }, 6);
        assert!(lv.powerups.is_empty());
        assert_eq!(lv.player.ammo, u32::MAX);
        assert_eq!(lv.score, u32::MAX);
    }

    #[test]
    fn falling_off_costs_a_life_then_ends_the_game() {
        let mut lv = level_from(&[
            " P       O",
            "          ",
        ]);
        lv.player.lives = 1;

        let events = run(&mut lv, idle(), 90);
        let lost = events.iter().position(|e| *e == LevelEvent::LifeLost { lives_left: 0 });
        let over = events.iter().position(|e| *e == LevelEvent::GameOver);
        assert!(lost.is_some());
        assert!(over > lost);
        assert!(lv.game_over);
        assert!(!lv.victory);
        assert_eq!(events.iter().filter(|e| **e == LevelEvent::GameOver).count(), 1);
    }

    #[test]
    fn reaching_portal_is_victory() {
        let mut lv = level_from(&[
            " P  O     ",
            "##########",
        ]);
        settle(&mut lv);
        let events = run(&mut lv, PlayerInput { walk: Some(Facing::Right), ..idle() }, 30);
        assert!(lv.victory);
        assert_eq!(events.iter().filter(|e| **e == LevelEvent::Victory).count(), 1);
    }

    #[test]
    fn finished_level_is_frozen() {
        let mut lv = level_from(&[
            " P  O     ",
            "##########",
        ]);
        lv.victory = true;
        let before = lv.player.pos();
        let events = run(&mut lv, PlayerInput { walk: Some(Facing::Right), ..idle() }, 10);
        assert!(events.is_empty());
        assert_eq!(lv.player.pos(), before);
        assert_eq!(lv.elapsed, 0.0);
    }
}
