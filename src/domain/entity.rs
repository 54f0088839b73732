/// Entities: Player, Enemy, Bullet, Powerup, Explosion, ExitPortal.
///
/// Positions are in cell units, `(x, y)` is the top-left corner of a
/// 1x1 box and y grows downward (row 0 is the top of the map).

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for Left, +1.0 for Right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Player jump state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpState {
    Grounded,
    Jumping,   // upward speed sustained while jump is held
    Falling,
    Recoiling, // knocked back by an enemy, input ignored until landing
}

/// Frame input: walking is continuous (held key), jump/shoot edges are
/// fresh presses so both can fire in one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerInput {
    pub walk: Option<Facing>,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub shoot_pressed: bool,
}

/// Shared kinematic body.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Body {
    pub fn at(x: f32, y: f32) -> Self {
        Body { x, y, vx: 0.0, vy: 0.0 }
    }
}

pub fn nearest_cell(x: f32, y: f32) -> (i32, i32) {
    ((x + 0.5).floor() as i32, (y + 0.5).floor() as i32)
}

/// Do two unit boxes overlap by more than `slack` on both axes?
pub fn touching(a: (f32, f32), b: (f32, f32), slack: f32) -> bool {
    (a.0 - b.0).abs() < 1.0 - slack && (a.1 - b.1).abs() < 1.0 - slack
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub facing: Facing,
    pub jump: JumpState,
    pub jump_start: f32, // level time when the current jump began
    pub lives: u32,
    pub ammo: u32,
    pub spawn: (f32, f32),
}

impl Player {
    pub fn new(x: f32, y: f32, lives: u32, ammo: u32) -> Self {
        Player {
            body: Body::at(x, y),
            facing: Facing::Right,
            jump: JumpState::Falling,
            jump_start: 0.0,
            lives,
            ammo,
            spawn: (x, y),
        }
    }

    pub fn pos(&self) -> (f32, f32) {
        (self.body.x, self.body.y)
    }

    /// Back to the spawn point, at rest, keeping lives/ammo.
    pub fn respawn(&mut self) {
        self.body = Body::at(self.spawn.0, self.spawn.1);
        self.facing = Facing::Right;
        self.jump = JumpState::Falling;
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub body: Body,
    pub facing: Facing,
    pub health: u32,
}

impl Enemy {
    pub fn new(x: f32, y: f32, health: u32) -> Self {
        Enemy { body: Body::at(x, y), facing: Facing::Left, health }
    }

    pub fn pos(&self) -> (f32, f32) {
        (self.body.x, self.body.y)
    }

    /// Take one hit. Returns true if this hit killed the enemy.
    pub fn hit(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.health == 0
    }
}

#[derive(Clone, Debug)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub direction: Facing,
    pub alive: bool,
}

impl Bullet {
    pub fn new(x: f32, y: f32, direction: Facing) -> Self {
        Bullet { x, y, direction, alive: true }
    }
}

#[derive(Clone, Debug)]
pub struct Powerup {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug)]
pub struct ExitPortal {
    pub x: f32,
    pub y: f32,
}

/// Visual-only burst left behind by a destroyed enemy.
#[derive(Clone, Debug)]
pub struct Explosion {
    pub x: f32,
    pub y: f32,
    pub age: f32,
}

impl Explosion {
    pub const LIFETIME: f32 = 0.5;

    pub fn new(x: f32, y: f32) -> Self {
        Explosion { x, y, age: 0.0 }
    }

    /// Advance by `dt`. Returns true once the explosion has burned out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.age >= Self::LIFETIME
    }

    /// Animation stage 0..3 (0 = fresh flash, 3 = last embers).
    pub fn stage(&self) -> u8 {
        let p = (self.age / Self::LIFETIME).clamp(0.0, 1.0);
        if p < 0.25 { 0 }
        else if p < 0.50 { 1 }
        else if p < 0.75 { 2 }
        else { 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_dies_on_last_hit() {
        let mut e = Enemy::new(0.0, 0.0, 2);
        assert!(!e.hit());
        assert!(e.hit());
        assert_eq!(e.health, 0);
        // Extra hits never underflow
        assert!(e.hit());
    }

    #[test]
    fn explosion_lifecycle() {
        let mut ex = Explosion::new(1.0, 1.0);
        assert_eq!(ex.stage(), 0);
        assert!(!ex.tick(0.2));
        assert_eq!(ex.stage(), 1);
        assert!(!ex.tick(0.2));
        assert_eq!(ex.stage(), 3);
        assert!(ex.tick(0.2));
    }

    #[test]
    fn touching_respects_slack() {
        assert!(touching((0.0, 0.0), (0.5, 0.5), 0.2));
        assert!(!touching((0.0, 0.0), (0.9, 0.0), 0.2));
        assert!(!touching((0.0, 0.0), (0.0, 1.0), 0.0));
    }

    #[test]
    fn respawn_keeps_inventory() {
        let mut p = Player::new(2.0, 3.0, 3, 10);
        p.body.x = 9.0;
        p.body.vy = 5.0;
        p.lives = 1;
        p.ammo = 4;
        p.facing = Facing::Left;
        p.respawn();
        assert_eq!(p.pos(), (2.0, 3.0));
        assert_eq!(p.body.vy, 0.0);
        assert_eq!(p.facing, Facing::Right);
        assert_eq!((p.lives, p.ammo), (1, 4));
    }

    #[test]
    fn nearest_cell_rounds_half_up() {
        assert_eq!(nearest_cell(2.4, 3.6), (2, 4));
        assert_eq!(nearest_cell(-0.2, 0.0), (0, 0));
        assert_eq!(nearest_cell(1.5, -0.5), (2, 0));
    }
}
