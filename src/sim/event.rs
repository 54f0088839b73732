/// Events emitted during a simulation step.
/// The screen consumes these for logging.

#[derive(Clone, Debug, PartialEq)]
pub enum LevelEvent {
    Jumped,
    Landed,
    BulletFired { ammo_left: u32 },
    OutOfAmmo,
    EnemyHit { health_left: u32 },
    EnemyKilled { x: f32, y: f32 },
    PlayerKnockedBack,
    PowerupCollected { ammo: u32 },
    LifeLost { lives_left: u32 },
    GameOver,
    Victory,
}
