/// Level-end sequencing: watches the level's outcome flags once per frame,
/// shows the matching overlay for a fixed duration, then reports the outcome
/// so the owning screen can move on to a new level.
///
/// ## State machine
///
/// ```text
///   Playing ──game_over──▶ ShowingGameOver { started } ──duration──▶ Playing (Failed)
///      │
///      └────victory──────▶ ShowingVictory { started }  ──duration──▶ Playing (Completed)
/// ```
///
/// The start time lives inside the showing variants, so it exists exactly
/// while an overlay is up. Game over wins when both flags rise together.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::sim::level::Level;
use crate::ui::overlay::{GameOverOverlay, VictoryOverlay};
use crate::ui::surface::Surface;

/// Outcome flags the sequencer observes.
pub trait LevelStatus {
    fn game_over(&self) -> bool;
    fn victory(&self) -> bool;
}

impl LevelStatus for Level {
    fn game_over(&self) -> bool {
        self.game_over
    }

    fn victory(&self) -> bool {
        self.victory
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelEndPhase {
    Playing,
    ShowingGameOver { started: Instant },
    ShowingVictory { started: Instant },
}

/// Reported once per episode, after the overlay has been shown in full.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelOutcome {
    Completed,
    Failed,
}

pub struct LevelEndSequencer {
    phase: LevelEndPhase,
    duration: Duration,
    game_over_overlay: GameOverOverlay,
    victory_overlay: VictoryOverlay,
}

impl LevelEndSequencer {
    pub fn new(duration: Duration) -> Self {
        Self::with_overlays(duration, GameOverOverlay::new(), VictoryOverlay::new())
    }

    pub fn with_overlays(duration: Duration, game_over: GameOverOverlay, victory: VictoryOverlay) -> Self {
        LevelEndSequencer {
            phase: LevelEndPhase::Playing,
            duration,
            game_over_overlay: game_over,
            victory_overlay: victory,
        }
    }

    pub fn phase(&self) -> LevelEndPhase {
        self.phase
    }

    /// When the current overlay went up; None while playing.
    #[allow(dead_code)]
    pub fn overlay_start(&self) -> Option<Instant> {
        match self.phase {
            LevelEndPhase::Playing => None,
            LevelEndPhase::ShowingGameOver { started } | LevelEndPhase::ShowingVictory { started } => {
                Some(started)
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_showing(&self) -> bool {
        self.phase != LevelEndPhase::Playing
    }

    /// Back to `Playing`, dropping any overlay in progress.
    pub fn reset(&mut self) {
        self.phase = LevelEndPhase::Playing;
    }

    /// Advance one frame.
    ///
    /// Enters a showing phase when the level's flags rise, draws the active
    /// overlay, and returns the outcome once `now - started` strictly
    /// exceeds the display duration. The phase is back to `Playing` when an
    /// outcome is returned.
    pub fn tick<L, S>(&mut self, level: &L, now: Instant, surface: &mut S) -> Option<LevelOutcome>
    where
        L: LevelStatus + ?Sized,
        S: Surface + ?Sized,
    {
        if self.phase == LevelEndPhase::Playing {
            if level.game_over() {
                debug!("level end: game over overlay");
                self.phase = LevelEndPhase::ShowingGameOver { started: now };
                self.game_over_overlay.init(now);
            } else if level.victory() {
                debug!("level end: victory overlay");
                self.phase = LevelEndPhase::ShowingVictory { started: now };
                self.victory_overlay.init(now);
            }
        }

        let (started, outcome) = match self.phase {
            LevelEndPhase::Playing => return None,
            LevelEndPhase::ShowingGameOver { started } => {
                self.game_over_overlay.render(surface, now);
                (started, LevelOutcome::Failed)
            }
            LevelEndPhase::ShowingVictory { started } => {
                self.victory_overlay.render(surface, now);
                (started, LevelOutcome::Completed)
            }
        };

        if now.saturating_duration_since(started) > self.duration {
            self.phase = LevelEndPhase::Playing;
            info!(?outcome, "level end overlay finished");
            return Some(outcome);
        }
        None
    }
}
