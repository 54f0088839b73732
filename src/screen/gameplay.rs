/// Gameplay screen: owns the running level and everything drawn around it.
///
/// Each frame runs the level simulation, moves the chase camera, composes
/// level and HUD into the surface, then lets the level-end sequencer decide
/// whether the episode is over. A finished episode (won or lost) is followed
/// by a fresh, randomly chosen level.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::level_end::{LevelEndSequencer, LevelOutcome};
use crate::config::GameConfig;
use crate::domain::entity::PlayerInput;
use crate::sim::event::LevelEvent;
use crate::sim::level::Level;
use crate::sim::loader::{random_level_name, LevelError, LevelLoader};
use crate::ui::camera::ChaseCam;
use crate::ui::hud::{self, Hud, HUD_ROWS};
use crate::ui::level_view::{self, BACKGROUND};
use crate::ui::surface::Surface;

pub struct GameplayScreen {
    config: GameConfig,
    loader: LevelLoader,
    level: Level,
    chase_cam: ChaseCam,
    hud: Box<dyn Hud>,
    sequencer: LevelEndSequencer,
    rng: StdRng,
    /// Last surface size passed to `resize`.
    viewport: (usize, usize),
    /// Levels started since `show`, the first one included.
    episodes: u32,
    /// Score banked from finished episodes.
    banked_score: u32,
}

impl GameplayScreen {
    pub fn show(config: GameConfig) -> Result<Self, LevelError> {
        Self::show_with_rng(config, StdRng::from_rng(&mut rand::rng()))
    }

    /// `show` with a caller-supplied random source for level choice.
    pub fn show_with_rng(config: GameConfig, mut rng: StdRng) -> Result<Self, LevelError> {
        let loader = LevelLoader::new(config.levels.dir.clone());
        let name = random_level_name(&config.levels.names, &mut rng)?;
        let level = loader.load(name, &config)?;
        info!(level = name, title = %level.name, "level started");

        let mut screen = GameplayScreen {
            hud: hud::from_style(config.hud),
            sequencer: LevelEndSequencer::new(config.timing.level_end_duration),
            loader,
            level,
            chase_cam: ChaseCam::new(),
            rng,
            viewport: (0, 0),
            episodes: 1,
            banked_score: 0,
            config,
        };
        screen.point_camera();
        Ok(screen)
    }

    #[cfg(test)]
    pub fn level(&self) -> &Level {
        &self.level
    }

    #[cfg(test)]
    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    #[cfg(test)]
    pub fn sequencer(&self) -> &LevelEndSequencer {
        &self.sequencer
    }

    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Banked score plus the running level's score.
    pub fn total_score(&self) -> u32 {
        self.banked_score.saturating_add(self.level.score)
    }

    /// Surface size changed: the level view gets everything below the HUD.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport = (width, height);
        self.chase_cam.set_viewport(width, height.saturating_sub(HUD_ROWS));
        self.point_camera();
    }

    /// One frame: simulate, compose, then run level-end sequencing.
    pub fn render(
        &mut self,
        delta: f32,
        input: PlayerInput,
        now: Instant,
        surface: &mut dyn Surface,
    ) -> Result<(), LevelError> {
        for event in self.level.update(delta, input) {
            log_event(&event);
        }
        let world = (self.level.width(), self.level.height());
        self.chase_cam.follow(self.level.player.pos(), world);

        surface.clear(BACKGROUND);
        level_view::draw_level(surface, &self.level, &self.chase_cam, HUD_ROWS as i32);
        let player = &self.level.player;
        self.hud.render(surface, player.lives, player.ammo, self.level.score);

        match self.sequencer.tick(&self.level, now, surface) {
            Some(LevelOutcome::Completed) => self.level_complete(),
            Some(LevelOutcome::Failed) => self.level_failed(),
            None => Ok(()),
        }
    }

    /// Pick a random configured level, load it and start it.
    pub fn start_new_level(&mut self) -> Result<(), LevelError> {
        let name = random_level_name(&self.config.levels.names, &mut self.rng)?;
        self.level = self.loader.load(name, &self.config)?;
        self.episodes += 1;
        info!(level = name, title = %self.level.name, episode = self.episodes, "level started");

        self.sequencer.reset();
        let (w, h) = self.viewport;
        self.resize(w, h);
        Ok(())
    }

    pub fn level_complete(&mut self) -> Result<(), LevelError> {
        info!(title = %self.level.name, score = self.level.score, "level complete");
        self.banked_score = self.banked_score.saturating_add(self.level.score);
        self.start_new_level()
    }

    pub fn level_failed(&mut self) -> Result<(), LevelError> {
        info!(title = %self.level.name, score = self.level.score, "level failed");
        self.banked_score = self.banked_score.saturating_add(self.level.score);
        self.start_new_level()
    }

    pub fn dispose(&self) {
        info!(
            episodes = self.episodes,
            total_score = self.total_score(),
            phase = ?self.sequencer.phase(),
            "gameplay screen closed"
        );
    }

    fn point_camera(&mut self) {
        let world = (self.level.width(), self.level.height());
        self.chase_cam.center_on(self.level.player.pos(), world);
    }
}

fn log_event(event: &LevelEvent) {
    match event {
        LevelEvent::LifeLost { lives_left } => info!(lives_left, "life lost"),
        LevelEvent::GameOver => info!("game over"),
        LevelEvent::Victory => info!("exit portal reached"),
        other => debug!(?other, "level event"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ui::surface::Frame;

    fn screen(end_secs: f32) -> GameplayScreen {
        let mut config = GameConfig::default();
        config.timing.level_end_duration = Duration::from_secs_f32(end_secs);
        // Built-in levels only, whatever is on disk.
        config.levels.dir = std::env::temp_dir().join("gigagal-no-levels-here");
        GameplayScreen::show_with_rng(config, StdRng::seed_from_u64(42)).unwrap()
    }

    const DT: f32 = 1.0 / 30.0;

    #[test]
    fn show_starts_a_configured_level() {
        let s = screen(1.0);
        let names = ["First Steps", "Stepping Stones", "The Gauntlet"];
        assert!(names.contains(&s.level().name.as_str()));
        assert_eq!(s.episodes(), 1);
        assert!(!s.sequencer().is_showing());
    }

    #[test]
    fn render_draws_level_and_hud() {
        let mut s = screen(1.0);
        let mut f = Frame::new(60, 20);
        s.resize(60, 20);
        s.render(DT, PlayerInput::default(), Instant::now(), &mut f).unwrap();
        assert!(f.row_text(0).contains("SCORE"));
        assert!(f.contains("►"));
    }

    #[test]
    fn failed_level_is_replaced_after_overlay() {
        let mut s = screen(0.5);
        let mut f = Frame::new(60, 20);
        s.resize(60, 20);
        let t0 = Instant::now();

        s.level_mut().game_over = true;
        s.render(DT, PlayerInput::default(), t0, &mut f).unwrap();
        assert!(s.sequencer().is_showing());
        assert!(f.contains("GAME OVER"));
        assert_eq!(s.episodes(), 1);

        s.render(DT, PlayerInput::default(), t0 + Duration::from_millis(300), &mut f).unwrap();
        assert_eq!(s.episodes(), 1);

        s.render(DT, PlayerInput::default(), t0 + Duration::from_millis(600), &mut f).unwrap();
        assert_eq!(s.episodes(), 2);
        assert!(!s.level().game_over);
        assert!(!s.sequencer().is_showing());
    }

    #[test]
    fn completed_level_banks_its_score() {
        let mut s = screen(0.1);
        let mut f = Frame::new(60, 20);
        let t0 = Instant::now();

        s.level_mut().score = 300;
        s.level_mut().victory = true;
        s.render(DT, PlayerInput::default(), t0, &mut f).unwrap();
        assert!(f.contains("YOU WIN!"));
        s.render(DT, PlayerInput::default(), t0 + Duration::from_millis(200), &mut f).unwrap();

        assert_eq!(s.episodes(), 2);
        assert_eq!(s.level().score, 0);
        assert_eq!(s.total_score(), 300);
    }

    #[test]
    fn resize_reserves_hud_rows() {
        let mut s = screen(1.0);
        s.resize(50, 12);
        assert_eq!((s.chase_cam.view_w, s.chase_cam.view_h), (50, 11));
        s.resize(50, 0);
        assert_eq!(s.chase_cam.view_h, 0);
    }
}
