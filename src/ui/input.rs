/// Input state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous walking while a direction key is held
///   - Variable jump height while the jump key stays down
///   - Edge-triggered jump and shoot (only fire on initial press)
///
/// Uses crossterm's keyboard enhancement for Release events when the terminal
/// supports it. Falls back to timeout-based release detection otherwise.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tracing::debug;

use crate::domain::entity::{Facing, PlayerInput};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// Letter keys are matched in lowercase; see `normalize`.
const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('a')];
const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('d')];
const JUMP_KEYS: [KeyCode; 4] = [KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('z')];
const SHOOT_KEYS: [KeyCode; 2] = [KeyCode::Char('x'), KeyCode::Char('j')];
const QUIT_KEYS: [KeyCode; 2] = [KeyCode::Esc, KeyCode::Char('q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true once keyboard
    /// enhancement has been pushed successfully.
    honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Ask the terminal for Release events. Terminals without support keep
    /// the timeout fallback.
    pub fn enable_release_events(&mut self) {
        if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
            debug!("keyboard enhancement unsupported; using hold timeout");
            return;
        }
        let pushed = execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );
        self.honor_release = pushed.is_ok();
        debug!(honor_release = self.honor_release, "keyboard enhancement");
    }

    pub fn disable_release_events(&mut self) -> io::Result<()> {
        if self.honor_release {
            self.honor_release = false;
            execute!(io::stdout(), PopKeyboardEnhancementFlags)?;
            io::stdout().flush()?;
        }
        Ok(())
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    /// Fold one key event into the held/fresh sets.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        let code = normalize(key.code);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            // Without confirmed enhancement, rely on timeout-based expiry.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(code, now);
                self.last_active.insert(code, now);
                if !was_held {
                    self.fresh_presses.push(code);
                }
            }
        }
    }

    /// Drop keys that have timed out (fallback for terminals without Release).
    /// With Release events honoured, keys stay down until released.
    pub fn expire(&mut self, now: Instant) {
        if self.honor_release {
            return;
        }
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Start a new frame of fresh presses without reading the terminal.
    #[cfg(test)]
    pub fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.last_active.contains_key(c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// Map held and fresh keys to platformer actions.
    /// Opposing directions cancel out.
    pub fn player_input(&self) -> PlayerInput {
        let walk = match (self.any_held(&LEFT_KEYS), self.any_held(&RIGHT_KEYS)) {
            (true, false) => Some(Facing::Left),
            (false, true) => Some(Facing::Right),
            _ => None,
        };
        PlayerInput {
            walk,
            jump_held: self.any_held(&JUMP_KEYS),
            jump_pressed: self.any_pressed(&JUMP_KEYS),
            shoot_pressed: self.any_pressed(&SHOOT_KEYS),
        }
    }

    /// Esc, q or Ctrl+C this frame.
    pub fn quit_requested(&self) -> bool {
        self.raw_events.iter().any(|k| {
            let ctrl_c = k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'));
            ctrl_c || (k.kind == KeyEventKind::Press && QUIT_KEYS.contains(&normalize(k.code)))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map(|t| self.honor_release || now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Shifted letters report as uppercase; fold them so a held Shift does not
/// break key tracking.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) if c.is_ascii_uppercase() => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn held_direction_walks() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Right), t0);
        assert_eq!(input.player_input().walk, Some(Facing::Right));

        input.handle_key(press(KeyCode::Char('a')), t0);
        assert_eq!(input.player_input().walk, None);
    }

    #[test]
    fn keys_expire_after_timeout() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Left), t0);
        input.expire(t0 + HOLD_TIMEOUT / 2);
        assert_eq!(input.player_input().walk, Some(Facing::Left));
        input.expire(t0 + HOLD_TIMEOUT * 2);
        assert_eq!(input.player_input().walk, None);
    }

    #[test]
    fn release_event_ends_hold_when_enhanced() {
        let mut input = InputState::new();
        input.honor_release = true;
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Right), t0);

        // No timeout while the terminal reports releases.
        input.expire(t0 + HOLD_TIMEOUT * 10);
        assert_eq!(input.player_input().walk, Some(Facing::Right));

        let release = KeyEvent::new_with_kind(KeyCode::Right, KeyModifiers::NONE, KeyEventKind::Release);
        input.handle_key(release, t0 + HOLD_TIMEOUT * 11);
        assert_eq!(input.player_input().walk, None);
    }

    #[test]
    fn release_is_ignored_without_enhancement() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Left), t0);
        let release = KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Release);
        input.handle_key(release, t0);
        assert_eq!(input.player_input().walk, Some(Facing::Left));
    }

    #[test]
    fn jump_is_edge_triggered_but_held_persists() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Char(' ')), t0);
        let first = input.player_input();
        assert!(first.jump_pressed && first.jump_held);

        input.begin_frame();
        // Auto-repeat while held is not a fresh press.
        input.handle_key(press(KeyCode::Char(' ')), t0 + Duration::from_millis(30));
        let second = input.player_input();
        assert!(!second.jump_pressed);
        assert!(second.jump_held);
    }

    #[test]
    fn shoot_accepts_uppercase() {
        let mut input = InputState::new();
        input.handle_key(press(KeyCode::Char('X')), Instant::now());
        assert!(input.player_input().shoot_pressed);
    }

    #[test]
    fn quit_keys() {
        let mut input = InputState::new();
        assert!(!input.quit_requested());
        input.handle_key(press(KeyCode::Esc), Instant::now());
        assert!(input.quit_requested());

        let mut input = InputState::new();
        input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(input.quit_requested());
    }
}
