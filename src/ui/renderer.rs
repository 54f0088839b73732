/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The screen composes the next frame into a `Frame` (see `surface.rs`)
///   2. Each cell is compared with `back` (the previously presented frame)
///   3. Terminal commands are emitted only for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. The presented frame becomes the new `back`
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use super::surface::{Cell, Frame, Surface, BASE_BG};

pub struct Renderer {
    writer: BufWriter<Stdout>,
    back: Frame,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            back: Frame::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.invalidate();

        Ok(())
    }

    /// Restore the terminal. Raw mode is switched off even if leaving the
    /// alternate screen fails.
    pub fn cleanup(&mut self) -> io::Result<()> {
        let restored = execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        terminal::disable_raw_mode()?;
        restored
    }

    /// Current terminal size in cells. Falls back to the last known size.
    pub fn size(&self) -> (usize, usize) {
        terminal::size()
            .map(|(w, h)| (w as usize, h as usize))
            .unwrap_or((self.term_w, self.term_h))
    }

    /// Present a composed frame. A frame whose size differs from the
    /// terminal's last known size triggers a full repaint.
    pub fn present(&mut self, frame: &Frame) -> io::Result<()> {
        let (w, h) = frame.size();
        if w != self.term_w || h != self.term_h {
            self.term_w = w;
            self.term_h = h;
            self.back.resize(w, h);
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        self.flush_diff(frame)?;
        self.back.clone_from(frame);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self, front: &Frame) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours rather than ResetColor, which would fall back
        // to the terminal's own default and leave line artifacts.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..front.height() {
            for x in 0..front.width() {
                let cell = front.get(x as i32, y as i32);
                if cell == self.back.get(x as i32, y as i32) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(printable(cell)))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

/// Control characters would move the terminal cursor; draw them as blanks.
fn printable(cell: Cell) -> char {
    if cell.ch.is_control() { ' ' } else { cell.ch }
}
