/// Render surface: an off-screen grid of character cells.
///
/// Everything that draws (level view, HUD, overlays) writes into a
/// `Surface`. The terminal `Renderer` presents a finished `Frame`;
/// tests read it back as text.

use crossterm::style::Color;

/// Explicit dark background for every cell, so the terminal's own
/// default never shows through between rows.
pub const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    pub const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Sentinel cell used to invalidate a back buffer.
    /// Different from any real cell, so every position will be diff'd.
    pub const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

/// Drawing capability shared by everything that renders.
/// Writes outside the surface are ignored.
pub trait Surface {
    fn size(&self) -> (usize, usize);

    fn set(&mut self, x: i32, y: i32, cell: Cell);

    fn get(&self, x: i32, y: i32) -> Cell;

    /// Draw one character, keeping the cell's background.
    fn put_char(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        let bg = self.get(x, y).bg;
        self.set(x, y, Cell { ch, fg, bg });
    }

    /// Draw a string, one column per char.
    fn put_str(&mut self, x: i32, y: i32, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.put_char(x + i as i32, y, ch, fg);
        }
    }

    /// Draw a string centred horizontally on row `y`.
    fn put_centered(&mut self, y: i32, s: &str, fg: Color) {
        let (w, _) = self.size();
        let len = s.chars().count() as i32;
        self.put_str((w as i32 - len) / 2, y, s, fg);
    }

    /// Paint a whole row with a background colour.
    fn fill_row(&mut self, y: i32, bg: Color) {
        let (w, _) = self.size();
        for x in 0..w as i32 {
            self.set(x, y, Cell { ch: ' ', fg: Color::White, bg });
        }
    }

    fn clear(&mut self, bg: Color);
}

// ── Frame: a 2D grid of Cells ──

#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Frame {
    pub fn new(w: usize, h: usize) -> Self {
        Frame { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    /// Overwrite every cell with the sentinel so the next diff repaints all.
    pub fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row `y` as plain text.
    #[cfg(test)]
    pub fn row_text(&self, y: usize) -> String {
        if y >= self.height {
            return String::new();
        }
        self.cells[y * self.width..(y + 1) * self.width].iter().map(|c| c.ch).collect()
    }

    /// Does any row contain `needle`?
    #[cfg(test)]
    pub fn contains(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(needle))
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

impl Surface for Frame {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    fn get(&self, x: i32, y: i32) -> Cell {
        self.index(x, y).map_or(Cell::BLANK, |i| self.cells[i])
    }

    fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell { bg, ..Cell::BLANK });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_str_clips_at_edges() {
        let mut f = Frame::new(5, 2);
        f.put_str(3, 0, "abcd", Color::White);
        f.put_str(-2, 1, "xyz", Color::White);
        assert_eq!(f.row_text(0), "   ab");
        assert_eq!(f.row_text(1), "z    ");
    }

    #[test]
    fn put_char_keeps_background() {
        let mut f = Frame::new(3, 1);
        f.fill_row(0, Color::Blue);
        f.put_char(1, 0, '@', Color::Red);
        let c = f.get(1, 0);
        assert_eq!((c.ch, c.fg, c.bg), ('@', Color::Red, Color::Blue));
    }

    #[test]
    fn centered_text() {
        let mut f = Frame::new(10, 1);
        f.put_centered(0, "HI", Color::White);
        assert_eq!(f.row_text(0), "    HI    ");
    }

    #[test]
    fn clear_and_resize() {
        let mut f = Frame::new(2, 2);
        f.put_str(0, 0, "ab", Color::White);
        f.clear(BASE_BG);
        assert!(!f.contains("a"));
        f.resize(4, 3);
        assert_eq!(f.size(), (4, 3));
        assert_eq!(f.row_text(2), "    ");
        assert_eq!(f.get(9, 9), Cell::BLANK);
    }
}
