/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Solid,    // Blocks movement from every side
    Platform, // One-way ledge: land on it from above, jump through from below
}

impl Tile {
    /// Can an entity stand on top of this tile?
    pub fn supports(self) -> bool {
        matches!(self, Tile::Solid | Tile::Platform)
    }

    /// Does this tile stop horizontal movement and upward movement?
    pub fn blocks(self) -> bool {
        matches!(self, Tile::Solid)
    }

    /// Map a level-file character to a tile. Entity markers map to `Empty`.
    pub fn from_char(ch: char) -> Tile {
        match ch {
            '#' => Tile::Solid,
            '=' => Tile::Platform,
            _ => Tile::Empty,
        }
    }
}

/// Row-major tile grid. Out-of-bounds reads are `Empty` so entities can
/// fall off the map toward the kill plane.
#[derive(Clone, Debug, Default)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    tiles: Vec<Tile>,
}

impl TileMap {
    pub fn new(width: usize, height: usize) -> Self {
        TileMap { width, height, tiles: vec![Tile::Empty; width * height] }
    }

    /// Build from ASCII rows (used by the loader and by tests).
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);
        let mut map = TileMap::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().enumerate() {
                map.set(x as i32, y as i32, Tile::from_char(ch));
            }
        }
        map
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Tile::Empty;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.tiles[y as usize * self.width + x as usize] = tile;
    }

    /// Horizontal bounds act as walls so nothing walks out of the level sideways.
    #[inline]
    pub fn blocks(&self, x: i32, y: i32) -> bool {
        if x < 0 || x as usize >= self.width {
            return true;
        }
        self.get(x, y).blocks()
    }

    #[inline]
    pub fn supports(&self, x: i32, y: i32) -> bool {
        self.get(x, y).supports()
    }
}
