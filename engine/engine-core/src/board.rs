//! Board grid, tile codes and local window extraction.
//!
//! The board is square and stored row-major: cell `(x, y)` lives at
//! `y * size + x`, with `x` the column and `y` the row.

use serde::{Deserialize, Serialize};

use crate::action::AgentId;

/// Tile codes. The numeric value is what feature extractors see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    Passage = 0,
    Rigid = 1,
    Wood = 2,
    Bomb = 3,
    Flames = 4,
    Fog = 5,
    ExtraBomb = 6,
    IncrRange = 7,
    Kick = 8,
    AgentDummy = 9,
    Agent0 = 10,
    Agent1 = 11,
    Agent2 = 12,
    Agent3 = 13,
}

impl Tile {
    /// Numeric code of this tile.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Tile marking the given agent slot. Slots beyond 3 map to `AgentDummy`.
    pub fn agent(id: AgentId) -> Tile {
        match id {
            0 => Tile::Agent0,
            1 => Tile::Agent1,
            2 => Tile::Agent2,
            3 => Tile::Agent3,
            _ => Tile::AgentDummy,
        }
    }

    /// Agent slot for an agent tile.
    pub fn agent_id(self) -> Option<AgentId> {
        match self {
            Tile::Agent0 => Some(0),
            Tile::Agent1 => Some(1),
            Tile::Agent2 => Some(2),
            Tile::Agent3 => Some(3),
            _ => None,
        }
    }

    /// Power-up tiles are collected by walking onto them.
    pub fn is_powerup(self) -> bool {
        matches!(self, Tile::ExtraBomb | Tile::IncrRange | Tile::Kick)
    }

    /// Whether an agent may step onto this tile.
    pub fn is_walkable(self) -> bool {
        matches!(self, Tile::Passage | Tile::Flames) || self.is_powerup()
    }
}

/// Cell coordinates on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position displaced by `(dx, dy)`.
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev distance between two cells.
    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Square grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// Create a board filled with `fill`.
    pub fn new(size: usize, fill: Tile) -> Self {
        Self {
            size,
            cells: vec![fill; size * size],
        }
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `pos` lies on the board.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.size && (pos.y as usize) < self.size
    }

    /// Tile at `pos`, or `None` when off the board.
    pub fn get(&self, pos: Position) -> Option<Tile> {
        if self.contains(pos) {
            Some(self.cells[pos.y as usize * self.size + pos.x as usize])
        } else {
            None
        }
    }

    /// Overwrite the tile at `pos`. Off-board writes are ignored.
    pub fn set(&mut self, pos: Position, tile: Tile) {
        if self.contains(pos) {
            self.cells[pos.y as usize * self.size + pos.x as usize] = tile;
        }
    }

    /// Row-major view of all tiles.
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    /// Number of cells holding `tile`.
    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|&&t| t == tile).count()
    }

    /// Tile codes of the square window of `radius` centred on `center`.
    ///
    /// The window is always `(2 * radius + 1)^2` long, row-major. Cells that
    /// fall outside the board are clamped to the edge by padding them with the
    /// `Rigid` code, so every caller sees the same layout regardless of where
    /// the agent stands.
    pub fn window(&self, center: Position, radius: usize) -> Vec<i32> {
        let r = radius as i32;
        let side = 2 * radius + 1;
        let mut out = Vec::with_capacity(side * side);
        for dy in -r..=r {
            for dx in -r..=r {
                let tile = self
                    .get(center.offset((dx, dy)))
                    .unwrap_or(Tile::Rigid);
                out.push(tile.code());
            }
        }
        out
    }

    /// Tile codes of every cell, row-major.
    pub fn codes(&self) -> Vec<i32> {
        self.cells.iter().map(|t| t.code()).collect()
    }

    /// Tile codes of a square of `span + 1` cells per side, row-major.
    ///
    /// The square starts `span` cells left of and above `pos`, moved back to
    /// row or column 0 when that would leave the board, and is cut off at the
    /// right and bottom edges, so boards narrower than `span + 1` give a
    /// shorter window.
    pub fn clipped_window(&self, pos: Position, span: usize) -> Vec<i32> {
        let size = self.size as i32;
        let span = span as i32;
        let x0 = (pos.x - span).max(0);
        let y0 = (pos.y - span).max(0);
        let x1 = (x0 + span).min(size - 1);
        let y1 = (y0 + span).min(size - 1);

        let mut out = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(tile) = self.get(Position::new(x, y)) {
                    out.push(tile.code());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_bounds() {
        let mut board = Board::new(4, Tile::Passage);
        board.set(Position::new(1, 2), Tile::Wood);

        assert_eq!(board.get(Position::new(1, 2)), Some(Tile::Wood));
        assert_eq!(board.get(Position::new(2, 1)), Some(Tile::Passage));
        assert_eq!(board.get(Position::new(-1, 0)), None);
        assert_eq!(board.get(Position::new(0, 4)), None);
        assert_eq!(board.count(Tile::Wood), 1);

        // Ignored rather than panicking
        board.set(Position::new(9, 9), Tile::Wood);
        assert_eq!(board.count(Tile::Wood), 1);
    }

    #[test]
    fn test_window_interior() {
        let mut board = Board::new(5, Tile::Passage);
        board.set(Position::new(2, 1), Tile::Wood);
        board.set(Position::new(3, 2), Tile::Bomb);

        let window = board.window(Position::new(2, 2), 1);
        assert_eq!(window.len(), 9);
        // Row above the centre, middle column
        assert_eq!(window[1], Tile::Wood.code());
        // Centre row, right column
        assert_eq!(window[5], Tile::Bomb.code());
    }

    #[test]
    fn test_window_clamped_at_corner() {
        let board = Board::new(3, Tile::Passage);
        let window = board.window(Position::new(0, 0), 1);

        assert_eq!(window.len(), 9);
        let rigid = Tile::Rigid.code();
        // Top row and left column are off-board
        assert_eq!(&window[0..3], &[rigid, rigid, rigid]);
        assert_eq!(window[3], rigid);
        assert_eq!(window[6], rigid);
        // On-board cells keep their code
        assert_eq!(window[4], Tile::Passage.code());
        assert_eq!(window[8], Tile::Passage.code());
    }

    #[test]
    fn test_clipped_window() {
        let mut board = Board::new(10, Tile::Passage);
        board.set(Position::new(2, 3), Tile::Wood);
        board.set(Position::new(9, 9), Tile::Bomb);

        // Away from the top-left edge the square ends at the agent
        let window = board.clipped_window(Position::new(7, 8), 5);
        assert_eq!(window.len(), 36);
        assert_eq!(window[0], Tile::Wood.code());
        assert_eq!(window[35], Tile::Passage.code());

        // Pushed back onto the board at the top-left corner
        let window = board.clipped_window(Position::new(1, 1), 5);
        assert_eq!(window.len(), 36);
        assert_eq!(window[3 * 6 + 2], Tile::Wood.code());

        let window = board.clipped_window(Position::new(9, 9), 8);
        assert_eq!(window.len(), 81);
        assert_eq!(window[80], Tile::Bomb.code());

        // Cut short when the square is wider than the board
        let small = Board::new(5, Tile::Passage);
        assert_eq!(small.clipped_window(Position::new(4, 4), 5).len(), 25);
        assert_eq!(small.clipped_window(Position::new(0, 0), 8).len(), 25);
    }

    #[test]
    fn test_agent_tiles() {
        assert_eq!(Tile::agent(2), Tile::Agent2);
        assert_eq!(Tile::Agent3.agent_id(), Some(3));
        assert_eq!(Tile::Wood.agent_id(), None);
        assert_eq!(Tile::agent(7), Tile::AgentDummy);
    }

    #[test]
    fn test_walkable() {
        assert!(Tile::Passage.is_walkable());
        assert!(Tile::IncrRange.is_walkable());
        assert!(!Tile::Rigid.is_walkable());
        assert!(!Tile::Bomb.is_walkable());
        assert!(!Tile::Fog.is_walkable());
    }
}
