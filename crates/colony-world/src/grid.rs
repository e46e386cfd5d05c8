//! 2D toroidal multi-occupancy grid.

use colony_core::{EntityId, Error, Position, Result};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Rejection-sampling attempts per cell before falling back to enumeration
const SAMPLE_ATTEMPTS_PER_CELL: usize = 4;

/// A 2D toroidal grid mapping cells to the entities standing on them
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Vec<EntityId>>,
    locations: HashMap<EntityId, Position>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        let size = (width as usize)
            .checked_mul(height as usize)
            .filter(|&size| size <= i32::MAX as usize)
            .ok_or_else(|| Error::InvalidConfig(format!("grid {width}x{height} is too large")))?;
        Ok(Self {
            width,
            height,
            cells: vec![Vec::new(); size],
            locations: HashMap::new(),
        })
    }

    /// Wrap a position onto the torus
    pub fn normalize(&self, pos: Position) -> Position {
        pos.wrap(self.width, self.height)
    }

    /// Insert an entity into the cell at `pos` (wrapped)
    pub fn place(&mut self, id: EntityId, pos: Position) -> Result<Position> {
        if self.locations.contains_key(&id) {
            return Err(Error::AlreadyPlaced(id));
        }
        let wrapped = self.normalize(pos);
        let index = self.pos_to_index(wrapped);
        self.cells[index].push(id);
        self.locations.insert(id, wrapped);
        Ok(wrapped)
    }

    /// Remove an entity from its current cell, returning where it was
    pub fn remove(&mut self, id: EntityId) -> Result<Position> {
        let pos = self.locations.remove(&id).ok_or(Error::NotPlaced(id))?;
        let index = self.pos_to_index(pos);
        let cell = &mut self.cells[index];
        if let Some(slot) = cell.iter().position(|&occupant| occupant == id) {
            // keep insertion order so neighbor scans stay stable
            cell.remove(slot);
        }
        Ok(pos)
    }

    /// Move an entity to `pos` (wrapped)
    pub fn move_to(&mut self, id: EntityId, pos: Position) -> Result<Position> {
        self.remove(id)?;
        self.place(id, pos)
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.locations.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.locations.contains_key(&id)
    }

    /// Entities at exactly one cell
    pub fn cell_contents(&self, pos: Position) -> &[EntityId] {
        let index = self.pos_to_index(self.normalize(pos));
        &self.cells[index]
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.cell_contents(pos).is_empty()
    }

    /// Number of entities currently on the grid
    pub fn occupant_count(&self) -> usize {
        self.locations.len()
    }

    /// Distinct wrapped cells within Chebyshev distance `radius` of `pos`,
    /// ordered by `(x, y)`.
    ///
    /// The window is clamped to one lap of the torus, so a radius larger
    /// than the grid costs no more than covering the whole grid.
    pub fn neighborhood(&self, pos: Position, radius: i32, include_center: bool) -> Vec<Position> {
        let center = self.normalize(pos);
        let reach_x = radius.clamp(0, self.width / 2);
        let reach_y = radius.clamp(0, self.height / 2);

        let mut cells: Vec<Position> = (-reach_x..=reach_x)
            .flat_map(|dx| (-reach_y..=reach_y).map(move |dy| (dx, dy)))
            .map(|(dx, dy)| self.normalize(center.add(dx, dy)))
            .filter(|&cell| include_center || cell != center)
            .collect();
        cells.sort_unstable_by_key(|cell| (cell.x, cell.y));
        cells.dedup();
        cells
    }

    /// All entities in the Moore neighborhood of `pos`
    pub fn neighbors(&self, pos: Position, radius: i32, include_center: bool) -> Vec<EntityId> {
        self.neighborhood(pos, radius, include_center)
            .into_iter()
            .flat_map(|cell| self.cell_contents(cell).iter().copied())
            .collect()
    }

    pub fn empty_cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    /// Uniformly random empty cell; fails with `GridFull` when none exists
    pub fn random_empty_cell(&self, rng: &mut ChaCha8Rng) -> Result<Position> {
        let empty = self.empty_cell_count();
        if empty == 0 {
            return Err(Error::GridFull);
        }

        for _ in 0..self.cells.len() * SAMPLE_ATTEMPTS_PER_CELL {
            let pos = Position::new(
                rng.gen_range(0..self.width),
                rng.gen_range(0..self.height),
            );
            if self.is_empty(pos) {
                return Ok(pos);
            }
        }

        let pick = rng.gen_range(0..empty);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .nth(pick)
            .map(|(index, _)| self.index_to_pos(index))
            .ok_or(Error::GridFull)
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &[EntityId])> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell.as_slice()))
    }
}
