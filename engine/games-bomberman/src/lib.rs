//! Bomberman-style reference forward model for the Blastgrid engine
//!
//! This crate provides a compact but complete implementation of the
//! `ForwardModel` trait: agents walk a square grid, drop bombs that explode
//! after a fuse, destroy wood (which may drop power-ups) and eliminate any
//! agent standing in the flames. It is what the search engine's tests, the
//! benchmarks and the `arena` runner play on.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::{Action, ForwardModel};
//! use games_bomberman::{BombermanConfig, BombermanState};
//!
//! let mut state = BombermanState::new(BombermanConfig::default(), 42);
//! state.next(&[Action::Bomb, Action::Stop, Action::Stop, Action::Stop]);
//! assert_eq!(state.tick(), 1);
//! ```

use engine_core::{
    is_ended, Action, AgentId, Board, ForwardModel, GameMode, GameResult, Message, Position, Tile,
    MESSAGE_LENGTH, NUM_ACTIONS,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;


/// Rules and setup of a game.
#[derive(Debug, Clone, PartialEq)]
pub struct BombermanConfig {
    pub board_size: usize,
    pub num_agents: usize,
    pub mode: GameMode,
    pub max_ticks: u32,
    /// Chebyshev vision radius; `None` means fully observable
    pub vision_range: Option<u32>,
    /// Fraction of free cells filled with wood at generation
    pub wood_density: f64,
    /// Ticks between placing a bomb and its explosion
    pub bomb_life: u32,
    /// Ticks a flame stays on the board
    pub flame_life: u32,
    pub initial_blast_strength: u32,
    pub initial_ammo: u32,
    /// Chance that destroyed wood leaves a power-up behind
    pub powerup_chance: f64,
}

impl Default for BombermanConfig {
    fn default() -> Self {
        Self {
            board_size: 11,
            num_agents: 4,
            mode: GameMode::Ffa,
            max_ticks: 800,
            vision_range: None,
            wood_density: 0.35,
            bomb_life: 10,
            flame_life: 2,
            initial_blast_strength: 2,
            initial_ammo: 1,
            powerup_chance: 0.5,
        }
    }
}

/// Errors from building a state out of an ASCII layout.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Layout must be square, got {rows} rows of width {width}")]
    NotSquare { rows: usize, width: usize },

    #[error("Unknown layout character '{0}'")]
    UnknownTile(char),

    #[error("Agent {0} is missing from the layout")]
    MissingAgent(usize),
}

/// One agent's avatar.
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    pub position: Position,
    pub alive: bool,
    pub result: GameResult,
    pub ammo: u32,
    pub blast_strength: u32,
    pub inbox: Message,
    /// Out of the observer's sight: neither listed, drawn nor simulated
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Bomb {
    position: Position,
    owner: AgentId,
    life: u32,
    strength: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct Flame {
    position: Position,
    life: u32,
}

/// Full game state. Cloning produces an independent deep copy, including the
/// RNG used for power-up drops.
#[derive(Debug, Clone)]
pub struct BombermanState {
    config: BombermanConfig,
    /// Static terrain: passages, rigid blocks, wood and power-ups
    terrain: Board,
    /// Terrain with flames, bombs and agents drawn over it
    view: Board,
    avatars: Vec<Avatar>,
    bombs: Vec<Bomb>,
    flames: Vec<Flame>,
    tick: u32,
    terminal: bool,
    observer: AgentId,
    /// Row-major cells beyond the observer's vision, re-fogged on every render
    fog: Option<Vec<bool>>,
    rng: ChaCha20Rng,
}

/// Starting corners in slot order: top-left, bottom-left, bottom-right, top-right.
fn corner(slot: usize, size: usize) -> Position {
    let far = size as i32 - 1;
    match slot % 4 {
        0 => Position::new(0, 0),
        1 => Position::new(0, far),
        2 => Position::new(far, far),
        _ => Position::new(far, 0),
    }
}

impl BombermanState {
    /// Generate a fresh board from `seed`.
    ///
    /// Rigid pillars sit on every odd `(x, y)` cell other than a starting
    /// corner; wood is scattered over the remaining cells except the corners
    /// and their direct neighbours, so every agent starts with room to move.
    pub fn new(config: BombermanConfig, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let size = config.board_size;
        let mut terrain = Board::new(size, Tile::Passage);

        let starts: Vec<Position> = (0..config.num_agents).map(|i| corner(i, size)).collect();

        for y in 0..size as i32 {
            for x in 0..size as i32 {
                let pos = Position::new(x, y);
                let start_distance = (0..4)
                    .map(|slot| {
                        let c = corner(slot, size);
                        (c.x - x).abs() + (c.y - y).abs()
                    })
                    .min()
                    .unwrap_or(i32::MAX);
                // Even sizes put the far corner on an odd/odd cell
                if x % 2 == 1 && y % 2 == 1 && start_distance > 0 {
                    terrain.set(pos, Tile::Rigid);
                    continue;
                }
                if start_distance > 2 && rng.gen::<f64>() < config.wood_density {
                    terrain.set(pos, Tile::Wood);
                }
            }
        }

        let avatars = starts
            .into_iter()
            .map(|position| Avatar {
                position,
                alive: true,
                result: GameResult::Incomplete,
                ammo: config.initial_ammo,
                blast_strength: config.initial_blast_strength,
                inbox: [0; MESSAGE_LENGTH],
                hidden: false,
            })
            .collect();

        Self::assemble(config, terrain, avatars, rng)
    }

    /// Build a state from an ASCII layout, one string per row.
    ///
    /// `.` passage, `#` rigid, `+` wood, `b` extra bomb, `r` range power-up,
    /// `0`-`3` agent starting cells (passage underneath). The board size and
    /// agent count of `config` are replaced by what the layout contains.
    pub fn from_layout(
        mut config: BombermanConfig,
        rows: &[&str],
        seed: u64,
    ) -> Result<Self, LayoutError> {
        let size = rows.len();
        let mut terrain = Board::new(size, Tile::Passage);
        let mut starts: [Option<Position>; 4] = [None; 4];

        for (y, row) in rows.iter().enumerate() {
            let width = row.chars().count();
            if width != size {
                return Err(LayoutError::NotSquare { rows: size, width });
            }
            for (x, ch) in row.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let tile = match ch {
                    '.' => Tile::Passage,
                    '#' => Tile::Rigid,
                    '+' => Tile::Wood,
                    'b' => Tile::ExtraBomb,
                    'r' => Tile::IncrRange,
                    '0'..='3' => {
                        let slot = ch as usize - '0' as usize;
                        starts[slot] = Some(pos);
                        Tile::Passage
                    }
                    other => return Err(LayoutError::UnknownTile(other)),
                };
                terrain.set(pos, tile);
            }
        }

        let num_agents = starts.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        let mut avatars = Vec::with_capacity(num_agents);
        for (slot, start) in starts.iter().take(num_agents).enumerate() {
            let position = start.ok_or(LayoutError::MissingAgent(slot))?;
            avatars.push(Avatar {
                position,
                alive: true,
                result: GameResult::Incomplete,
                ammo: config.initial_ammo,
                blast_strength: config.initial_blast_strength,
                inbox: [0; MESSAGE_LENGTH],
                hidden: false,
            });
        }

        config.board_size = size;
        config.num_agents = num_agents;
        Ok(Self::assemble(
            config,
            terrain,
            avatars,
            ChaCha20Rng::seed_from_u64(seed),
        ))
    }

    fn assemble(
        config: BombermanConfig,
        terrain: Board,
        avatars: Vec<Avatar>,
        rng: ChaCha20Rng,
    ) -> Self {
        let mut state = Self {
            view: terrain.clone(),
            config,
            terrain,
            avatars,
            bombs: Vec::new(),
            flames: Vec::new(),
            tick: 0,
            terminal: false,
            observer: 0,
            fog: None,
            rng,
        };
        state.render();
        state
    }

    pub fn config(&self) -> &BombermanConfig {
        &self.config
    }

    pub fn avatar(&self, id: AgentId) -> &Avatar {
        &self.avatars[id]
    }

    /// Number of bombs currently ticking on the board.
    pub fn bomb_count(&self) -> usize {
        self.bombs.len()
    }

    fn bomb_at(&self, pos: Position) -> Option<usize> {
        self.bombs.iter().position(|b| b.position == pos)
    }

    fn agent_at(&self, pos: Position) -> Option<AgentId> {
        self.avatars
            .iter()
            .position(|a| a.in_play() && a.position == pos)
    }

    /// Avatars still alive, hidden ones included. The end rules use this so a
    /// fogged copy never treats an unseen enemy as eliminated.
    fn standing(&self) -> Vec<AgentId> {
        self.avatars
            .iter()
            .enumerate()
            .filter(|(_, a)| a.alive)
            .map(|(id, _)| id)
            .collect()
    }

    fn place_bombs(&mut self, actions: &[Action]) {
        for id in 0..self.avatars.len() {
            if actions.get(id) != Some(&Action::Bomb) {
                continue;
            }
            let avatar = &self.avatars[id];
            if !avatar.in_play() || avatar.ammo == 0 || self.bomb_at(avatar.position).is_some() {
                continue;
            }
            let bomb = Bomb {
                position: avatar.position,
                owner: id,
                life: self.config.bomb_life,
                strength: avatar.blast_strength,
            };
            self.avatars[id].ammo -= 1;
            self.bombs.push(bomb);
        }
    }

    /// Moves are resolved in slot order against the current occupancy.
    fn move_agents(&mut self, actions: &[Action]) {
        for id in 0..self.avatars.len() {
            let action = actions.get(id).copied().unwrap_or_default();
            if !self.avatars[id].in_play() || !action.is_move() {
                continue;
            }
            let target = self.avatars[id].position.offset(action.direction());
            let walkable = self.terrain.get(target).is_some_and(Tile::is_walkable);
            if !walkable || self.bomb_at(target).is_some() || self.agent_at(target).is_some() {
                continue;
            }

            let avatar = &mut self.avatars[id];
            avatar.position = target;
            match self.terrain.get(target) {
                Some(Tile::ExtraBomb) => avatar.ammo += 1,
                Some(Tile::IncrRange) => avatar.blast_strength += 1,
                _ => {}
            }
            if self.terrain.get(target).is_some_and(Tile::is_powerup) {
                self.terrain.set(target, Tile::Passage);
            }
        }
    }

    fn explode_bombs(&mut self) {
        for flame in &mut self.flames {
            flame.life = flame.life.saturating_sub(1);
        }
        self.flames.retain(|f| f.life > 0);

        for bomb in &mut self.bombs {
            bomb.life = bomb.life.saturating_sub(1);
        }

        let mut pending: Vec<usize> = self
            .bombs
            .iter()
            .enumerate()
            .filter(|(_, b)| b.life == 0)
            .map(|(i, _)| i)
            .collect();
        let mut exploded = vec![false; self.bombs.len()];

        while let Some(idx) = pending.pop() {
            if exploded[idx] {
                continue;
            }
            exploded[idx] = true;
            let bomb = self.bombs[idx].clone();
            let mut cells = vec![bomb.position];

            for dir in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
                let mut pos = bomb.position;
                for _ in 0..bomb.strength {
                    pos = pos.offset(dir);
                    match self.terrain.get(pos) {
                        None | Some(Tile::Rigid) => break,
                        Some(Tile::Wood) => {
                            cells.push(pos);
                            let drop = if self.rng.gen::<f64>() < self.config.powerup_chance {
                                if self.rng.gen::<bool>() {
                                    Tile::ExtraBomb
                                } else {
                                    Tile::IncrRange
                                }
                            } else {
                                Tile::Passage
                            };
                            self.terrain.set(pos, drop);
                            break;
                        }
                        Some(_) => cells.push(pos),
                    }
                }
            }

            for pos in cells {
                if let Some(other) = self.bomb_at(pos) {
                    if !exploded[other] {
                        pending.push(other);
                    }
                }
                match self.flames.iter_mut().find(|f| f.position == pos) {
                    Some(flame) => flame.life = self.config.flame_life,
                    None => self.flames.push(Flame {
                        position: pos,
                        life: self.config.flame_life,
                    }),
                }
            }
            if let Some(owner) = self.avatars.get_mut(bomb.owner) {
                owner.ammo += 1;
            }
        }

        let mut idx = 0;
        self.bombs.retain(|_| {
            let keep = !exploded[idx];
            idx += 1;
            keep
        });
    }

    /// Eliminate agents standing in flames. Returns who died this tick.
    fn burn_agents(&mut self) -> Vec<AgentId> {
        let mut died = Vec::new();
        for (id, avatar) in self.avatars.iter_mut().enumerate() {
            if avatar.in_play() && self.flames.iter().any(|f| f.position == avatar.position) {
                avatar.alive = false;
                avatar.result = GameResult::Loss;
                died.push(id);
            }
        }
        died
    }

    fn settle_results(&mut self, died_now: &[AgentId]) {
        let alive = self.standing();
        if !is_ended(self.tick, self.config.max_ticks, self.config.mode, &alive) {
            return;
        }
        self.terminal = true;

        if alive.is_empty() {
            // Everyone still standing at the start of the tick went out together
            for &id in died_now {
                self.avatars[id].result = GameResult::Tie;
            }
            return;
        }

        let single_side = match self.config.mode {
            GameMode::Ffa => alive.len() == 1,
            GameMode::Team | GameMode::TeamRadio => alive
                .iter()
                .all(|&id| engine_core::team_of(id) == engine_core::team_of(alive[0])),
        };

        for id in 0..self.avatars.len() {
            let on_surviving_side = match self.config.mode {
                GameMode::Ffa => self.avatars[id].alive,
                _ => engine_core::team_of(id) == engine_core::team_of(alive[0]),
            };
            self.avatars[id].result = match (on_surviving_side, single_side) {
                (true, true) => GameResult::Win,
                (true, false) => GameResult::Tie,
                (false, _) if self.avatars[id].alive => GameResult::Tie,
                (false, _) => GameResult::Loss,
            };
        }
    }

    fn render(&mut self) {
        let mut view = self.terrain.clone();
        for flame in &self.flames {
            view.set(flame.position, Tile::Flames);
        }
        for bomb in &self.bombs {
            view.set(bomb.position, Tile::Bomb);
        }
        for (id, avatar) in self.avatars.iter().enumerate() {
            if avatar.in_play() {
                view.set(avatar.position, Tile::agent(id));
            }
        }
        if let Some(mask) = &self.fog {
            let size = view.size() as i32;
            for (idx, &fogged) in mask.iter().enumerate() {
                if fogged {
                    let idx = idx as i32;
                    view.set(Position::new(idx % size, idx / size), Tile::Fog);
                }
            }
        }
        self.view = view;
    }

    /// Restrict this copy to what the observer sees within `range`.
    ///
    /// Cells further away turn to `Fog` for the rest of the copy's life:
    /// bombs and flames there are dropped, other avatars standing there are
    /// hidden, and every later `render` paints the fog back on.
    fn apply_fog(&mut self, range: u32) {
        let center = self.avatars[self.observer].position;
        let range = i32::try_from(range).unwrap_or(i32::MAX);
        let out_of_sight = |pos: Position| pos.chebyshev(center) > range;

        self.bombs.retain(|b| !out_of_sight(b.position));
        self.flames.retain(|f| !out_of_sight(f.position));
        let observer = self.observer;
        for (id, avatar) in self.avatars.iter_mut().enumerate() {
            if id != observer && out_of_sight(avatar.position) {
                avatar.hidden = true;
            }
        }

        let size = self.terrain.size() as i32;
        let mut mask = vec![false; (size * size) as usize];
        for y in 0..size {
            for x in 0..size {
                let pos = Position::new(x, y);
                if out_of_sight(pos) {
                    mask[(y * size + x) as usize] = true;
                    self.terrain.set(pos, Tile::Fog);
                }
            }
        }
        self.fog = Some(mask);
        self.render();
    }
}

impl Avatar {
    fn in_play(&self) -> bool {
        self.alive && !self.hidden
    }
}

impl ForwardModel for BombermanState {
    fn next(&mut self, actions: &[Action]) {
        if self.terminal {
            return;
        }
        self.tick += 1;

        self.place_bombs(actions);
        self.move_agents(actions);
        self.explode_bombs();
        let died = self.burn_agents();
        self.settle_results(&died);
        self.render();
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn tick(&self) -> u32 {
        self.tick
    }

    fn game_mode(&self) -> GameMode {
        self.config.mode
    }

    fn num_agents(&self) -> usize {
        self.avatars.len()
    }

    fn current_agent(&self) -> AgentId {
        self.observer
    }

    fn legal_action_count(&self) -> usize {
        NUM_ACTIONS
    }

    fn board(&self) -> &Board {
        &self.view
    }

    /// Hidden avatars report an off-board cell.
    fn agent_position(&self, id: AgentId) -> Position {
        let avatar = &self.avatars[id];
        if avatar.hidden {
            Position::new(-1, -1)
        } else {
            avatar.position
        }
    }

    fn winner_of(&self, id: AgentId) -> GameResult {
        self.avatars[id].result
    }

    fn alive_agents(&self) -> Vec<AgentId> {
        self.avatars
            .iter()
            .enumerate()
            .filter(|(_, a)| a.in_play())
            .map(|(id, _)| id)
            .collect()
    }

    fn blast_strength(&self, id: AgentId) -> u32 {
        self.avatars[id].blast_strength
    }

    fn observation_for(&self, id: AgentId) -> Self {
        let mut obs = self.clone();
        obs.observer = id;
        if let Some(range) = self.config.vision_range {
            obs.apply_fog(range);
        }
        obs
    }

    fn set_message(&mut self, id: AgentId, message: Message) {
        if let Some(avatar) = self.avatars.get_mut(id) {
            avatar.inbox = message;
        }
    }

    fn message_of(&self, id: AgentId) -> Message {
        self.avatars[id].inbox
    }
}
